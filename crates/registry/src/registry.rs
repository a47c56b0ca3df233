use std::{collections::HashMap, path::Path};

use petplates_shared::{Species, text::slug};
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::{
    RegistryError,
    model::{HealthConcernProfile, Ingredient, RecipeTemplate},
};

#[derive(RustEmbed)]
#[folder = "data/"]
struct Data;

const BUILTIN_FILE: &str = "registry.json";

/// Raw registry document as stored on disk.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryData {
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub recipes: Vec<RecipeTemplate>,
    #[serde(default)]
    pub health_concerns: Vec<HealthConcernProfile>,
}

/// Validated, read-only reference data. Build it once at startup and share
/// it behind an `Arc`.
#[derive(Debug)]
pub struct Registry {
    ingredients: Vec<Ingredient>,
    ingredient_index: HashMap<String, usize>,
    recipes: Vec<RecipeTemplate>,
    recipe_index: HashMap<String, usize>,
    health_concerns: Vec<HealthConcernProfile>,
}

impl Registry {
    /// Loads the dataset bundled with the crate.
    pub fn builtin() -> Result<Self, RegistryError> {
        let file = Data::get(BUILTIN_FILE).ok_or(RegistryError::MissingEmbedded)?;
        let data: RegistryData = serde_json::from_slice(file.data.as_ref())?;

        Self::new(data)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Loading registry");
        let content = std::fs::read_to_string(path)?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, RegistryError> {
        let data: RegistryData = serde_json::from_str(content)?;

        Self::new(data)
    }

    /// Validates `data` and builds the lookup indexes. The first invalid
    /// entry aborts the load.
    pub fn new(data: RegistryData) -> Result<Self, RegistryError> {
        let mut ingredient_index = HashMap::with_capacity(data.ingredients.len());
        for (pos, ingredient) in data.ingredients.iter().enumerate() {
            validate_ingredient(ingredient).inspect_err(log_rejection)?;

            if ingredient_index.insert(ingredient.key.clone(), pos).is_some() {
                let err = RegistryError::DuplicateIngredient(ingredient.key.clone());
                log_rejection(&err);
                return Err(err);
            }
        }

        let mut recipe_index = HashMap::with_capacity(data.recipes.len());
        for (pos, recipe) in data.recipes.iter().enumerate() {
            validate_recipe(recipe, &ingredient_index).inspect_err(log_rejection)?;

            if recipe_index.insert(recipe.id.clone(), pos).is_some() {
                let err = RegistryError::DuplicateRecipe(recipe.id.clone());
                log_rejection(&err);
                return Err(err);
            }
        }

        let mut health_concerns = Vec::with_capacity(data.health_concerns.len());
        for mut profile in data.health_concerns {
            let normalized = slug(&profile.slug);
            if normalized.is_empty() {
                let err = RegistryError::InvalidHealthConcern {
                    slug: profile.slug,
                    reason: "slug is empty".to_string(),
                };
                log_rejection(&err);
                return Err(err);
            }
            profile.slug = normalized;
            health_concerns.push(profile);
        }

        tracing::debug!(
            ingredients = data.ingredients.len(),
            recipes = data.recipes.len(),
            health_concerns = health_concerns.len(),
            "Registry loaded"
        );

        Ok(Self {
            ingredients: data.ingredients,
            ingredient_index,
            recipes: data.recipes,
            recipe_index,
            health_concerns,
        })
    }

    pub fn ingredient(&self, key: &str) -> Option<&Ingredient> {
        self.ingredient_index
            .get(key)
            .map(|pos| &self.ingredients[*pos])
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn recipe(&self, id: &str) -> Option<&RecipeTemplate> {
        self.recipe_index.get(id).map(|pos| &self.recipes[*pos])
    }

    pub fn recipes(&self) -> &[RecipeTemplate] {
        &self.recipes
    }

    pub fn recipes_for(&self, species: Species) -> impl Iterator<Item = &RecipeTemplate> {
        self.recipes.iter().filter(move |r| r.species == species)
    }

    pub fn health_concerns(&self) -> &[HealthConcernProfile] {
        &self.health_concerns
    }

    /// Finds the profile for a concern, exact slug first, then by overlap.
    pub fn health_concern(&self, concern: &str) -> Option<&HealthConcernProfile> {
        let wanted = slug(concern);
        if wanted.is_empty() {
            return None;
        }

        self.health_concerns
            .iter()
            .find(|p| p.slug == wanted)
            .or_else(|| {
                self.health_concerns
                    .iter()
                    .find(|p| p.slug.contains(&wanted) || wanted.contains(&p.slug))
            })
    }
}

fn log_rejection(err: &RegistryError) {
    tracing::error!("Rejected registry entry: {err}");
}

fn validate_ingredient(ingredient: &Ingredient) -> Result<(), RegistryError> {
    let invalid = |reason: String| RegistryError::InvalidIngredient {
        key: ingredient.key.clone(),
        reason,
    };

    if ingredient.key.trim().is_empty() {
        return Err(invalid("key is empty".to_string()));
    }
    if ingredient.name.trim().is_empty() {
        return Err(invalid("name is empty".to_string()));
    }
    if ingredient.species.is_empty() {
        return Err(invalid("species set is empty".to_string()));
    }
    if let Some(field) = ingredient.nutrients.invalid_field() {
        return Err(invalid(format!("nutrient `{field}` is negative or not finite")));
    }
    if !(1..=10).contains(&ingredient.quality) {
        return Err(invalid(format!(
            "quality {} is outside 1..=10",
            ingredient.quality
        )));
    }
    if !ingredient.max_inclusion.is_finite()
        || ingredient.max_inclusion <= 0.0
        || ingredient.max_inclusion > 1.0
    {
        return Err(invalid(format!(
            "max inclusion {} is outside (0, 1]",
            ingredient.max_inclusion
        )));
    }

    Ok(())
}

fn validate_recipe(
    recipe: &RecipeTemplate,
    ingredient_index: &HashMap<String, usize>,
) -> Result<(), RegistryError> {
    let invalid = |reason: &str| RegistryError::InvalidRecipe {
        id: recipe.id.clone(),
        reason: reason.to_string(),
    };

    if recipe.id.trim().is_empty() {
        return Err(invalid("id is empty"));
    }
    if recipe.name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if recipe.ingredients.is_empty() {
        return Err(invalid("recipe has no ingredients"));
    }

    for item in &recipe.ingredients {
        if !ingredient_index.contains_key(&item.key) {
            return Err(RegistryError::UnknownIngredient {
                recipe: recipe.id.clone(),
                ingredient: item.key.clone(),
            });
        }
        if !item.grams.is_finite() || item.grams <= 0.0 {
            return Err(invalid("ingredient amount must be positive"));
        }
    }

    if let Some(field) = recipe.nutrition.as_ref().and_then(|n| n.invalid_field()) {
        return Err(RegistryError::InvalidRecipe {
            id: recipe.id.clone(),
            reason: format!("nutrient `{field}` is negative or not finite"),
        });
    }

    Ok(())
}
