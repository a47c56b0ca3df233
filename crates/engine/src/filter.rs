use std::collections::HashMap;

use petplates_registry::{Ingredient, RecipeTemplate, Registry};
use petplates_shared::{IngredientCategory, PetProfile, Species};
use serde::Serialize;
use strum::{AsRefStr, Display};

/// Why an ingredient or recipe left the candidate pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ExclusionReason {
    Toxic,
    Allergen,
    SpeciesIncompatible,
    Disliked,
    Contraindicated,
    Supplement,
}

impl ExclusionReason {
    /// Hard reasons also remove every recipe template using the ingredient.
    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            ExclusionReason::Toxic
                | ExclusionReason::Allergen
                | ExclusionReason::SpeciesIncompatible
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Exclusion {
    pub key: String,
    pub reason: ExclusionReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Ingredients and recipe templates that survived the pet's constraints.
#[derive(Debug)]
pub struct CandidateSet<'a> {
    pub species: Species,
    pub ingredients: Vec<&'a Ingredient>,
    pub recipes: Vec<&'a RecipeTemplate>,
    pub excluded_ingredients: Vec<Exclusion>,
    pub excluded_recipes: Vec<Exclusion>,
}

impl<'a> CandidateSet<'a> {
    pub fn in_category(&self, category: IngredientCategory) -> Vec<&'a Ingredient> {
        self.ingredients
            .iter()
            .copied()
            .filter(|i| i.category == category)
            .collect()
    }

    pub fn category_counts(&self) -> HashMap<IngredientCategory, usize> {
        let mut counts = HashMap::new();
        for ingredient in &self.ingredients {
            *counts.entry(ingredient.category).or_insert(0) += 1;
        }
        counts
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded_ingredients.len() + self.excluded_recipes.len()
    }
}

/// Expands a pet allergy into the keywords that identify it in ingredient
/// names, keys and tags. Unknown allergies match on their own text.
///
/// ```
/// use petplates_engine::filter::allergen_keywords;
///
/// assert_eq!(allergen_keywords("Chicken"), vec!["chicken", "poultry", "hen"]);
/// assert_eq!(allergen_keywords("lentils"), vec!["lentils"]);
/// ```
pub fn allergen_keywords(allergy: &str) -> Vec<String> {
    let allergy = allergy.trim().to_lowercase();
    let family: &[&str] = match allergy.as_str() {
        "chicken" | "poultry" => &["chicken", "poultry", "hen"],
        "beef" => &["beef", "cow"],
        "dairy" | "milk" => &["dairy", "milk", "cheese", "yogurt"],
        "grain" | "grains" | "wheat" => &["wheat", "grain", "corn", "barley", "oats"],
        "egg" | "eggs" => &["egg"],
        "fish" => &["fish", "salmon", "tuna", "cod", "sardine"],
        _ => &[],
    };

    let mut keywords = vec![allergy.clone()];
    for keyword in family {
        if !keywords.iter().any(|k| k.as_str() == *keyword) {
            keywords.push((*keyword).to_string());
        }
    }
    keywords
}

/// Returns the first pet allergy the ingredient triggers.
pub fn matching_allergy<'p>(ingredient: &Ingredient, allergies: &'p [String]) -> Option<&'p str> {
    allergies
        .iter()
        .find(|allergy| {
            allergen_keywords(allergy)
                .iter()
                .any(|keyword| ingredient.mentions(keyword))
        })
        .map(String::as_str)
}

/// Applies the pet's safety and preference constraints to the registry.
///
/// # Rules
/// - **Toxic**, **Allergen** and **SpeciesIncompatible** ingredients are
///   removed, along with every recipe template that uses them
/// - **Disliked** and **Contraindicated** ingredients and supplements are
///   kept out of the generation pool only
/// - Templates for other species are ignored
///
/// An empty pool is a valid outcome; callers decide what to do with it.
#[tracing::instrument(skip_all, fields(species = %pet.species))]
pub fn filter<'a>(registry: &'a Registry, pet: &PetProfile) -> CandidateSet<'a> {
    let species = pet.species;
    let concerns = pet
        .health_concerns
        .iter()
        .filter_map(|c| registry.health_concern(c))
        .collect::<Vec<_>>();

    let mut ingredients = Vec::new();
    let mut excluded_ingredients = Vec::new();
    let mut hard_excluded = HashMap::new();

    for ingredient in registry.ingredients() {
        let verdict = if ingredient.is_toxic_for(species) {
            Some((ExclusionReason::Toxic, None))
        } else if let Some(allergy) = matching_allergy(ingredient, &pet.allergies) {
            Some((ExclusionReason::Allergen, Some(allergy.to_string())))
        } else if !ingredient.supports(species) {
            Some((ExclusionReason::SpeciesIncompatible, None))
        } else if let Some(dislike) = pet.dislikes.iter().find(|d| ingredient.mentions(d)) {
            Some((ExclusionReason::Disliked, Some(dislike.to_string())))
        } else if let Some(concern) = concerns.iter().find(|c| c.contraindicates(ingredient)) {
            Some((ExclusionReason::Contraindicated, Some(concern.slug.clone())))
        } else if ingredient.category == IngredientCategory::Supplement {
            Some((ExclusionReason::Supplement, None))
        } else {
            None
        };

        match verdict {
            None => ingredients.push(ingredient),
            Some((reason, detail)) => {
                if reason.is_hard() {
                    hard_excluded.insert(ingredient.key.as_str(), reason);
                }
                excluded_ingredients.push(Exclusion {
                    key: ingredient.key.clone(),
                    reason,
                    detail,
                });
            }
        }
    }

    let mut recipes = Vec::new();
    let mut excluded_recipes = Vec::new();

    for recipe in registry.recipes_for(species) {
        let blocked = recipe.ingredients.iter().find_map(|item| {
            hard_excluded
                .get(item.key.as_str())
                .map(|reason| (item.key.as_str(), *reason))
        });

        match blocked {
            None => recipes.push(recipe),
            Some((key, reason)) => excluded_recipes.push(Exclusion {
                key: recipe.id.clone(),
                reason,
                detail: Some(key.to_string()),
            }),
        }
    }

    tracing::debug!(
        ingredients = ingredients.len(),
        recipes = recipes.len(),
        excluded_ingredients = excluded_ingredients.len(),
        excluded_recipes = excluded_recipes.len(),
        "Candidate set filtered"
    );

    CandidateSet {
        species,
        ingredients,
        recipes,
        excluded_ingredients,
        excluded_recipes,
    }
}
