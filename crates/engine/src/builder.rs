use std::collections::HashMap;

use petplates_registry::{HealthConcernProfile, Ingredient, Nutrients, Registry};
use petplates_shared::{AgeGroup, IngredientCategory, PetProfile, Species};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use ulid::Ulid;

use crate::{
    filter::CandidateSet,
    portion::{QualityTier, meal_grams, nutrition_target, portion},
    scoring::ScorableRecipe,
};

/// How widely the builder samples below the best-ranked ingredient.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DiversityMode {
    High,
    #[default]
    Medium,
    Low,
    None,
}

impl DiversityMode {
    pub fn pool_size(&self) -> usize {
        match self {
            DiversityMode::High => 8,
            DiversityMode::Medium => 5,
            DiversityMode::Low => 3,
            DiversityMode::None => 1,
        }
    }
}

fn default_min_ingredients() -> usize {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderSettings {
    #[serde(default)]
    pub diversity: DiversityMode,
    #[serde(default)]
    pub quality_tier: QualityTier,
    #[serde(default = "default_min_ingredients")]
    pub min_ingredients: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            diversity: DiversityMode::default(),
            quality_tier: QualityTier::default(),
            min_ingredients: default_min_ingredients(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRequirement {
    pub category: IngredientCategory,
    pub count: usize,
    pub required: bool,
}

const fn need(category: IngredientCategory, count: usize) -> CategoryRequirement {
    CategoryRequirement {
        category,
        count,
        required: true,
    }
}

const fn optional(category: IngredientCategory, count: usize) -> CategoryRequirement {
    CategoryRequirement {
        category,
        count,
        required: false,
    }
}

const DOGS: &[CategoryRequirement] = &[
    need(IngredientCategory::Protein, 1),
    need(IngredientCategory::Carb, 1),
    need(IngredientCategory::Vegetable, 1),
    need(IngredientCategory::Fat, 1),
];

const CATS: &[CategoryRequirement] = &[
    need(IngredientCategory::Protein, 1),
    need(IngredientCategory::Vegetable, 2),
    need(IngredientCategory::Fat, 1),
];

const BIRDS: &[CategoryRequirement] = &[
    need(IngredientCategory::Seed, 2),
    need(IngredientCategory::Fruit, 1),
    need(IngredientCategory::Vegetable, 1),
];

const REPTILES: &[CategoryRequirement] = &[
    need(IngredientCategory::Insect, 2),
    need(IngredientCategory::Vegetable, 1),
    optional(IngredientCategory::Fruit, 1),
];

const POCKET_PETS: &[CategoryRequirement] = &[
    need(IngredientCategory::Hay, 1),
    need(IngredientCategory::Vegetable, 2),
    optional(IngredientCategory::Fruit, 1),
    optional(IngredientCategory::Seed, 1),
];

/// Category make-up of a generated recipe for `species`.
pub fn requirements(species: Species) -> &'static [CategoryRequirement] {
    match species {
        Species::Dogs => DOGS,
        Species::Cats => CATS,
        Species::Birds => BIRDS,
        Species::Reptiles => REPTILES,
        Species::PocketPets => POCKET_PETS,
    }
}

/// Pet-specific inputs to recipe generation.
#[derive(Debug, Clone)]
pub struct GenerationConstraints {
    pub species: Species,
    pub age_group: AgeGroup,
    pub weight_kg: f64,
    pub concerns: Vec<HealthConcernProfile>,
    pub recent_ingredients: Vec<String>,
    pub settings: BuilderSettings,
}

impl GenerationConstraints {
    pub fn for_pet(registry: &Registry, pet: &PetProfile, settings: BuilderSettings) -> Self {
        let mut concerns: Vec<HealthConcernProfile> = Vec::new();
        for concern in &pet.health_concerns {
            let Some(profile) = registry.health_concern(concern) else {
                continue;
            };
            if !concerns.iter().any(|c| c.slug == profile.slug) {
                concerns.push(profile.clone());
            }
        }

        Self {
            species: pet.species,
            age_group: pet.age_group(),
            weight_kg: pet.weight_kg,
            concerns,
            recent_ingredients: Vec::new(),
            settings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShortfall {
    pub category: IngredientCategory,
    pub required: usize,
    pub available: usize,
}

/// Not enough safe ingredients to satisfy a species' required categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientCandidates {
    pub species: Species,
    pub missing: Vec<CategoryShortfall>,
}

impl std::fmt::Display for InsufficientCandidates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts = self
            .missing
            .iter()
            .map(|m| format!("{} ({} of {})", m.category, m.available, m.required))
            .collect::<Vec<_>>();
        write!(
            f,
            "Not enough safe ingredients for {}: {}",
            self.species,
            parts.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedIngredient {
    pub key: String,
    pub name: String,
    pub category: IngredientCategory,
    pub grams: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMatch {
    pub protein_target_pct: f64,
    pub protein_pct: f64,
    pub fat_target_pct: f64,
    pub fat_pct: f64,
    pub meets_protein_target: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    pub id: String,
    pub name: String,
    #[serde(rename = "category")]
    pub species: Species,
    pub ingredients: Vec<GeneratedIngredient>,
    pub total_grams: f64,
    pub nutrition: Nutrients,
    pub health_concerns: Vec<String>,
    pub age_groups: Vec<AgeGroup>,
    pub target_match: TargetMatch,
}

impl ScorableRecipe for GeneratedRecipe {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn species(&self) -> Species {
        self.species
    }

    fn ingredient_keys(&self) -> Vec<&str> {
        self.ingredients.iter().map(|i| i.key.as_str()).collect()
    }

    fn health_concerns(&self) -> &[String] {
        &self.health_concerns
    }

    fn age_groups(&self) -> &[AgeGroup] {
        &self.age_groups
    }

    fn nutrition(&self) -> Option<&Nutrients> {
        Some(&self.nutrition)
    }

    fn total_grams(&self) -> f64 {
        self.total_grams
    }
}

#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub recipes: Vec<GeneratedRecipe>,
    pub shortfall: Option<InsufficientCandidates>,
}

/// Counts required categories that the candidate set cannot fill.
pub fn check_candidates(candidates: &CandidateSet<'_>) -> Option<InsufficientCandidates> {
    let counts = candidates.category_counts();
    let missing = requirements(candidates.species)
        .iter()
        .filter(|r| r.required)
        .filter_map(|r| {
            let available = counts.get(&r.category).copied().unwrap_or(0);
            (available < r.count).then_some(CategoryShortfall {
                category: r.category,
                required: r.count,
                available,
            })
        })
        .collect::<Vec<_>>();

    (!missing.is_empty()).then(|| InsufficientCandidates {
        species: candidates.species,
        missing,
    })
}

/// Whether a generated recipe holds every required category for its species.
pub fn requirements_met(recipe: &GeneratedRecipe) -> bool {
    requirements(recipe.species)
        .iter()
        .filter(|r| r.required)
        .all(|r| {
            recipe
                .ingredients
                .iter()
                .filter(|i| i.category == r.category)
                .count()
                >= r.count
        })
}

/// Generates up to `count` recipes from the candidate pool.
pub fn generate(
    candidates: &CandidateSet<'_>,
    constraints: &GenerationConstraints,
    count: usize,
) -> Generation {
    RecipeBuilder::new(candidates, constraints).generate(count)
}

/// Assembles recipes category by category with weighted random picks.
///
/// Each candidate is ranked on health benefit for the pet's concerns,
/// nutrient density and quality. Picks are drawn from the top of the ranking
/// (pool size set by [`DiversityMode`]) with probability proportional to the
/// squared score. Ingredients already used in the batch are penalized so
/// consecutive recipes differ.
pub struct RecipeBuilder<'a> {
    candidates: &'a CandidateSet<'a>,
    constraints: &'a GenerationConstraints,
    usage: HashMap<String, u32>,
}

impl<'a> RecipeBuilder<'a> {
    pub fn new(candidates: &'a CandidateSet<'a>, constraints: &'a GenerationConstraints) -> Self {
        let mut usage = HashMap::new();
        for key in &constraints.recent_ingredients {
            *usage.entry(key.clone()).or_insert(0) += 1;
        }

        Self {
            candidates,
            constraints,
            usage,
        }
    }

    #[tracing::instrument(skip(self), fields(species = %self.constraints.species))]
    pub fn generate(mut self, count: usize) -> Generation {
        if self.candidates.species != self.constraints.species {
            tracing::warn!("Candidate set and constraints disagree on species");
        }

        if let Some(shortfall) = check_candidates(self.candidates) {
            tracing::info!("{shortfall}");
            return Generation {
                recipes: Vec::new(),
                shortfall: Some(shortfall),
            };
        }

        let mut rng = match self.constraints.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let mut recipes = Vec::with_capacity(count);
        for _ in 0..count {
            let selected = self.select(&mut rng);
            if selected.is_empty() {
                break;
            }
            for ingredient in &selected {
                *self.usage.entry(ingredient.key.clone()).or_insert(0) += 1;
            }
            recipes.push(self.assemble(&selected, &mut rng));
        }

        tracing::debug!(generated = recipes.len(), "Recipes generated");

        Generation {
            recipes,
            shortfall: None,
        }
    }

    fn select<R: Rng>(&self, rng: &mut R) -> Vec<&'a Ingredient> {
        let species = self.constraints.species;
        let pool_size = self.constraints.settings.diversity.pool_size();
        let mut selected: Vec<&'a Ingredient> = Vec::new();

        for requirement in requirements(species) {
            let mut pool = self.ranked(requirement.category, &selected);
            if !requirement.required && pool.len() < requirement.count {
                continue;
            }

            for _ in 0..requirement.count {
                pool.truncate(pool_size.max(1));
                let Some(pick) = weighted_pick(&pool, rng) else {
                    break;
                };
                let (ingredient, _) = pool.remove(pick);
                selected.push(ingredient);
                pool = self.ranked(requirement.category, &selected);
            }
        }

        // Top up from categories this species already uses.
        while selected.len() < self.constraints.settings.min_ingredients {
            let next = requirements(species)
                .iter()
                .filter_map(|r| self.ranked(r.category, &selected).into_iter().next())
                .max_by(|a, b| a.1.total_cmp(&b.1));
            match next {
                Some((ingredient, _)) => selected.push(ingredient),
                None => break,
            }
        }

        selected
    }

    /// Candidates in `category` not yet selected, best first.
    fn ranked(
        &self,
        category: IngredientCategory,
        selected: &[&'a Ingredient],
    ) -> Vec<(&'a Ingredient, f64)> {
        let mut ranked = self
            .candidates
            .in_category(category)
            .into_iter()
            .filter(|i| !selected.iter().any(|s| s.key == i.key))
            .map(|i| (i, self.ingredient_score(i)))
            .collect::<Vec<_>>();

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.key.cmp(&b.0.key)));
        ranked
    }

    fn ingredient_score(&self, ingredient: &Ingredient) -> f64 {
        let health = ingredient_health_score(ingredient, &self.constraints.concerns);
        let nutrition = ingredient_nutrition_score(ingredient);
        let quality = f64::from(ingredient.quality) * 10.0;

        let score = if ingredient.category == IngredientCategory::Protein {
            health * 0.2 + nutrition * 0.75 + quality * 0.05
        } else {
            health * 0.4 + nutrition * 0.5 + quality * 0.1
        };

        let uses = self.usage.get(&ingredient.key).copied().unwrap_or(0);
        score * 0.5f64.powi(uses as i32)
    }

    fn assemble<R: Rng>(&self, selected: &[&'a Ingredient], rng: &mut R) -> GeneratedRecipe {
        let species = self.constraints.species;
        let meal = meal_grams(
            species,
            self.constraints.weight_kg,
            self.constraints.settings.quality_tier,
        );
        let portions = portion(species, meal, selected, rng);

        let mut nutrition = Nutrients::default();
        for p in &portions {
            nutrition.accumulate(&p.ingredient.nutrients, p.grams);
        }
        let total_grams = portions.iter().map(|p| p.grams).sum::<f64>();

        let target = nutrition_target(species);
        let pct = |grams: f64| {
            if total_grams > 0.0 {
                round1(grams / total_grams * 100.0)
            } else {
                0.0
            }
        };
        let target_match = TargetMatch {
            protein_target_pct: round1(target.protein * 100.0),
            protein_pct: pct(nutrition.protein),
            fat_target_pct: round1(target.fat * 100.0),
            fat_pct: pct(nutrition.fat),
            meets_protein_target: nutrition.protein >= total_grams * target.protein * 0.95,
        };

        let health_concerns = self
            .constraints
            .concerns
            .iter()
            .filter(|c| selected.iter().any(|i| c.benefits(i)))
            .map(|c| c.slug.clone())
            .collect();

        let id = match self.constraints.settings.seed {
            Some(_) => Ulid::from_parts(0, rng.random()),
            None => Ulid::new(),
        };

        GeneratedRecipe {
            id: id.to_string(),
            name: recipe_name(species, selected),
            species,
            ingredients: portions
                .iter()
                .map(|p| GeneratedIngredient {
                    key: p.ingredient.key.clone(),
                    name: p.ingredient.name.clone(),
                    category: p.ingredient.category,
                    grams: p.grams,
                })
                .collect(),
            total_grams: round1(total_grams),
            nutrition: nutrition.rounded(),
            health_concerns,
            age_groups: vec![self.constraints.age_group],
            target_match,
        }
    }
}

/// +35 per concern the ingredient helps with, capped at 100.
fn ingredient_health_score(ingredient: &Ingredient, concerns: &[HealthConcernProfile]) -> f64 {
    let hits = concerns.iter().filter(|c| c.benefits(ingredient)).count();
    (hits as f64 * 35.0).min(100.0)
}

fn ingredient_nutrition_score(ingredient: &Ingredient) -> f64 {
    let n = &ingredient.nutrients;
    let protein = match n.protein {
        p if p >= 30.0 => 70.0,
        p if p >= 25.0 => 55.0,
        p if p >= 20.0 => 40.0,
        p if p >= 15.0 => 25.0,
        p if p >= 10.0 => 12.0,
        p if p >= 5.0 => 6.0,
        _ => 0.0,
    };
    let fiber = if n.fiber > 5.0 {
        10.0
    } else if n.fiber > 2.0 {
        5.0
    } else {
        0.0
    };
    let calcium = if n.calcium > 100.0 { 5.0 } else { 0.0 };

    f64::min(protein + fiber + calcium, 100.0)
}

/// Index into `pool`, chosen with probability proportional to score squared.
fn weighted_pick<T, R: Rng>(pool: &[(T, f64)], rng: &mut R) -> Option<usize> {
    if pool.is_empty() {
        return None;
    }

    let weights = pool
        .iter()
        .map(|(_, score)| score.max(0.0).powi(2))
        .collect::<Vec<_>>();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Some(rng.random_range(0..pool.len()));
    }

    let mut roll = rng.random::<f64>() * total;
    for (idx, weight) in weights.iter().enumerate() {
        if roll < *weight {
            return Some(idx);
        }
        roll -= weight;
    }

    Some(pool.len() - 1)
}

fn recipe_name(species: Species, selected: &[&Ingredient]) -> String {
    let suffix = match species {
        Species::Dogs => "Bowl",
        Species::Cats => "Plate",
        Species::Birds => "Mash",
        Species::Reptiles => "Platter",
        Species::PocketPets => "Forage Mix",
    };

    match selected {
        [] => suffix.to_string(),
        [only] => format!("{} {suffix}", only.name),
        [first, second, ..] => format!("{} & {} {suffix}", first.name, second.name),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
