use petplates_registry::{Ingredient, Nutrients, RecipeTemplate, Registry};
use petplates_shared::{
    AgeGroup, PetProfile, Species,
    text::{slug, slugs_overlap},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::{error::ScoringError, filter::matching_allergy, portion::nutrient_range};

/// Point values used by [`CompatibilityScorer`]. All scores are integers on a
/// 0..=100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub base: i32,
    pub age_match: i32,
    pub health_match: i32,
    pub health_match_cap: i32,
    pub health_miss_penalty: i32,
    pub nutrition_info: i32,
    pub protein_target: i32,
    pub protein_target_miss: i32,
    pub fat_target: i32,
    pub fat_target_miss: i32,
    pub allergy_conflict: i32,
    pub floor: i32,
    pub ceiling: i32,
    pub variation: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base: 40,
            age_match: 10,
            health_match: 12,
            health_match_cap: 30,
            health_miss_penalty: 3,
            nutrition_info: 8,
            protein_target: 6,
            protein_target_miss: 4,
            fat_target: 4,
            fat_target_miss: 3,
            allergy_conflict: 25,
            floor: 20,
            ceiling: 100,
            variation: 2,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), String> {
        if self.floor < 0 || self.ceiling > 100 {
            return Err("Scoring floor and ceiling must stay within 0..=100".to_string());
        }
        if self.floor > self.ceiling {
            return Err("Scoring floor must not exceed the ceiling".to_string());
        }
        if self.health_match_cap < 0 || self.variation < 0 {
            return Err("Scoring cap and variation must not be negative".to_string());
        }
        if [
            self.protein_target,
            self.protein_target_miss,
            self.fat_target,
            self.fat_target_miss,
        ]
        .iter()
        .any(|points| *points < 0)
        {
            return Err("Nutrition target points must not be negative".to_string());
        }
        Ok(())
    }
}

/// One contribution to a compatibility score. `score` is the weighted
/// contribution; the contributions of a [`ScoredItem`] always sum to its
/// pre-jitter score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Factor {
    Base {
        score: i32,
    },
    #[serde(rename_all = "camelCase")]
    AgeMatch {
        age_group: AgeGroup,
        matched: bool,
        weight: i32,
        score: i32,
    },
    HealthMatch {
        matched: Vec<String>,
        missed: Vec<String>,
        weight: i32,
        score: i32,
    },
    NutritionInfo {
        present: bool,
        weight: i32,
        score: i32,
    },
    /// Protein and fat as a percentage of the recipe weight, checked against
    /// the species range. `weight` is the most the factor can add.
    #[serde(rename_all = "camelCase")]
    NutritionTarget {
        species: Species,
        protein_pct: f64,
        fat_pct: f64,
        protein_in_range: bool,
        fat_in_range: bool,
        weight: i32,
        score: i32,
    },
    AllergyConflict {
        ingredients: Vec<String>,
        weight: i32,
        score: i32,
    },
    Variation {
        score: i32,
    },
    Clamp {
        score: i32,
    },
}

impl Factor {
    pub fn name(&self) -> &'static str {
        match self {
            Factor::Base { .. } => "base",
            Factor::AgeMatch { .. } => "age-match",
            Factor::HealthMatch { .. } => "health-match",
            Factor::NutritionInfo { .. } => "nutrition-info",
            Factor::NutritionTarget { .. } => "nutrition-target",
            Factor::AllergyConflict { .. } => "allergy-conflict",
            Factor::Variation { .. } => "variation",
            Factor::Clamp { .. } => "clamp",
        }
    }

    pub fn score(&self) -> i32 {
        match self {
            Factor::Base { score }
            | Factor::AgeMatch { score, .. }
            | Factor::HealthMatch { score, .. }
            | Factor::NutritionInfo { score, .. }
            | Factor::NutritionTarget { score, .. }
            | Factor::AllergyConflict { score, .. }
            | Factor::Variation { score }
            | Factor::Clamp { score } => *score,
        }
    }

    /// Points per matched unit. Base, variation and clamp count once.
    pub fn weight(&self) -> i32 {
        match self {
            Factor::AgeMatch { weight, .. }
            | Factor::HealthMatch { weight, .. }
            | Factor::NutritionInfo { weight, .. }
            | Factor::NutritionTarget { weight, .. }
            | Factor::AllergyConflict { weight, .. } => *weight,
            Factor::Base { .. } | Factor::Variation { .. } | Factor::Clamp { .. } => 1,
        }
    }

    pub fn issues(&self) -> Vec<String> {
        match self {
            Factor::AgeMatch {
                age_group,
                matched: false,
                ..
            } => vec![format!("Not formulated for {age_group} pets")],
            Factor::HealthMatch { missed, .. } => missed
                .iter()
                .map(|c| format!("Does not address {c}"))
                .collect(),
            Factor::NutritionInfo { present: false, .. } => {
                vec!["No nutrition information".to_string()]
            }
            Factor::NutritionTarget {
                species,
                protein_pct,
                fat_pct,
                protein_in_range,
                fat_in_range,
                ..
            } => {
                let range = nutrient_range(*species);
                let mut issues = Vec::new();
                if !protein_in_range {
                    issues.push(format!(
                        "Protein {protein_pct:.1}% is outside {}-{}% for {species}",
                        range.protein.0, range.protein.1
                    ));
                }
                if !fat_in_range {
                    issues.push(format!(
                        "Fat {fat_pct:.1}% is outside {}-{}% for {species}",
                        range.fat.0, range.fat.1
                    ));
                }
                issues
            }
            Factor::AllergyConflict { ingredients, .. } => ingredients
                .iter()
                .map(|i| format!("Contains {i}, a listed allergen"))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Letter grade for a final score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
pub enum Grade {
    #[serde(rename = "A+")]
    #[strum(serialize = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    #[strum(serialize = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    #[strum(serialize = "C+")]
    CPlus,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            97.. => Grade::APlus,
            93..=96 => Grade::A,
            89..=92 => Grade::BPlus,
            83..=88 => Grade::B,
            77..=82 => Grade::CPlus,
            70..=76 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn compatibility(self) -> Compatibility {
        match self {
            Grade::APlus | Grade::A => Compatibility::Excellent,
            Grade::BPlus | Grade::B => Compatibility::Good,
            Grade::CPlus | Grade::C => Compatibility::Fair,
            Grade::D | Grade::F => Compatibility::Poor,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Compatibility {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredItem {
    pub recipe_id: String,
    pub recipe_name: String,
    pub score: u8,
    pub grade: Grade,
    pub compatibility: Compatibility,
    pub factors: Vec<Factor>,
    #[serde(default)]
    pub jitter: i8,
}

impl ScoredItem {
    pub fn new(recipe_id: String, recipe_name: String, score: u8, factors: Vec<Factor>) -> Self {
        let grade = Grade::from_score(score);
        Self {
            recipe_id,
            recipe_name,
            score,
            grade,
            compatibility: grade.compatibility(),
            factors,
            jitter: 0,
        }
    }

    /// Replaces the score and the grade derived from it.
    pub fn set_score(&mut self, score: u8) {
        self.score = score;
        self.grade = Grade::from_score(score);
        self.compatibility = self.grade.compatibility();
    }

    pub fn factor_total(&self) -> i32 {
        self.factors.iter().map(Factor::score).sum()
    }

    /// Score before tie-break jitter was applied.
    pub fn pre_jitter_score(&self) -> i32 {
        i32::from(self.score) - i32::from(self.jitter)
    }

    pub fn issues(&self) -> Vec<String> {
        self.factors.iter().flat_map(Factor::issues).collect()
    }
}

/// Anything the scorer can rank: registry templates and generated recipes.
pub trait ScorableRecipe {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn species(&self) -> Species;
    fn ingredient_keys(&self) -> Vec<&str>;
    fn health_concerns(&self) -> &[String];
    fn age_groups(&self) -> &[AgeGroup];
    /// Absolute nutrient totals, when the recipe carries them.
    fn nutrition(&self) -> Option<&Nutrients>;
    fn total_grams(&self) -> f64;
}

impl<T: ScorableRecipe + ?Sized> ScorableRecipe for &T {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn species(&self) -> Species {
        (**self).species()
    }

    fn ingredient_keys(&self) -> Vec<&str> {
        (**self).ingredient_keys()
    }

    fn health_concerns(&self) -> &[String] {
        (**self).health_concerns()
    }

    fn age_groups(&self) -> &[AgeGroup] {
        (**self).age_groups()
    }

    fn nutrition(&self) -> Option<&Nutrients> {
        (**self).nutrition()
    }

    fn total_grams(&self) -> f64 {
        (**self).total_grams()
    }
}

impl ScorableRecipe for RecipeTemplate {
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
        self.nutrition.as_ref()
    }

    fn total_grams(&self) -> f64 {
        self.ingredients.iter().map(|i| i.grams).sum()
    }
}

/// Deterministic compatibility scoring of one recipe against one pet.
pub struct CompatibilityScorer<'a> {
    registry: &'a Registry,
    weights: &'a ScoringWeights,
}

impl<'a> CompatibilityScorer<'a> {
    pub fn new(registry: &'a Registry, weights: &'a ScoringWeights) -> Self {
        Self { registry, weights }
    }

    pub fn score<R: ScorableRecipe + ?Sized>(
        &self,
        recipe: &R,
        pet: &PetProfile,
    ) -> Result<ScoredItem, ScoringError> {
        if recipe.species() != pet.species {
            return Err(ScoringError::SpeciesMismatch {
                recipe: recipe.id().to_string(),
                recipe_species: recipe.species(),
                pet_species: pet.species,
            });
        }

        let keys = recipe.ingredient_keys();
        if keys.is_empty() {
            return Err(ScoringError::EmptyRecipe(recipe.id().to_string()));
        }

        let ingredients = keys
            .iter()
            .map(|key| {
                self.registry
                    .ingredient(key)
                    .ok_or_else(|| ScoringError::UnknownIngredient {
                        recipe: recipe.id().to_string(),
                        ingredient: key.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let w = self.weights;
        let mut factors = vec![Factor::Base { score: w.base }];

        let age_group = pet.age_group();
        let matched = recipe.age_groups().contains(&age_group);
        factors.push(Factor::AgeMatch {
            age_group,
            matched,
            weight: w.age_match,
            score: if matched { w.age_match } else { 0 },
        });

        factors.push(self.health_factor(recipe.health_concerns(), pet));

        let present = recipe.nutrition().is_some();
        factors.push(Factor::NutritionInfo {
            present,
            weight: w.nutrition_info,
            score: if present { w.nutrition_info } else { 0 },
        });

        if let Some(factor) = self.nutrition_target_factor(recipe, pet.species) {
            factors.push(factor);
        }

        if let Some(factor) = self.allergy_factor(&ingredients, pet) {
            factors.push(factor);
        }

        let raw: i32 = factors.iter().map(Factor::score).sum();
        let clamped = clamp_score(raw, w.floor, w.ceiling);
        if clamped != raw {
            factors.push(Factor::Clamp {
                score: clamped - raw,
            });
        }

        Ok(ScoredItem::new(
            recipe.id().to_string(),
            recipe.name().to_string(),
            to_score(clamped),
            factors,
        ))
    }

    /// Scores and then nudges the result by up to `variation` points so
    /// otherwise identical recipes read differently. Not used for ranking.
    pub fn score_with_variation<R: ScorableRecipe + ?Sized, G: Rng>(
        &self,
        recipe: &R,
        pet: &PetProfile,
        rng: &mut G,
    ) -> Result<ScoredItem, ScoringError> {
        let mut item = self.score(recipe, pet)?;
        let spread = self.weights.variation;
        if spread == 0 {
            return Ok(item);
        }

        let current = i32::from(item.score);
        let varied = clamp_score(
            current + rng.random_range(-spread..=spread),
            self.weights.floor,
            self.weights.ceiling,
        );
        if varied != current {
            item.factors.push(Factor::Variation {
                score: varied - current,
            });
            item.set_score(to_score(varied));
        }

        Ok(item)
    }

    fn health_factor(&self, recipe_concerns: &[String], pet: &PetProfile) -> Factor {
        let w = self.weights;
        let recipe_slugs = recipe_concerns.iter().map(|c| slug(c)).collect::<Vec<_>>();

        let (matched, missed): (Vec<String>, Vec<String>) = pet
            .concern_slugs()
            .into_iter()
            .partition(|concern| recipe_slugs.iter().any(|r| slugs_overlap(r, concern)));

        let bonus = (matched.len() as i32 * w.health_match).min(w.health_match_cap);
        let penalty = missed.len() as i32 * w.health_miss_penalty;

        Factor::HealthMatch {
            matched,
            missed,
            weight: w.health_match,
            score: bonus - penalty,
        }
    }

    fn nutrition_target_factor<R: ScorableRecipe + ?Sized>(
        &self,
        recipe: &R,
        species: Species,
    ) -> Option<Factor> {
        let nutrition = recipe.nutrition()?;
        let grams = recipe.total_grams();
        if grams <= 0.0 {
            return None;
        }

        let w = self.weights;
        let range = nutrient_range(species);
        let protein_pct = round1(nutrition.protein / grams * 100.0);
        let fat_pct = round1(nutrition.fat / grams * 100.0);
        let protein_in_range = range.protein_in_range(protein_pct);
        let fat_in_range = range.fat_in_range(fat_pct);

        let protein = if protein_in_range {
            w.protein_target
        } else {
            -w.protein_target_miss
        };
        let fat = if fat_in_range {
            w.fat_target
        } else {
            -w.fat_target_miss
        };

        Some(Factor::NutritionTarget {
            species,
            protein_pct,
            fat_pct,
            protein_in_range,
            fat_in_range,
            weight: w.protein_target + w.fat_target,
            score: protein + fat,
        })
    }

    fn allergy_factor(&self, ingredients: &[&Ingredient], pet: &PetProfile) -> Option<Factor> {
        let conflicts = ingredients
            .iter()
            .filter(|i| matching_allergy(i, &pet.allergies).is_some())
            .map(|i| i.name.clone())
            .collect::<Vec<_>>();

        if conflicts.is_empty() {
            return None;
        }

        Some(Factor::AllergyConflict {
            ingredients: conflicts,
            weight: self.weights.allergy_conflict,
            score: -self.weights.allergy_conflict,
        })
    }
}

fn clamp_score(score: i32, floor: i32, ceiling: i32) -> i32 {
    score.clamp(floor.max(0), ceiling.min(100).max(floor.max(0)))
}

fn to_score(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
