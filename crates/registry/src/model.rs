use std::collections::BTreeSet;

use petplates_shared::{
    AgeGroup, IngredientCategory, Species,
    text::{contains_ci, slug, slugs_overlap},
};
use serde::{Deserialize, Serialize};

/// Nutrient amounts. Ingredient profiles are per 100 g; recipe totals are
/// absolute. Protein, fat and fiber in grams, calcium and phosphorus in mg,
/// energy in kcal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub calcium: f64,
    #[serde(default)]
    pub phosphorus: f64,
}

impl Nutrients {
    /// Adds `grams` worth of a per-100 g profile.
    pub fn accumulate(&mut self, per_100g: &Nutrients, grams: f64) {
        let factor = grams / 100.0;
        self.protein += per_100g.protein * factor;
        self.fat += per_100g.fat * factor;
        self.calories += per_100g.calories * factor;
        self.fiber += per_100g.fiber * factor;
        self.calcium += per_100g.calcium * factor;
        self.phosphorus += per_100g.phosphorus * factor;
    }

    /// Rounds every field to one decimal place.
    pub fn rounded(&self) -> Nutrients {
        let r = |v: f64| (v * 10.0).round() / 10.0;
        Nutrients {
            protein: r(self.protein),
            fat: r(self.fat),
            calories: r(self.calories),
            fiber: r(self.fiber),
            calcium: r(self.calcium),
            phosphorus: r(self.phosphorus),
        }
    }

    /// Name of the first field that is negative or not finite.
    pub fn invalid_field(&self) -> Option<&'static str> {
        [
            ("protein", self.protein),
            ("fat", self.fat),
            ("calories", self.calories),
            ("fiber", self.fiber),
            ("calcium", self.calcium),
            ("phosphorus", self.phosphorus),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite() || *v < 0.0)
        .map(|(name, _)| name)
    }
}

fn default_quality() -> u8 {
    5
}

fn default_max_inclusion() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub key: String,
    pub name: String,
    pub category: IngredientCategory,
    pub species: BTreeSet<Species>,
    #[serde(default)]
    pub toxic_for: BTreeSet<Species>,
    pub nutrients: Nutrients,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default = "default_max_inclusion")]
    pub max_inclusion: f64,
}

impl Ingredient {
    pub fn supports(&self, species: Species) -> bool {
        self.species.contains(&species)
    }

    pub fn is_toxic_for(&self, species: Species) -> bool {
        self.toxic_for.contains(&species)
    }

    /// Case-insensitive substring match against the name, key and tags.
    pub fn mentions(&self, term: &str) -> bool {
        contains_ci(&self.name, term)
            || contains_ci(&self.key, term)
            || self.tags.iter().any(|tag| contains_ci(tag, term))
    }

    /// Slug overlap against the key and the slugged name, exact slug match
    /// against tags. Used for health concern terms such as `omega-3-sources`.
    pub fn matches_slug(&self, term: &str) -> bool {
        let term = slug(term);
        slugs_overlap(&self.key, &term)
            || slugs_overlap(&slug(&self.name), &term)
            || self.tags.iter().any(|tag| slug(tag) == term)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub key: String,
    pub grams: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeTemplate {
    pub id: String,
    pub name: String,
    #[serde(alias = "category")]
    pub species: Species,
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrients>,
    #[serde(default)]
    pub health_concerns: Vec<String>,
    #[serde(default)]
    pub age_groups: Vec<AgeGroup>,
}

/// Ingredient terms that help or should be avoided for one health concern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthConcernProfile {
    pub slug: String,
    #[serde(default)]
    pub beneficial: Vec<String>,
    #[serde(default)]
    pub avoid: Vec<String>,
}

impl HealthConcernProfile {
    pub fn benefits(&self, ingredient: &Ingredient) -> bool {
        self.beneficial.iter().any(|t| ingredient.matches_slug(t))
    }

    pub fn contraindicates(&self, ingredient: &Ingredient) -> bool {
        self.avoid.iter().any(|t| ingredient.matches_slug(t))
    }
}
