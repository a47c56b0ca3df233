use petplates_registry::Ingredient;
use petplates_shared::{IngredientCategory, Species};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

const VARIATION: f64 = 0.15;
const PROTEIN_BOOST: f64 = 1.2;
const BOOST_THRESHOLD: f64 = 0.95;
const HIGH_PROTEIN_PER_100G: f64 = 15.0;

/// Ingredient quality tier. Scales dog and cat meal sizes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QualityTier {
    Premium,
    #[default]
    Standard,
    Budget,
}

/// Protein and fat targets as fractions of the meal weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutritionTarget {
    pub protein: f64,
    pub fat: f64,
}

pub fn nutrition_target(species: Species) -> NutritionTarget {
    let (protein, fat) = match species {
        Species::Dogs => (0.20, 0.08),
        Species::Cats => (0.23, 0.10),
        Species::Birds => (0.15, 0.08),
        Species::Reptiles => (0.15, 0.07),
        Species::PocketPets => (0.14, 0.06),
    };

    NutritionTarget { protein, fat }
}

/// Acceptable protein and fat percentages of a recipe's total weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutrientRange {
    pub protein: (f64, f64),
    pub fat: (f64, f64),
}

impl NutrientRange {
    pub fn protein_in_range(&self, pct: f64) -> bool {
        (self.protein.0..=self.protein.1).contains(&pct)
    }

    pub fn fat_in_range(&self, pct: f64) -> bool {
        (self.fat.0..=self.fat.1).contains(&pct)
    }
}

pub fn nutrient_range(species: Species) -> NutrientRange {
    let (protein, fat) = match species {
        Species::Dogs => ((18.0, 35.0), (8.0, 22.0)),
        Species::Cats => ((28.0, 45.0), (9.0, 25.0)),
        Species::Birds => ((12.0, 22.0), (4.0, 12.0)),
        Species::Reptiles => ((15.0, 28.0), (4.0, 12.0)),
        Species::PocketPets => ((12.0, 20.0), (2.0, 8.0)),
    };

    NutrientRange { protein, fat }
}

/// Grams per meal for a pet of `weight_kg`.
pub fn meal_grams(species: Species, weight_kg: f64, tier: QualityTier) -> f64 {
    let per_kg = match (species, tier) {
        (Species::Dogs | Species::Cats, QualityTier::Premium) => 80.0,
        (Species::Dogs | Species::Cats, QualityTier::Standard) => 65.0,
        (Species::Dogs | Species::Cats, QualityTier::Budget) => 50.0,
        (Species::Birds, _) => 40.0,
        (Species::Reptiles, _) => 30.0,
        (Species::PocketPets, _) => 100.0,
    };

    weight_kg * per_kg
}

fn protein_cap(species: Species) -> Option<f64> {
    match species {
        Species::Dogs => Some(0.85),
        Species::Cats => Some(0.90),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Portion<'a> {
    pub ingredient: &'a Ingredient,
    pub grams: f64,
}

/// Splits `meal` grams across the selected ingredients.
///
/// Dogs and cats size the protein to hit the species protein target and share
/// the rest evenly. Other species blend an equal share with a share weighted
/// by protein density. Every portion gets up to 15% random variation and is
/// capped at the ingredient's maximum inclusion. If protein still falls short
/// of 95% of the target, high-protein portions are raised by 20%.
pub fn portion<'a, R: Rng>(
    species: Species,
    meal: f64,
    selected: &[&'a Ingredient],
    rng: &mut R,
) -> Vec<Portion<'a>> {
    let n = selected.len();
    if n == 0 || meal <= 0.0 {
        return Vec::new();
    }

    let target = nutrition_target(species);
    let caps = selected
        .iter()
        .map(|i| i.max_inclusion * meal)
        .collect::<Vec<_>>();
    let is_protein = |idx: usize| selected[idx].category == IngredientCategory::Protein;
    let mut grams = vec![0.0; n];

    match protein_cap(species) {
        Some(cap_fraction) => {
            let proteins = (0..n).filter(|i| is_protein(*i)).collect::<Vec<_>>();
            if !proteins.is_empty() {
                let needed = meal * target.protein / proteins.len() as f64;
                for &idx in &proteins {
                    let density = selected[idx].nutrients.protein / 100.0;
                    let wanted = if density > 0.0 {
                        needed / density
                    } else {
                        meal / n as f64
                    };
                    grams[idx] = wanted.min(caps[idx]);
                }

                let protein_total: f64 = proteins.iter().map(|i| grams[*i]).sum();
                let limit = meal * cap_fraction;
                if protein_total > limit {
                    let scale = limit / protein_total;
                    proteins.iter().for_each(|i| grams[*i] *= scale);
                }
            }

            let protein_total: f64 = proteins.iter().map(|i| grams[*i]).sum();
            let others = (0..n).filter(|i| !is_protein(*i)).collect::<Vec<_>>();
            if !others.is_empty() {
                let share = (meal - protein_total).max(0.0) / others.len() as f64;
                for &idx in &others {
                    grams[idx] = (share * vary(rng)).min(caps[idx]);
                }
                redistribute(meal, &mut grams, &caps, &others);
            }
        }
        None => {
            let density_total: f64 = selected.iter().map(|i| i.nutrients.protein).sum();
            for idx in 0..n {
                let share = if density_total > 0.0 {
                    0.7 / n as f64 + 0.3 * selected[idx].nutrients.protein / density_total
                } else {
                    1.0 / n as f64
                };
                grams[idx] = (meal * share * vary(rng)).min(caps[idx]);
            }
            let all = (0..n).collect::<Vec<_>>();
            redistribute(meal, &mut grams, &caps, &all);
        }
    }

    let protein_grams: f64 = selected
        .iter()
        .zip(&grams)
        .map(|(i, g)| i.nutrients.protein * g / 100.0)
        .sum();
    if protein_grams < BOOST_THRESHOLD * meal * target.protein {
        for idx in 0..n {
            if selected[idx].nutrients.protein >= HIGH_PROTEIN_PER_100G {
                grams[idx] = (grams[idx] * PROTEIN_BOOST).min(caps[idx]);
            }
        }
    }

    selected
        .iter()
        .zip(grams)
        .map(|(&ingredient, g)| Portion {
            ingredient,
            grams: ((g * 10.0).round() / 10.0).max(0.1),
        })
        .collect()
}

fn vary<R: Rng>(rng: &mut R) -> f64 {
    1.0 + rng.random_range(-VARIATION..=VARIATION)
}

/// Moves grams lost to inclusion caps onto the open items in `eligible`.
fn redistribute(meal: f64, grams: &mut [f64], caps: &[f64], eligible: &[usize]) {
    for _ in 0..eligible.len() {
        let surplus = meal - grams.iter().sum::<f64>();
        if surplus <= 0.01 {
            return;
        }

        let open = eligible
            .iter()
            .copied()
            .filter(|i| grams[*i] + 0.01 < caps[*i])
            .collect::<Vec<_>>();
        if open.is_empty() {
            return;
        }

        let share = surplus / open.len() as f64;
        for idx in open {
            grams[idx] = (grams[idx] + share).min(caps[idx]);
        }
    }
}
