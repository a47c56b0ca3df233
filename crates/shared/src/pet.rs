use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_224};
use strum::{AsRefStr, Display, EnumString, VariantArray};
use validator::{Validate, ValidationError};

use crate::text::{slug, to_hex};

#[derive(
    EnumString,
    Display,
    VariantArray,
    Default,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
pub enum Species {
    #[default]
    #[strum(to_string = "dogs", serialize = "dog")]
    #[serde(alias = "dog")]
    Dogs,
    #[strum(to_string = "cats", serialize = "cat")]
    #[serde(alias = "cat")]
    Cats,
    #[strum(to_string = "birds", serialize = "bird")]
    #[serde(alias = "bird")]
    Birds,
    #[strum(to_string = "reptiles", serialize = "reptile")]
    #[serde(alias = "reptile")]
    Reptiles,
    #[strum(to_string = "pocket-pets", serialize = "pocket-pet")]
    #[serde(alias = "pocket-pet")]
    PocketPets,
}

impl Species {
    pub fn is_exotic(&self) -> bool {
        !matches!(self, Species::Dogs | Species::Cats)
    }
}

#[derive(
    EnumString,
    Display,
    VariantArray,
    Default,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Baby,
    Young,
    #[default]
    Adult,
    Senior,
}

impl AgeGroup {
    /// Buckets an age in years: under 1 is baby, under 2 young, under 7 adult.
    pub fn from_years(years: f64) -> Self {
        if years < 1.0 {
            AgeGroup::Baby
        } else if years < 2.0 {
            AgeGroup::Young
        } else if years < 7.0 {
            AgeGroup::Adult
        } else {
            AgeGroup::Senior
        }
    }
}

/// Age as either an explicit bucket or a number of years.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PetAge {
    Group(AgeGroup),
    Years(f64),
}

impl Default for PetAge {
    fn default() -> Self {
        PetAge::Years(3.0)
    }
}

impl PetAge {
    pub fn group(&self) -> AgeGroup {
        match self {
            PetAge::Group(group) => *group,
            PetAge::Years(years) => AgeGroup::from_years(*years),
        }
    }
}

#[derive(
    EnumString,
    Display,
    VariantArray,
    Default,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ActivityLevel {
    Sedentary,
    #[default]
    Moderate,
    Active,
    VeryActive,
}

fn default_weight_kg() -> f64 {
    10.0
}

fn validate_age(age: &PetAge) -> Result<(), ValidationError> {
    match age {
        PetAge::Years(years) if !years.is_finite() || *years < 0.0 || *years > 60.0 => {
            Err(ValidationError::new("age_out_of_range"))
        }
        _ => Ok(()),
    }
}

fn validate_terms(terms: &[String]) -> Result<(), ValidationError> {
    if terms.iter().any(|t| t.trim().is_empty() || t.len() > 64) {
        return Err(ValidationError::new("invalid_term"));
    }

    Ok(())
}

#[derive(Validate, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 80))]
    pub name: Option<String>,
    #[serde(alias = "category")]
    pub species: Species,
    #[serde(default)]
    #[validate(custom(function = "validate_age"))]
    pub age: PetAge,
    #[serde(default = "default_weight_kg", alias = "weight")]
    #[validate(range(exclusive_min = 0.0, max = 500.0))]
    pub weight_kg: f64,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    #[serde(default)]
    #[validate(length(max = 20), custom(function = "validate_terms"))]
    pub health_concerns: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 30), custom(function = "validate_terms"))]
    pub allergies: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 30), custom(function = "validate_terms"))]
    pub dislikes: Vec<String>,
}

impl PetProfile {
    pub fn new(species: Species) -> Self {
        Self {
            species,
            weight_kg: default_weight_kg(),
            ..Default::default()
        }
    }

    pub fn age_group(&self) -> AgeGroup {
        self.age.group()
    }

    /// Health concerns normalized to slugs, empties removed.
    pub fn concern_slugs(&self) -> Vec<String> {
        self.health_concerns
            .iter()
            .map(|c| slug(c))
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Stable digest of the fields that influence scoring. List order and
    /// letter case do not change the result.
    pub fn profile_hash(&self) -> String {
        let mut hasher = Sha3_224::default();
        hasher.update(self.species.to_string());
        hasher.update(self.age_group().to_string());
        hasher.update(format!("{:.1}", self.weight_kg));
        hasher.update(self.activity_level.to_string());

        for list in [&self.health_concerns, &self.allergies, &self.dislikes] {
            let mut sorted = list
                .iter()
                .map(|v| v.trim().to_lowercase())
                .collect::<Vec<_>>();
            sorted.sort();
            hasher.update("|");
            hasher.update(sorted.join(","));
        }

        to_hex(&hasher.finalize()[..])
    }
}
