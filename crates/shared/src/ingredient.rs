use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

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
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum IngredientCategory {
    #[default]
    Protein,
    Carb,
    Vegetable,
    Fat,
    Supplement,
    Seed,
    Fruit,
    Insect,
    Hay,
    Pellet,
}

impl IngredientCategory {
    /// Maps loose category labels found in ingredient data onto the closed set.
    ///
    /// ```
    /// use petplates_shared::IngredientCategory;
    ///
    /// assert_eq!(IngredientCategory::canonical("Poultry"), Some(IngredientCategory::Protein));
    /// assert_eq!(IngredientCategory::canonical("grains"), Some(IngredientCategory::Carb));
    /// assert_eq!(IngredientCategory::canonical("gravel"), None);
    /// ```
    pub fn canonical(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();

        Self::lookup(&value).or_else(|| value.strip_suffix('s').and_then(Self::lookup))
    }

    fn lookup(value: &str) -> Option<Self> {
        let category = match value {
            "protein" | "meat" | "fish" | "poultry" | "egg" | "seafood" | "organ" => {
                Self::Protein
            }
            "carb" | "carbohydrate" | "grain" | "starch" => Self::Carb,
            "fat" | "oil" => Self::Fat,
            "supplement" | "vitamin" | "mineral" => Self::Supplement,
            "seed" | "nut" => Self::Seed,
            "fruit" | "berry" | "berrie" => Self::Fruit,
            "insect" | "bug" | "worm" => Self::Insect,
            "hay" | "grass" => Self::Hay,
            "pellet" => Self::Pellet,
            v if v.starts_with("veg") || v == "green" || v == "leafy-green" => Self::Vegetable,
            _ => return None,
        };

        Some(category)
    }
}

impl TryFrom<String> for IngredientCategory {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::canonical(&value).ok_or_else(|| format!("unknown ingredient category `{value}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_folds_aliases() {
        assert_eq!(IngredientCategory::canonical("oil"), Some(IngredientCategory::Fat));
        assert_eq!(IngredientCategory::canonical("Veggies"), Some(IngredientCategory::Vegetable));
        assert_eq!(IngredientCategory::canonical("nuts"), Some(IngredientCategory::Seed));
        assert_eq!(IngredientCategory::canonical("hay"), Some(IngredientCategory::Hay));
        assert_eq!(IngredientCategory::canonical("insects"), Some(IngredientCategory::Insect));
    }

    #[test]
    fn deserializes_through_canonical() {
        let category: IngredientCategory = serde_json::from_str("\"meat\"").unwrap();
        assert_eq!(category, IngredientCategory::Protein);
        assert!(serde_json::from_str::<IngredientCategory>("\"rocks\"").is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&IngredientCategory::Vegetable).unwrap(),
            "\"vegetable\""
        );
        assert_eq!(IngredientCategory::Pellet.to_string(), "pellet");
    }
}
