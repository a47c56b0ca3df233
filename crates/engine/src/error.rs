use petplates_shared::Species;
use thiserror::Error;

/// A recipe that cannot be scored for a pet. Reported per item; never aborts
/// a ranking pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Recipe `{recipe}` references unknown ingredient `{ingredient}`")]
    UnknownIngredient { recipe: String, ingredient: String },

    #[error("Recipe `{0}` has no ingredients")]
    EmptyRecipe(String),

    #[error("Recipe `{recipe}` is for {recipe_species}, not {pet_species}")]
    SpeciesMismatch {
        recipe: String,
        recipe_species: Species,
        pet_species: Species,
    },
}

impl ScoringError {
    pub fn recipe_id(&self) -> &str {
        match self {
            ScoringError::UnknownIngredient { recipe, .. } => recipe,
            ScoringError::EmptyRecipe(recipe) => recipe,
            ScoringError::SpeciesMismatch { recipe, .. } => recipe,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassError {
    #[error("Scoring pass was superseded by a newer request")]
    Superseded,
}

impl From<ScoringError> for petplates_shared::Error {
    fn from(value: ScoringError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

impl From<PassError> for petplates_shared::Error {
    fn from(value: PassError) -> Self {
        Self::Conflict(value.to_string())
    }
}
