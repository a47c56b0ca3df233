use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read registry data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse registry data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Embedded registry data is missing")]
    MissingEmbedded,

    #[error("Duplicate ingredient key `{0}`")]
    DuplicateIngredient(String),

    #[error("Duplicate recipe id `{0}`")]
    DuplicateRecipe(String),

    #[error("Invalid ingredient `{key}`: {reason}")]
    InvalidIngredient { key: String, reason: String },

    #[error("Invalid recipe `{id}`: {reason}")]
    InvalidRecipe { id: String, reason: String },

    #[error("Recipe `{recipe}` references unknown ingredient `{ingredient}`")]
    UnknownIngredient { recipe: String, ingredient: String },

    #[error("Invalid health concern `{slug}`: {reason}")]
    InvalidHealthConcern { slug: String, reason: String },
}
