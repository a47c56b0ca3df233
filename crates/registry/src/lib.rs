mod error;
pub mod model;
mod registry;

pub use error::RegistryError;
pub use model::{HealthConcernProfile, Ingredient, Nutrients, RecipeIngredient, RecipeTemplate};
pub use registry::{Registry, RegistryData};
