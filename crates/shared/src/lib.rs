mod command;
pub mod ingredient;
pub mod pet;
pub mod text;

pub use command::*;
pub use ingredient::IngredientCategory;
pub use pet::{ActivityLevel, AgeGroup, PetAge, PetProfile, Species};
