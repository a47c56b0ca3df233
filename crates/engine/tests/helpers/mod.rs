#![allow(dead_code)]

use std::sync::Arc;

use petplates_engine::{BuilderSettings, Engine, EngineSettings};
use petplates_registry::Registry;
use petplates_shared::{PetProfile, Species};

pub fn setup_engine() -> anyhow::Result<Engine> {
    setup_engine_with(EngineSettings {
        builder: BuilderSettings {
            seed: Some(7),
            ..Default::default()
        },
        ..Default::default()
    })
}

pub fn setup_engine_with(settings: EngineSettings) -> anyhow::Result<Engine> {
    let registry = Registry::builtin()?;

    Ok(Engine::new(Arc::new(registry), settings))
}

pub fn pet(species: Species) -> PetProfile {
    PetProfile::new(species)
}

pub fn pet_with_allergies(species: Species, allergies: &[&str]) -> PetProfile {
    PetProfile {
        allergies: allergies.iter().map(|a| a.to_string()).collect(),
        ..PetProfile::new(species)
    }
}
