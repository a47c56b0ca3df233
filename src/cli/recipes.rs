use std::path::Path;

use anyhow::{Context, Result};
use petplates_engine::{GenerateRequest, PassTicket};
use petplates_shared::PetProfile;
use serde::Serialize;

use crate::{config::Config, routes::AppState};

pub fn read_pet(path: impl AsRef<Path>) -> Result<PetProfile> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pet profile {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Invalid pet profile {}", path.display()))
}

pub fn generate(config: Config, pet: &Path, count: Option<usize>) -> Result<()> {
    let state = AppState::load(config)?;
    let request = GenerateRequest {
        count,
        ..GenerateRequest::new(read_pet(pet)?)
    };

    let response = state.engine.generate(request)?;
    if let Some(insufficient) = &response.stats.insufficient {
        tracing::warn!("{insufficient}");
    }

    print_json(&response)
}

pub async fn recommend(config: Config, pet: &Path, limit: Option<usize>) -> Result<()> {
    let state = AppState::load(config)?;
    let request = GenerateRequest {
        count: limit,
        ..GenerateRequest::new(read_pet(pet)?)
    };

    let response = state
        .engine
        .recommend(request, &PassTicket::detached(), |progress| {
            tracing::info!(
                "Scored {}/{} recipes",
                progress.scored_count,
                progress.total_count
            );
        })
        .await?;

    print_json(&response)
}

pub fn score(config: Config, pet: &Path, recipe_id: &str) -> Result<()> {
    let state = AppState::load(config)?;
    let item = state.engine.score_by_id(&read_pet(pet)?, recipe_id)?;

    print_json(&item)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
