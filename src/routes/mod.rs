use std::{collections::HashMap, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use petplates_engine::{Engine, ScoringSession};
use petplates_registry::Registry;
use tokio::sync::Mutex;

use crate::config::Config;

mod compatibility;
mod health;
mod recipes;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub engine: Arc<Engine>,
    /// One scoring session per pet; a new recommend request for the same pet
    /// supersedes the one in flight.
    pub sessions: Arc<Mutex<HashMap<String, ScoringSession>>>,
}

impl AppState {
    /// Loads the registry named in the config, or the embedded one.
    pub fn load(config: Config) -> anyhow::Result<Self> {
        let registry = match &config.registry.path {
            Some(path) => Registry::from_path(path)?,
            None => Registry::builtin()?,
        };

        Ok(Self::new(config, registry))
    }

    pub fn new(config: Config, registry: Registry) -> Self {
        let engine = Engine::new(Arc::new(registry), config.engine_settings());

        Self {
            config,
            engine: Arc::new(engine),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        // Health check endpoints
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/api/recipes/generate", post(recipes::generate))
        .route("/api/recipes/recommend", post(recipes::recommend))
        .route("/api/compatibility/score", post(compatibility::score))
        .with_state(app_state)
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::config::{
        Config, GenerationConfig, ObservabilityConfig, RegistryConfig, SchedulerConfig,
        ScoringConfig, ServerConfig,
    };

    pub fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            observability: ObservabilityConfig::default(),
            registry: RegistryConfig::default(),
            scoring: ScoringConfig::default(),
            generation: GenerationConfig {
                seed: Some(11),
                ..Default::default()
            },
            scheduler: SchedulerConfig::default(),
        }
    }
}
