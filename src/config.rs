use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use petplates_engine::{BuilderSettings, DiversityMode, EngineSettings, QualityTier, ScoringWeights};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Force JSON log lines outside production
    #[serde(default)]
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Ingredient and recipe data. The embedded dataset is used when `path` is
/// not set.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RegistryConfig {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScoringConfig {
    #[serde(flatten)]
    pub weights: ScoringWeights,
    #[serde(default)]
    pub presentation_variation: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_count")]
    pub default_count: usize,
    #[serde(default = "default_max_count")]
    pub max_count: usize,
    #[serde(default)]
    pub diversity: DiversityMode,
    #[serde(default)]
    pub quality_tier: QualityTier,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            max_count: default_max_count(),
            diversity: DiversityMode::default(),
            quality_tier: QualityTier::default(),
            seed: None,
        }
    }
}

fn default_count() -> usize {
    10
}

fn default_max_count() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    petplates_engine::scheduler::DEFAULT_CHUNK_SIZE
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (PETPLATES__SERVER__PORT, etc.)
    /// 2. Config file specified by path
    /// 3. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        builder = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?;

        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("PETPLATES")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        if self.scheduler.chunk_size == 0 {
            return Err("Scheduler chunk_size must be at least 1".to_string());
        }
        if self.generation.max_count == 0 {
            return Err("Generation max_count must be at least 1".to_string());
        }
        if self.generation.default_count > self.generation.max_count {
            return Err("Generation default_count must not exceed max_count".to_string());
        }
        self.scoring.weights.validate()?;
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            weights: self.scoring.weights.clone(),
            builder: BuilderSettings {
                diversity: self.generation.diversity,
                quality_tier: self.generation.quality_tier,
                seed: self.generation.seed,
                ..Default::default()
            },
            chunk_size: self.scheduler.chunk_size,
            presentation_variation: self.scoring.presentation_variation,
            default_count: self.generation.default_count,
            max_count: self.generation.max_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            observability: ObservabilityConfig::default(),
            registry: RegistryConfig::default(),
            scoring: ScoringConfig::default(),
            generation: GenerationConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validation_zero_port() {
        let mut config = valid_config();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_chunk_size() {
        let mut config = valid_config();
        config.scheduler.chunk_size = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_floor_above_ceiling() {
        let mut config = valid_config();
        config.scoring.weights.floor = 90;
        config.scoring.weights.ceiling = 80;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_ceiling_above_hundred() {
        let mut config = valid_config();
        config.scoring.weights.ceiling = 120;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_default_count_above_max() {
        let mut config = valid_config();
        config.generation.default_count = 60;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_settings_follow_config() {
        let mut config = valid_config();
        config.generation.seed = Some(9);
        config.generation.diversity = DiversityMode::High;
        config.scheduler.chunk_size = 5;

        let settings = config.engine_settings();
        assert_eq!(settings.builder.seed, Some(9));
        assert_eq!(settings.builder.diversity, DiversityMode::High);
        assert_eq!(settings.builder.min_ingredients, 3);
        assert_eq!(settings.chunk_size, 5);
        assert_eq!(settings.weights, ScoringWeights::default());
    }
}
