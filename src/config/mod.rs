//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `DEEPCAL` prefix and nested values use double underscores as separators.
//! Every setting has a default, so an empty environment yields a working
//! configuration with a local-only drift queue.
//!
//! # Example
//!
//! ```no_run
//! use deepcal_core::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Blend {} / {}", config.engine.topsis_weight, config.engine.grey_weight);
//! ```

mod drift;
mod engine;
mod error;
mod persistence;
mod telemetry;

pub use drift::DriftConfig;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use persistence::PersistenceConfig;
pub use telemetry::TelemetryConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Ranking pipeline tuning (blend, ζ, consistency threshold)
    #[serde(default)]
    pub engine: EngineConfig,

    /// Drift policy and base weights
    #[serde(default)]
    pub drift: DriftConfig,

    /// Drift queue and remote store
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Log filter and format
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DEEPCAL` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `DEEPCAL__ENGINE__TOPSIS_WEIGHT=0.5` -> `engine.topsis_weight = 0.5`
    /// - `DEEPCAL__DRIFT__BASE_WEIGHTS__COST=0.5` -> `drift.base_weights.cost = 0.5`
    /// - `DEEPCAL__PERSISTENCE__STORE_URL=...` -> `persistence.store_url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DEEPCAL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.engine.validate()?;
        self.drift.validate()?;
        self.persistence.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "DEEPCAL__ENGINE__TOPSIS_WEIGHT",
        "DEEPCAL__ENGINE__GREY_WEIGHT",
        "DEEPCAL__ENGINE__STRICT_PAIRWISE",
        "DEEPCAL__DRIFT__WEIGHT_STEP",
        "DEEPCAL__PERSISTENCE__QUEUE_DIR",
        "DEEPCAL__PERSISTENCE__STORE_URL",
        "DEEPCAL__PERSISTENCE__STORE_API_KEY",
        "DEEPCAL__PERSISTENCE__BATCH_SIZE",
        "DEEPCAL__TELEMETRY__JSON_LOGS",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.engine.topsis_weight, 0.6);
        assert_eq!(config.drift.weight_step, 0.05);
        assert_eq!(config.persistence.batch_size, 50);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("DEEPCAL__ENGINE__TOPSIS_WEIGHT", "0.5");
        env::set_var("DEEPCAL__ENGINE__GREY_WEIGHT", "0.5");
        env::set_var("DEEPCAL__ENGINE__STRICT_PAIRWISE", "true");
        env::set_var("DEEPCAL__DRIFT__WEIGHT_STEP", "0.1");
        env::set_var("DEEPCAL__PERSISTENCE__QUEUE_DIR", "/tmp/deepcal-queue");
        env::set_var("DEEPCAL__PERSISTENCE__BATCH_SIZE", "10");
        env::set_var("DEEPCAL__TELEMETRY__JSON_LOGS", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.engine.topsis_weight, 0.5);
        assert!(config.engine.strict_pairwise);
        assert_eq!(config.drift.weight_step, 0.1);
        assert_eq!(
            config.persistence.queue_dir,
            std::path::PathBuf::from("/tmp/deepcal-queue")
        );
        assert_eq!(config.persistence.batch_size, 10);
        assert!(config.telemetry.json_logs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_remote_store_settings() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("DEEPCAL__PERSISTENCE__STORE_URL", "https://db.example.com");
        env::set_var("DEEPCAL__PERSISTENCE__STORE_API_KEY", "service-key");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.persistence.has_remote_store());
        assert!(config.persistence.store_api_key.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_blend_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("DEEPCAL__ENGINE__TOPSIS_WEIGHT", "0.9");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBlend { .. })
        ));
    }
}
