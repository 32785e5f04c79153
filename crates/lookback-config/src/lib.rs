//! Lookback Configuration Management.
//!
//! Configuration loading and validation for lookback drafters. Supports
//! YAML, TOML, and JSON files plus environment variable overrides.
//!
//! # Example
//!
//! ```rust,ignore
//! use lookback_config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_file("lookback.toml")
//!     .with_env_prefix("LOOKBACK")
//!     .load()?;
//!
//! println!("Mode: {}", config.drafter.mode);
//! ```

pub mod drafter;
pub mod error;
pub mod loader;
pub mod validation;

pub use drafter::{DraftMode, DrafterConfig, MapConfig, SimpleConfig};
pub use error::{validation_messages, ConfigError};
pub use loader::{ConfigBuilder, ConfigLoader};

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Drafter configuration.
    #[validate(nested)]
    #[serde(default)]
    pub drafter: DrafterConfig,

    /// Logging configuration.
    #[validate(nested)]
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Create a new configuration from file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        ConfigLoader::new().with_file(path).load()
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        ConfigLoader::new().with_env_prefix("LOOKBACK").load()
    }

    /// Validate field ranges and cross-field rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        <Self as Validate>::validate(self).map_err(ConfigError::from)?;
        validation::validate_config(self)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// Log level.
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty, compact).
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics collection.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_nested_range_error_is_reported() {
        let mut config = Config::default();
        config.drafter.map.key_len = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("drafter.map.key_len"), "{err}");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [drafter]
            mode = "simple"

            [drafter.simple]
            key_len = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.drafter.mode, DraftMode::Simple);
        assert_eq!(config.drafter.simple.key_len, 3);
        assert_eq!(config.drafter.simple.continuation_len, 48);
        assert_eq!(config.drafter.map.min_hits, 2);
        assert_eq!(config.logging.level, "info");
        assert!(config.metrics.enabled);
    }
}
