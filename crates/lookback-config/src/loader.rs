//! Configuration loader.

use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::ConfigError;
use crate::{Config, DraftMode, DrafterConfig, MapConfig, SimpleConfig};

/// Configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension.
    pub fn from_extension(path: &str) -> Option<Self> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            Some("toml") => Some(Self::Toml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }

    /// Parse content in this format.
    pub fn parse<T: serde::de::DeserializeOwned>(&self, content: &str) -> Result<T, ConfigError> {
        match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(ConfigError::from),
            Self::Toml => toml::from_str(content).map_err(ConfigError::from),
            Self::Json => serde_json::from_str(content).map_err(ConfigError::from),
        }
    }
}

/// Configuration loader.
///
/// Layers are applied in order: defaults, file, environment. The result is
/// validated before it is returned.
pub struct ConfigLoader {
    /// Config file path.
    file_path: Option<String>,

    /// Environment variable prefix.
    env_prefix: Option<String>,

    /// Default values.
    defaults: Config,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new() -> Self {
        Self {
            file_path: None,
            env_prefix: None,
            defaults: Config::default(),
        }
    }

    /// Set the config file path.
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Set the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Set default values.
    pub fn with_defaults(mut self, defaults: Config) -> Self {
        self.defaults = defaults;
        self
    }

    /// Load the configuration.
    pub fn load(self) -> Result<Config, ConfigError> {
        let mut config = self.defaults.clone();

        if let Some(ref path) = self.file_path {
            config = self.load_from_file(path)?;
        }

        if let Some(ref prefix) = self.env_prefix {
            self.apply_env_overrides(&mut config, prefix)?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Load from file.
    fn load_from_file(&self, path: &str) -> Result<Config, ConfigError> {
        debug!("Loading configuration from {}", path);

        if !Path::new(path).exists() {
            return Err(ConfigError::FileNotFound(path.to_string()));
        }

        let content = std::fs::read_to_string(path)?;

        let format = ConfigFormat::from_extension(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_string()))?;

        let config: Config = format.parse(&content)?;

        info!("Loaded configuration from {}", path);

        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Length and rate overrides target the drafter selected by the
    /// (possibly overridden) mode.
    fn apply_env_overrides(&self, config: &mut Config, prefix: &str) -> Result<(), ConfigError> {
        if let Some(mode) = env_parse::<DraftMode>(prefix, "MODE")? {
            config.drafter.mode = mode;
        }

        let drafter = &mut config.drafter;
        if let Some(n) = env_parse::<usize>(prefix, "KEY_LEN")? {
            match drafter.mode {
                DraftMode::Simple => drafter.simple.key_len = n,
                _ => drafter.map.key_len = n,
            }
        }
        if let Some(m) = env_parse::<usize>(prefix, "CONTINUATION_LEN")? {
            match drafter.mode {
                DraftMode::Simple => drafter.simple.continuation_len = m,
                _ => drafter.map.continuation_len = m,
            }
        }
        if let Some(rate) = env_parse::<usize>(prefix, "CHECK_RATE")? {
            match drafter.mode {
                DraftMode::Simple => drafter.simple.check_rate = rate,
                _ => drafter.map.check_rate = rate,
            }
        }
        if let Some(hits) = env_parse::<u16>(prefix, "MIN_HITS")? {
            drafter.map.min_hits = hits;
        }

        // Logging overrides
        if let Ok(val) = std::env::var(format!("{}_LOG_LEVEL", prefix)) {
            config.logging.level = val;
        }
        if let Ok(val) = std::env::var(format!("{}_LOG_FORMAT", prefix)) {
            config.logging.format = val;
        }

        if let Some(enabled) = env_parse::<bool>(prefix, "METRICS")? {
            config.metrics.enabled = enabled;
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Read `{prefix}_{name}` and parse it, rejecting malformed values.
fn env_parse<T>(prefix: &str, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let key = format!("{}_{}", prefix, name);
    match std::env::var(&key) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid_value(key, e.to_string())),
        Err(_) => Ok(None),
    }
}

/// Load configuration from default locations.
pub fn load_default_config() -> Result<Config, ConfigError> {
    let paths = [
        "lookback.yaml",
        "lookback.yml",
        "lookback.toml",
        "lookback.json",
    ];

    for path in &paths {
        if Path::new(path).exists() {
            return ConfigLoader::new()
                .with_file(*path)
                .with_env_prefix("LOOKBACK")
                .load();
        }
    }

    ConfigLoader::new().with_env_prefix("LOOKBACK").load()
}

/// Builder for programmatic configuration.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new config builder.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the whole drafter configuration.
    pub fn drafter(mut self, config: DrafterConfig) -> Self {
        self.config.drafter = config;
        self
    }

    /// Set the draft mode.
    pub fn mode(mut self, mode: DraftMode) -> Self {
        self.config.drafter.mode = mode;
        self
    }

    /// Set pattern-replay settings.
    pub fn simple(mut self, config: SimpleConfig) -> Self {
        self.config.drafter.simple = config;
        self
    }

    /// Set n-gram map settings.
    pub fn map(mut self, config: MapConfig) -> Self {
        self.config.drafter.map = config;
        self
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_extension("a.yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("a.TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("a.json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("a.ini"), None);
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            ".yaml",
            "drafter:\n  mode: map-key\n  map:\n    key_len: 3\n    continuation_len: 6\n",
        );
        let config = ConfigLoader::new()
            .with_file(file.path().to_string_lossy())
            .load()
            .unwrap();
        assert_eq!(config.drafter.mode, DraftMode::MapKey);
        assert_eq!(config.drafter.map.key_len, 3);
        assert_eq!(config.drafter.map.continuation_len, 6);
    }

    #[test]
    fn test_load_json() {
        let file = write_config(".json", r#"{"drafter": {"map": {"min_hits": 5}}}"#);
        let config = Config::from_file(&file.path().to_string_lossy()).unwrap();
        assert_eq!(config.drafter.map.min_hits, 5);
        assert_eq!(config.drafter.mode, DraftMode::MapKeyValues);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .with_file("/definitely/not/here.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_config(".ini", "mode = simple");
        let err = ConfigLoader::new()
            .with_file(file.path().to_string_lossy())
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_invalid_file_is_rejected_after_parse() {
        let file = write_config(".toml", "[drafter.map]\ncheck_rate = 0\n");
        let err = ConfigLoader::new()
            .with_file(file.path().to_string_lossy())
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_env_overrides_target_active_mode() {
        std::env::set_var("LBTEST_ACTIVE_MODE", "simple");
        std::env::set_var("LBTEST_ACTIVE_KEY_LEN", "5");
        std::env::set_var("LBTEST_ACTIVE_CONTINUATION_LEN", "9");

        let config = ConfigLoader::new()
            .with_env_prefix("LBTEST_ACTIVE")
            .load()
            .unwrap();
        assert_eq!(config.drafter.mode, DraftMode::Simple);
        assert_eq!(config.drafter.simple.key_len, 5);
        assert_eq!(config.drafter.simple.continuation_len, 9);
        assert_eq!(config.drafter.map.key_len, MapConfig::default().key_len);
    }

    #[test]
    fn test_env_malformed_value() {
        std::env::set_var("LBTEST_BAD_MIN_HITS", "lots");
        let err = ConfigLoader::new()
            .with_env_prefix("LBTEST_BAD")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "LBTEST_BAD_MIN_HITS"));
    }

    #[test]
    fn test_builder() {
        let config = ConfigBuilder::new()
            .mode(DraftMode::Simple)
            .simple(SimpleConfig::new(2, 4).with_check_rate(3))
            .build()
            .unwrap();
        assert_eq!(config.drafter.simple.check_rate, 3);

        let err = ConfigBuilder::new().map(MapConfig::new(0, 4)).build();
        assert!(err.is_err());
    }
}
