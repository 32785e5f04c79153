//! Configuration validation.
//!
//! Range checks live on the structs as `validator` attributes; the rules
//! here relate fields to each other.

use lookback_core::COUNT_CAP;

use crate::error::ConfigError;
use crate::Config;

/// Validate a configuration.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_simple_config(config)?;
    validate_map_config(config)?;
    validate_logging_config(config)?;

    Ok(())
}

/// Validate pattern-replay settings.
fn validate_simple_config(config: &Config) -> Result<(), ConfigError> {
    let simple = &config.drafter.simple;

    // A replay shorter than the pattern is always rejected
    if simple.continuation_len < simple.key_len {
        return Err(ConfigError::invalid_value(
            "drafter.simple.continuation_len",
            format!(
                "must be at least key_len ({}), otherwise no draft is ever produced",
                simple.key_len
            ),
        ));
    }

    Ok(())
}

/// Validate n-gram map settings.
fn validate_map_config(config: &Config) -> Result<(), ConfigError> {
    let map = &config.drafter.map;

    // Hit counters saturate, so a larger floor is unreachable
    if map.min_hits > COUNT_CAP {
        return Err(ConfigError::invalid_value(
            "drafter.map.min_hits",
            format!("must not exceed {COUNT_CAP}"),
        ));
    }

    Ok(())
}

/// Validate logging settings.
fn validate_logging_config(config: &Config) -> Result<(), ConfigError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.to_lowercase().as_str()) {
        return Err(ConfigError::invalid_value(
            "logging.level",
            format!("must be one of: {}", valid_levels.join(", ")),
        ));
    }

    let valid_formats = ["pretty", "compact", "json"];
    if !valid_formats.contains(&config.logging.format.to_lowercase().as_str()) {
        return Err(ConfigError::invalid_value(
            "logging.format",
            format!("must be one of: {}", valid_formats.join(", ")),
        ));
    }

    Ok(())
}
