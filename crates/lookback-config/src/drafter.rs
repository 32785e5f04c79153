//! Drafter configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Drafting strategy for a generation slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DraftMode {
    /// Replay whatever followed the most recent occurrence of the pattern.
    Simple,
    /// N-gram map that drafts on every key hit, without value statistics.
    MapKey,
    /// N-gram map that tracks candidate continuations and gates on confidence.
    #[default]
    MapKeyValues,
}

impl DraftMode {
    /// Stable name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::MapKey => "map-key",
            Self::MapKeyValues => "map-key-values",
        }
    }
}

impl fmt::Display for DraftMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DraftMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "simple" | "ngram-simple" => Ok(Self::Simple),
            "map-key" | "ngram-map-k" => Ok(Self::MapKey),
            "map-key-values" | "ngram-map-k4v" => Ok(Self::MapKeyValues),
            other => Err(format!(
                "unknown draft mode '{other}' (expected simple, map-key or map-key-values)"
            )),
        }
    }
}

/// Drafter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DrafterConfig {
    /// Which drafter each slot gets.
    #[serde(default)]
    pub mode: DraftMode,

    /// Pattern-replay drafter settings.
    #[validate(nested)]
    #[serde(default)]
    pub simple: SimpleConfig,

    /// N-gram map settings.
    #[validate(nested)]
    #[serde(default)]
    pub map: MapConfig,
}

impl DrafterConfig {
    /// Create a config for the given mode with default parameters.
    pub fn with_mode(mode: DraftMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Whether the n-gram map runs without value statistics.
    pub fn key_only(&self) -> bool {
        self.mode == DraftMode::MapKey
    }

    /// Key length of the active drafter.
    pub fn key_len(&self) -> usize {
        match self.mode {
            DraftMode::Simple => self.simple.key_len,
            DraftMode::MapKey | DraftMode::MapKeyValues => self.map.key_len,
        }
    }

    /// Continuation length of the active drafter.
    pub fn continuation_len(&self) -> usize {
        match self.mode {
            DraftMode::Simple => self.simple.continuation_len,
            DraftMode::MapKey | DraftMode::MapKeyValues => self.map.continuation_len,
        }
    }
}

/// Pattern-replay drafter settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimpleConfig {
    /// Minimum number of new tokens between two lookups.
    #[validate(range(min = 1))]
    #[serde(default = "default_check_rate")]
    pub check_rate: usize,

    /// Length of the pattern searched for in the history (n).
    #[validate(range(min = 1, max = 256))]
    #[serde(default = "default_simple_key_len")]
    pub key_len: usize,

    /// Maximum number of tokens replayed after a match (m).
    #[validate(range(min = 1, max = 1024))]
    #[serde(default = "default_simple_continuation_len")]
    pub continuation_len: usize,
}

impl Default for SimpleConfig {
    fn default() -> Self {
        Self {
            check_rate: default_check_rate(),
            key_len: default_simple_key_len(),
            continuation_len: default_simple_continuation_len(),
        }
    }
}

impl SimpleConfig {
    /// Create a config with explicit lengths.
    pub fn new(key_len: usize, continuation_len: usize) -> Self {
        Self {
            key_len,
            continuation_len,
            ..Default::default()
        }
    }

    /// Set the check rate.
    pub fn with_check_rate(mut self, check_rate: usize) -> Self {
        self.check_rate = check_rate;
        self
    }
}

/// N-gram map settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MapConfig {
    /// Minimum number of new tokens between two lookups.
    #[validate(range(min = 1))]
    #[serde(default = "default_check_rate")]
    pub check_rate: usize,

    /// Key n-gram length (n).
    #[validate(range(min = 1, max = 256))]
    #[serde(default = "default_map_key_len")]
    pub key_len: usize,

    /// Value m-gram length (m), also the longest draft.
    #[validate(range(min = 1, max = 1024))]
    #[serde(default = "default_map_continuation_len")]
    pub continuation_len: usize,

    /// Key hits required before value statistics are consulted.
    #[validate(range(min = 1))]
    #[serde(default = "default_min_hits")]
    pub min_hits: u16,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            check_rate: default_check_rate(),
            key_len: default_map_key_len(),
            continuation_len: default_map_continuation_len(),
            min_hits: default_min_hits(),
        }
    }
}

impl MapConfig {
    /// Create a config with explicit lengths.
    pub fn new(key_len: usize, continuation_len: usize) -> Self {
        Self {
            key_len,
            continuation_len,
            ..Default::default()
        }
    }

    /// Set the check rate.
    pub fn with_check_rate(mut self, check_rate: usize) -> Self {
        self.check_rate = check_rate;
        self
    }

    /// Set the minimum number of key hits.
    pub fn with_min_hits(mut self, min_hits: u16) -> Self {
        self.min_hits = min_hits;
        self
    }
}

fn default_check_rate() -> usize {
    1
}

fn default_simple_key_len() -> usize {
    12
}

fn default_simple_continuation_len() -> usize {
    48
}

fn default_map_key_len() -> usize {
    4
}

fn default_map_continuation_len() -> usize {
    16
}

fn default_min_hits() -> u16 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("simple".parse::<DraftMode>().unwrap(), DraftMode::Simple);
        assert_eq!("map_key".parse::<DraftMode>().unwrap(), DraftMode::MapKey);
        assert_eq!("ngram-map-k4v".parse::<DraftMode>().unwrap(), DraftMode::MapKeyValues);
        assert!("medusa".parse::<DraftMode>().is_err());
    }

    #[test]
    fn test_mode_display_matches_serde() {
        for mode in [DraftMode::Simple, DraftMode::MapKey, DraftMode::MapKeyValues] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{mode}\""));
        }
    }

    #[test]
    fn test_active_lengths_follow_mode() {
        let mut config = DrafterConfig::with_mode(DraftMode::Simple);
        config.simple = SimpleConfig::new(3, 8);
        config.map = MapConfig::new(2, 5);
        assert_eq!((config.key_len(), config.continuation_len()), (3, 8));
        assert!(!config.key_only());

        config.mode = DraftMode::MapKey;
        assert_eq!((config.key_len(), config.continuation_len()), (2, 5));
        assert!(config.key_only());
    }

    #[test]
    fn test_defaults_validate() {
        assert!(DrafterConfig::default().validate().is_ok());
        let bad = SimpleConfig::new(0, 8);
        assert!(bad.validate().is_err());
    }
}
