//! Error types for lookback.
//!
//! Drafting itself never fails: every rejection is an empty draft. The
//! variants here cover construction, slot bookkeeping and validation.

use thiserror::Error;

use crate::types::SlotId;

/// Specialized Result type for lookback operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for lookback operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config {
        /// Detailed error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Parameter validation errors
    #[error("Validation error: {message}")]
    Validation {
        /// Detailed error message
        message: String,
        /// Field that failed validation
        field: Option<String>,
    },

    /// No drafting session is registered for the slot
    #[error("Slot not found: {slot}")]
    SlotNotFound {
        /// The slot that was looked up
        slot: SlotId,
    },

    /// A drafting session is already registered for the slot
    #[error("Slot already active: {slot}")]
    SlotExists {
        /// The slot that was started twice
        slot: SlotId,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error with field
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a slot-not-found error
    pub fn slot_not_found(slot: SlotId) -> Self {
        Self::SlotNotFound { slot }
    }

    /// Create a slot-exists error
    pub fn slot_exists(slot: SlotId) -> Self {
        Self::SlotExists { slot }
    }

    /// Get the error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "CONFIG_ERROR",
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::SlotNotFound { .. } => "SLOT_NOT_FOUND",
            Error::SlotExists { .. } => "SLOT_EXISTS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("bad key length");
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert_eq!(err.to_string(), "Configuration error: bad key length");
    }

    #[test]
    fn test_slot_errors() {
        let err = Error::slot_not_found(SlotId::new(4));
        assert_eq!(err.error_code(), "SLOT_NOT_FOUND");
        assert_eq!(err.to_string(), "Slot not found: slot_4");

        let err = Error::slot_exists(SlotId::new(4));
        assert_eq!(err.to_string(), "Slot already active: slot_4");
    }

    #[test]
    fn test_validation_field() {
        match Error::validation_field("must be at least 1", "key_len") {
            Error::Validation { field, .. } => assert_eq!(field.as_deref(), Some("key_len")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_config_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = Error::config_with_source("could not build drafter", io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
