//! Configuration error types.

use thiserror::Error;
use validator::ValidationErrors;

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Validation error.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error.
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid value.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Unsupported format.
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        let messages: Vec<String> = validation_messages(&errors)
            .into_iter()
            .map(|(path, message)| format!("{}: {}", path, message))
            .collect();
        ConfigError::ValidationError(messages.join("; "))
    }
}

/// Flatten nested validator errors into `(path, message)` pairs, sorted by
/// path. Nested fields are joined with dots, e.g. `drafter.map.key_len`.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<(String, String)> {
    let mut out = Vec::new();
    collect_messages(errors, "", &mut out);
    out.sort();
    out
}

fn collect_messages(errors: &ValidationErrors, prefix: &str, out: &mut Vec<(String, String)>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let msgs: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("validation failed for {}", e.code))
                    })
                    .collect();
                out.push((path, msgs.join(", ")));
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect_messages(inner, &format!("{path}[{idx}]"), out);
                }
            }
        }
    }
}

impl ConfigError {
    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ConfigError> for lookback_core::Error {
    fn from(err: ConfigError) -> Self {
        lookback_core::Error::config_with_source("invalid drafter configuration", err)
    }
}
