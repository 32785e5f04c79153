//! Tracing setup and configuration.

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::MetricsError;

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level.
    pub level: Level,

    /// Log format.
    pub format: LogFormat,

    /// Enable span events.
    pub span_events: bool,

    /// Include the event target (module path).
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            span_events: false,
            with_target: true,
        }
    }
}

impl TracingConfig {
    /// Build from the textual level and format used in config files.
    ///
    /// Unknown values fall back to `info` and pretty output.
    pub fn from_names(level: &str, format: &str) -> Self {
        Self {
            level: level.parse().unwrap_or(Level::INFO),
            format: LogFormat::from_name(format),
            ..Default::default()
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format.
    Pretty,

    /// Compact format.
    Compact,

    /// JSON format.
    Json,
}

impl LogFormat {
    /// Parse from string.
    pub fn from_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Initialize tracing.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: TracingConfig) -> Result<(), MetricsError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_span_events(span_events)
                        .with_target(config.with_target)
                        .with_current_span(true),
                )
                .try_init()
                .map_err(|e| MetricsError::TracingError(e.to_string()))?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .compact()
                        .with_span_events(span_events)
                        .with_target(config.with_target),
                )
                .try_init()
                .map_err(|e| MetricsError::TracingError(e.to_string()))?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .pretty()
                        .with_span_events(span_events)
                        .with_target(config.with_target),
                )
                .try_init()
                .map_err(|e| MetricsError::TracingError(e.to_string()))?;
        }
    }

    Ok(())
}

/// Initialize tracing from `LOG_LEVEL` and `LOG_FORMAT`.
pub fn init_tracing_from_env() -> Result<(), MetricsError> {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    init_tracing(TracingConfig::from_names(&level, &format))
}
