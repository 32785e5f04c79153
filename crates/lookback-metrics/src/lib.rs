//! Lookback Metrics and Observability.
//!
//! Tracing setup plus prometheus counters and histograms describing draft
//! attempts, draft lengths and verifier acceptance per drafter.
//!
//! # Example
//!
//! ```rust,ignore
//! use lookback_metrics::{export_prometheus, init_metrics};
//!
//! init_metrics()?;
//! lookback_metrics::record_draft("map-key-values", 6);
//! println!("{}", export_prometheus()?);
//! ```

pub mod counters;
pub mod histograms;
pub mod tracing_setup;

pub use counters::*;
pub use histograms::*;
pub use tracing_setup::{init_tracing, LogFormat, TracingConfig};

use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::{Mutex, OnceLock};
use thiserror::Error;

/// Registry holding every lookback metric.
static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Serializes initialization so the registry is set exactly once.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Metrics error.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Metrics already initialized")]
    AlreadyInitialized,

    #[error("Metrics not initialized")]
    NotInitialized,

    #[error("Prometheus error: {0}")]
    PrometheusError(#[from] prometheus::Error),

    #[error("Tracing error: {0}")]
    TracingError(String),
}

/// Create and register all metrics.
///
/// Recording functions are no-ops until this has run.
pub fn init_metrics() -> Result<(), MetricsError> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if REGISTRY.get().is_some() {
        return Err(MetricsError::AlreadyInitialized);
    }

    let registry = Registry::new();
    counters::init_counters(&registry)?;
    histograms::init_histograms(&registry)?;

    REGISTRY
        .set(registry)
        .map_err(|_| MetricsError::AlreadyInitialized)
}

/// Whether [`init_metrics`] has completed.
pub fn metrics_enabled() -> bool {
    REGISTRY.get().is_some()
}

/// Export metrics in Prometheus text format.
pub fn export_prometheus() -> Result<String, MetricsError> {
    let registry = REGISTRY.get().ok_or(MetricsError::NotInitialized)?;
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Create a span covering one drafting call for a slot.
#[macro_export]
macro_rules! draft_span {
    ($slot:expr, $drafter:expr) => {
        tracing::debug_span!(
            "draft",
            slot = %$slot,
            drafter = $drafter,
        )
    };
}
