//! Histogram metrics.

use prometheus::{HistogramOpts, HistogramVec, Registry};
use std::sync::OnceLock;

use crate::MetricsError;

/// Length of non-empty drafts.
static DRAFT_LENGTH: OnceLock<HistogramVec> = OnceLock::new();

/// Accepted prefix length per verified draft.
static ACCEPTED_LENGTH: OnceLock<HistogramVec> = OnceLock::new();

/// Token-count buckets shared by both histograms.
pub const TOKEN_COUNT_BUCKETS: &[f64] = &[0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0];

/// Initialize histograms.
pub(crate) fn init_histograms(registry: &Registry) -> Result<(), MetricsError> {
    let draft_length = HistogramVec::new(
        HistogramOpts::new("lookback_draft_length", "Tokens per non-empty draft")
            .buckets(TOKEN_COUNT_BUCKETS.to_vec()),
        &["drafter"],
    )?;
    registry.register(Box::new(draft_length.clone()))?;
    DRAFT_LENGTH
        .set(draft_length)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    let accepted_length = HistogramVec::new(
        HistogramOpts::new("lookback_accepted_length", "Accepted tokens per verified draft")
            .buckets(TOKEN_COUNT_BUCKETS.to_vec()),
        &["drafter"],
    )?;
    registry.register(Box::new(accepted_length.clone()))?;
    ACCEPTED_LENGTH
        .set(accepted_length)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// Record the length of a draft.
pub fn observe_draft_length(drafter: &str, len: usize) {
    if let Some(hist) = DRAFT_LENGTH.get() {
        hist.with_label_values(&[drafter]).observe(len as f64);
    }
}

/// Record how many drafted tokens were accepted.
pub fn observe_accepted_length(drafter: &str, accepted: usize) {
    if let Some(hist) = ACCEPTED_LENGTH.get() {
        hist.with_label_values(&[drafter]).observe(accepted as f64);
    }
}
