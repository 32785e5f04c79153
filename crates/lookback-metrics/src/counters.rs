//! Counter metrics.

use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

use crate::MetricsError;

/// Draft attempts, including throttled and rejected ones.
static DRAFT_ATTEMPTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Non-empty drafts handed to the verifier.
static DRAFTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Tokens proposed across all drafts.
static DRAFTED_TOKENS: OnceLock<IntCounterVec> = OnceLock::new();

/// Tokens confirmed by the verifier.
static ACCEPTED_TOKENS: OnceLock<IntCounterVec> = OnceLock::new();

fn register_vec(
    registry: &Registry,
    cell: &OnceLock<IntCounterVec>,
    name: &str,
    help: &str,
) -> Result<(), MetricsError> {
    let counter = IntCounterVec::new(Opts::new(name, help), &["drafter"])?;
    registry.register(Box::new(counter.clone()))?;
    cell.set(counter)
        .map_err(|_| MetricsError::AlreadyInitialized)
}

/// Initialize counters.
pub(crate) fn init_counters(registry: &Registry) -> Result<(), MetricsError> {
    register_vec(
        registry,
        &DRAFT_ATTEMPTS,
        "lookback_draft_attempts_total",
        "Draft attempts",
    )?;
    register_vec(registry, &DRAFTS, "lookback_drafts_total", "Non-empty drafts")?;
    register_vec(
        registry,
        &DRAFTED_TOKENS,
        "lookback_drafted_tokens_total",
        "Tokens proposed for verification",
    )?;
    register_vec(
        registry,
        &ACCEPTED_TOKENS,
        "lookback_accepted_tokens_total",
        "Drafted tokens confirmed by the verifier",
    )?;

    Ok(())
}

/// Increment the attempt counter.
pub fn record_draft_attempt(drafter: &str) {
    if let Some(counter) = DRAFT_ATTEMPTS.get() {
        counter.with_label_values(&[drafter]).inc();
    }
}

/// Record a non-empty draft of `len` tokens.
pub fn record_draft(drafter: &str, len: usize) {
    if let Some(counter) = DRAFTS.get() {
        counter.with_label_values(&[drafter]).inc();
    }
    if let Some(counter) = DRAFTED_TOKENS.get() {
        counter.with_label_values(&[drafter]).inc_by(len as u64);
    }
}

/// Record verifier acceptance.
pub fn record_accepted(drafter: &str, accepted: usize) {
    if let Some(counter) = ACCEPTED_TOKENS.get() {
        counter.with_label_values(&[drafter]).inc_by(accepted as u64);
    }
}

/// Get current drafted token count.
pub fn get_drafted_tokens(drafter: &str) -> u64 {
    DRAFTED_TOKENS
        .get()
        .map(|c| c.with_label_values(&[drafter]).get())
        .unwrap_or(0)
}

/// Get current accepted token count.
pub fn get_accepted_tokens(drafter: &str) -> u64 {
    ACCEPTED_TOKENS
        .get()
        .map(|c| c.with_label_values(&[drafter]).get())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let _ = crate::init_metrics();

        let before_drafted = get_drafted_tokens("counter-test");
        let before_accepted = get_accepted_tokens("counter-test");

        record_draft("counter-test", 4);
        record_draft("counter-test", 2);
        record_accepted("counter-test", 3);

        assert_eq!(get_drafted_tokens("counter-test"), before_drafted + 6);
        assert_eq!(get_accepted_tokens("counter-test"), before_accepted + 3);
    }
}
