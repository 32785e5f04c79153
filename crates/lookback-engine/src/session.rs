//! Per-slot drafting session.
//!
//! Wraps a [`Drafter`] with the bookkeeping a scheduler needs: feedback is
//! only forwarded for an outstanding draft and is clamped to its length,
//! and every step is counted in [`DraftStats`] and the prometheus metrics.

use lookback_config::DrafterConfig;
use lookback_core::{DraftTokens, Result, TokenId};
use serde::Serialize;
use tracing::warn;

use crate::drafter::{build_drafter, Drafter};

/// Drafting statistics for one or more sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DraftStats {
    /// Calls to `draft`.
    pub attempts: u64,
    /// Non-empty drafts.
    pub drafts: u64,
    /// Tokens proposed.
    pub tokens_drafted: u64,
    /// Proposed tokens the verifier confirmed.
    pub tokens_accepted: u64,
}

impl DraftStats {
    /// Fraction of drafted tokens that were accepted.
    pub fn acceptance_rate(&self) -> f64 {
        if self.tokens_drafted == 0 {
            return 0.0;
        }
        self.tokens_accepted as f64 / self.tokens_drafted as f64
    }

    /// Average length of a non-empty draft.
    pub fn mean_draft_len(&self) -> f64 {
        if self.drafts == 0 {
            return 0.0;
        }
        self.tokens_drafted as f64 / self.drafts as f64
    }

    /// Add another set of statistics to this one.
    pub fn merge(&mut self, other: &DraftStats) {
        self.attempts += other.attempts;
        self.drafts += other.drafts;
        self.tokens_drafted += other.tokens_drafted;
        self.tokens_accepted += other.tokens_accepted;
    }
}

/// Drafting state of one generation slot.
pub struct DraftSession {
    drafter: Box<dyn Drafter>,
    /// Length of the draft awaiting verification.
    outstanding: Option<usize>,
    stats: DraftStats,
}

impl DraftSession {
    /// Wrap an existing drafter.
    pub fn new(drafter: Box<dyn Drafter>) -> Self {
        Self {
            drafter,
            outstanding: None,
            stats: DraftStats::default(),
        }
    }

    /// Create a session with the drafter selected by `config`.
    pub fn from_config(config: &DrafterConfig) -> Result<Self> {
        Ok(Self::new(build_drafter(config)?))
    }

    /// Propose tokens to follow `sampled`.
    pub fn draft(&mut self, history: &[TokenId], sampled: TokenId) -> DraftTokens {
        let name = self.drafter.name();
        let draft = self.drafter.draft(history, sampled);

        self.stats.attempts += 1;
        lookback_metrics::record_draft_attempt(name);

        if draft.is_empty() {
            self.outstanding = None;
        } else {
            self.outstanding = Some(draft.len());
            self.stats.drafts += 1;
            self.stats.tokens_drafted += draft.len() as u64;
            lookback_metrics::record_draft(name, draft.len());
            lookback_metrics::observe_draft_length(name, draft.len());
        }

        draft
    }

    /// Report how many tokens of the last draft the verifier accepted.
    ///
    /// Feedback without an outstanding draft is ignored. Counts above the
    /// draft length are clamped.
    pub fn accept(&mut self, accepted: usize) {
        let Some(drafted) = self.outstanding.take() else {
            return;
        };

        let accepted = if accepted > drafted {
            warn!(accepted, drafted, "accepted count exceeds draft length");
            drafted
        } else {
            accepted
        };

        self.stats.tokens_accepted += accepted as u64;
        let name = self.drafter.name();
        lookback_metrics::record_accepted(name, accepted);
        lookback_metrics::observe_accepted_length(name, accepted);

        self.drafter.accept(accepted);
    }

    /// Restart for a new sequence. Statistics are kept.
    pub fn reset(&mut self) {
        self.drafter.reset();
        self.outstanding = None;
    }

    /// Length of the draft awaiting feedback.
    pub fn outstanding(&self) -> Option<usize> {
        self.outstanding
    }

    /// Get statistics.
    pub fn stats(&self) -> &DraftStats {
        &self.stats
    }

    /// Name of the wrapped drafter.
    pub fn name(&self) -> &'static str {
        self.drafter.name()
    }
}

impl std::fmt::Debug for DraftSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftSession")
            .field("drafter", &self.drafter.name())
            .field("outstanding", &self.outstanding)
            .field("stats", &self.stats)
            .finish()
    }
}
