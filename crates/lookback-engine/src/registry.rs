//! Slot registry.
//!
//! Owns one [`DraftSession`] per active generation slot. Sessions are
//! created when a sequence starts and dropped when it ends; their
//! statistics are folded into a running total.

use std::collections::HashMap;

use lookback_config::{ConfigLoader, DrafterConfig};
use lookback_core::{DraftTokens, Error, Result, SlotId, TokenId};
use lookback_metrics::draft_span;
use tracing::{debug, warn};

use crate::session::{DraftSession, DraftStats};

/// Drafting sessions keyed by generation slot.
#[derive(Debug)]
pub struct SlotRegistry {
    config: DrafterConfig,
    sessions: HashMap<SlotId, DraftSession>,
    /// Statistics of sessions that have ended.
    finished: DraftStats,
}

impl SlotRegistry {
    /// Create an empty registry. Every slot gets a drafter built from
    /// `config`.
    pub fn new(config: DrafterConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            finished: DraftStats::default(),
        }
    }

    /// Create a registry from a configuration file, with `LOOKBACK_*`
    /// environment overrides applied.
    pub fn from_config_file(path: &str) -> Result<Self> {
        let config = ConfigLoader::new()
            .with_file(path)
            .with_env_prefix("LOOKBACK")
            .load()?;
        Ok(Self::new(config.drafter))
    }

    /// Start drafting for a new sequence.
    pub fn start(&mut self, slot: SlotId) -> Result<()> {
        if self.sessions.contains_key(&slot) {
            return Err(Error::slot_exists(slot));
        }

        let session = DraftSession::from_config(&self.config).map_err(|err| {
            warn!(%slot, code = err.error_code(), error = %err, "slot start failed");
            err
        })?;
        debug!(%slot, drafter = session.name(), "slot started");
        self.sessions.insert(slot, session);
        Ok(())
    }

    /// Stop drafting for a sequence and return its statistics.
    pub fn end(&mut self, slot: SlotId) -> Result<DraftStats> {
        let session = self
            .sessions
            .remove(&slot)
            .ok_or_else(|| Error::slot_not_found(slot))?;

        let stats = *session.stats();
        self.finished.merge(&stats);
        debug!(
            %slot,
            drafts = stats.drafts,
            acceptance_rate = stats.acceptance_rate(),
            "slot ended"
        );
        Ok(stats)
    }

    /// Get the session of a slot.
    pub fn get_mut(&mut self, slot: SlotId) -> Result<&mut DraftSession> {
        self.sessions
            .get_mut(&slot)
            .ok_or_else(|| Error::slot_not_found(slot))
    }

    /// Draft for a slot.
    pub fn draft(&mut self, slot: SlotId, history: &[TokenId], sampled: TokenId) -> Result<DraftTokens> {
        let session = self.get_mut(slot)?;
        let span = draft_span!(slot, session.name());
        let _enter = span.enter();
        Ok(session.draft(history, sampled))
    }

    /// Forward verifier feedback for a slot.
    pub fn accept(&mut self, slot: SlotId, accepted: usize) -> Result<()> {
        self.get_mut(slot)?.accept(accepted);
        Ok(())
    }

    /// Number of active slots.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no slot is active.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Active slots, in ascending order.
    pub fn active_slots(&self) -> Vec<SlotId> {
        let mut slots: Vec<_> = self.sessions.keys().copied().collect();
        slots.sort_unstable();
        slots
    }

    /// Statistics of all sessions, active and ended.
    pub fn aggregate_stats(&self) -> DraftStats {
        let mut total = self.finished;
        for session in self.sessions.values() {
            total.merge(session.stats());
        }
        total
    }

    /// Get config.
    pub fn config(&self) -> &DrafterConfig {
        &self.config
    }
}
