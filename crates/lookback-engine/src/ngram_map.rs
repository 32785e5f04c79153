//! # N-gram Map
//!
//! Per-slot statistical cache. Every key n-gram that recurs in the history
//! gets a [`KeyEntry`] holding up to `SLOTS` candidate continuations
//! (m-grams) and how often each followed the key. A draft is only proposed
//! when one continuation clearly dominates the others.
//!
//! ## Lookup
//!
//! 1. Build the key from the last `n - 1` history tokens plus the sampled token
//! 2. Find its most recent earlier occurrence (`match_pos`)
//! 3. Resolve or create the key entry and count the hit
//! 4. Fold occurrences since the previous scan into the value slots
//! 5. Draft if the best slot has at least three times the other counts
//!
//! The drafted tokens are always the ones following `match_pos`, whichever
//! slot won the vote; the winning slot only decides the draft length and
//! which entry receives accept feedback.
//!
//! ## Key-only mode
//!
//! Skips steps 4 and 5: every key hit drafts. Feedback is discarded in this
//! mode, so drafts always have the full continuation length.

use lookback_config::MapConfig;
use lookback_core::{DraftTokens, TokenId, TokenSpan, COUNT_CAP, DEFAULT_VALUE_SLOTS};
use tracing::{debug, trace};

use crate::search::{copy_draft, matches_at, rfind_pattern, trailing_key, window, windows_equal};

/// Increment a counter, stopping at [`COUNT_CAP`].
#[inline]
fn bump(count: &mut u16) {
    if *count < COUNT_CAP {
        *count += 1;
    }
}

/// One candidate continuation of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueEntry {
    /// Start of a representative occurrence in the history; `None` marks a
    /// free slot.
    pub continuation_anchor: Option<usize>,
    /// Times the continuation was seen after the one that claimed the slot.
    pub occurrence_count: u16,
    /// Draft length to use when this slot wins, updated by accept feedback.
    pub accepted_length: usize,
}

impl ValueEntry {
    fn empty(continuation_len: usize) -> Self {
        Self {
            continuation_anchor: None,
            occurrence_count: 0,
            accepted_length: continuation_len,
        }
    }

    /// Whether the slot holds a continuation.
    pub fn is_occupied(&self) -> bool {
        self.continuation_anchor.is_some()
    }
}

/// Statistics for one distinct key n-gram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry<const SLOTS: usize = DEFAULT_VALUE_SLOTS> {
    /// Position of an occurrence of the key; the key's content is read
    /// from the history at this position.
    pub anchor_position: usize,
    /// `match_pos` of the last refresh; the next refresh resumes there.
    pub scan_progress: Option<usize>,
    /// Number of lookups that resolved to this key.
    pub hit_count: u16,
    /// Candidate continuations, first come first served.
    pub values: [ValueEntry; SLOTS],
}

impl<const SLOTS: usize> KeyEntry<SLOTS> {
    fn new(anchor_position: usize, continuation_len: usize) -> Self {
        Self {
            anchor_position,
            scan_progress: None,
            hit_count: 0,
            values: [ValueEntry::empty(continuation_len); SLOTS],
        }
    }

    /// Fold every occurrence of `key` from the previous `match_pos` through
    /// the current one (both inclusive) into the value slots.
    ///
    /// The occurrence at the previous `match_pos` is counted again.
    fn refresh(&mut self, history: &[TokenId], key: &[TokenId], match_pos: usize, m: usize) {
        let n = key.len();
        let start = self.scan_progress.unwrap_or(0);

        for i in start..=match_pos {
            if !matches_at(history, i, key) {
                continue;
            }
            let value_start = i + n;
            if window(history, value_start, m).is_none() {
                continue;
            }

            let known = self.values.iter_mut().find(|v| {
                v.continuation_anchor
                    .is_some_and(|anchor| windows_equal(history, anchor, value_start, m))
            });
            if let Some(value) = known {
                bump(&mut value.occurrence_count);
                continue;
            }

            // Full slot arrays drop new continuations
            if let Some(free) = self.values.iter_mut().find(|v| !v.is_occupied()) {
                free.continuation_anchor = Some(value_start);
                free.occurrence_count = 0;
            }
        }

        self.scan_progress = Some(match_pos);
    }

    /// Index of the first slot with the strictly greatest count, and the
    /// sum of all other counts.
    fn select(&self) -> (usize, u32) {
        let mut best = 0;
        for (idx, value) in self.values.iter().enumerate().skip(1) {
            if value.occurrence_count > self.values[best].occurrence_count {
                best = idx;
            }
        }
        let total: u32 = self.values.iter().map(|v| u32::from(v.occurrence_count)).sum();
        (best, total - u32::from(self.values[best].occurrence_count))
    }
}

/// Where the last successful statistical draft came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDraft {
    /// Index into the key table.
    pub key_index: usize,
    /// Winning value slot.
    pub value_slot: usize,
}

/// Statistical n-gram cache for one generation slot.
///
/// `SLOTS` is the number of candidate continuations tracked per key. Once
/// a key has `SLOTS` distinct continuations, later ones are never
/// represented. The key table only grows; use [`NgramMap::key_count`] to
/// watch it and [`NgramMap::reset`] when reusing the slot.
///
/// A draft cut short by feedback keeps its length: after `accept(0)` the
/// winning slot drafts zero tokens until a different slot wins.
#[derive(Debug, Clone)]
pub struct NgramMap<const SLOTS: usize = DEFAULT_VALUE_SLOTS> {
    config: MapConfig,
    key_only: bool,
    /// History length at the last lookup.
    last_checked: usize,
    keys: Vec<KeyEntry<SLOTS>>,
    pending: Option<PendingDraft>,
}

impl NgramMap {
    /// Create a map with the default slot capacity.
    pub fn new(config: MapConfig, key_only: bool) -> Self {
        Self::with_slot_capacity(config, key_only)
    }
}

impl<const SLOTS: usize> NgramMap<SLOTS> {
    const HAS_SLOTS: () = assert!(SLOTS > 0, "an n-gram map needs at least one value slot");

    /// Create a map tracking `SLOTS` continuations per key.
    pub fn with_slot_capacity(config: MapConfig, key_only: bool) -> Self {
        let () = Self::HAS_SLOTS;
        Self {
            config,
            key_only,
            last_checked: 0,
            keys: Vec::new(),
            pending: None,
        }
    }

    /// Propose tokens to follow `sampled`.
    ///
    /// Any previous draft stops being eligible for feedback as soon as this
    /// is called.
    pub fn draft(&mut self, history: &[TokenId], sampled: TokenId) -> DraftTokens {
        self.pending = None;

        let cur_len = history.len();
        let n = self.config.key_len;
        let m = self.config.continuation_len;

        if cur_len < 2 * n + m {
            trace!(cur_len, "history too short");
            return DraftTokens::new();
        }

        if cur_len < self.last_checked.saturating_add(self.config.check_rate) {
            trace!(cur_len, last_checked = self.last_checked, "throttled");
            return DraftTokens::new();
        }
        self.last_checked = cur_len;

        let Some(key) = trailing_key(history, sampled, n) else {
            return DraftTokens::new();
        };

        // Leave room for a full continuation and one more token after it
        let Some(last_start) = cur_len.checked_sub(n + m + 1) else {
            return DraftTokens::new();
        };
        let Some(match_pos) = rfind_pattern(history, &key, last_start) else {
            return DraftTokens::new();
        };

        let key_index = self.resolve_key(history, &key, match_pos);
        let entry = &mut self.keys[key_index];
        bump(&mut entry.hit_count);

        if self.key_only {
            let len = m.min(entry.values[0].accepted_length);
            debug!(
                match_pos,
                key_index,
                hits = entry.hit_count,
                draft_len = len,
                "key hit"
            );
            return copy_draft(history, match_pos + n, len);
        }

        if entry.hit_count < self.config.min_hits {
            trace!(key_index, hits = entry.hit_count, "not enough key hits");
            return DraftTokens::new();
        }

        entry.refresh(history, &key, match_pos, m);

        for (slot, value) in entry.values.iter().enumerate() {
            if let Some(anchor) = value.continuation_anchor {
                debug!(
                    key_index,
                    slot,
                    count = value.occurrence_count,
                    accepted = value.accepted_length,
                    continuation = %TokenSpan::window(history, anchor, m),
                    "value slot"
                );
            }
        }

        let (best, sum_other) = entry.select();
        let best_count = u32::from(entry.values[best].occurrence_count);
        if sum_other > 0 && best_count < 3 * sum_other {
            debug!(key_index, best, best_count, sum_other, "low confidence");
            return DraftTokens::new();
        }

        let len = m.min(entry.values[best].accepted_length);
        debug!(
            match_pos,
            key_index,
            best,
            best_count,
            sum_other,
            draft_len = len,
            "confident match"
        );

        self.pending = Some(PendingDraft {
            key_index,
            value_slot: best,
        });
        copy_draft(history, match_pos + n, len)
    }

    /// Record how many tokens of the last draft were accepted.
    ///
    /// Ignored when the last call to [`NgramMap::draft`] produced no
    /// statistical draft.
    pub fn accept(&mut self, accepted: usize) {
        let Some(pending) = self.pending else {
            return;
        };
        if let Some(value) = self
            .keys
            .get_mut(pending.key_index)
            .and_then(|entry| entry.values.get_mut(pending.value_slot))
        {
            trace!(
                key_index = pending.key_index,
                slot = pending.value_slot,
                accepted,
                "accept feedback"
            );
            value.accepted_length = accepted;
        }
    }

    /// Index of the entry whose anchored key equals `key`, appending a new
    /// entry anchored at `match_pos` if there is none.
    fn resolve_key(&mut self, history: &[TokenId], key: &[TokenId], match_pos: usize) -> usize {
        if let Some(idx) = self
            .keys
            .iter()
            .position(|entry| matches_at(history, entry.anchor_position, key))
        {
            return idx;
        }

        self.keys
            .push(KeyEntry::new(match_pos, self.config.continuation_len));
        self.keys.len() - 1
    }

    /// Drop all statistics, e.g. when the slot is reused.
    pub fn reset(&mut self) {
        self.keys.clear();
        self.pending = None;
        self.last_checked = 0;
    }

    /// Key table.
    pub fn keys(&self) -> &[KeyEntry<SLOTS>] {
        &self.keys
    }

    /// Number of distinct keys seen.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Draft that `accept` would currently update.
    pub fn pending_draft(&self) -> Option<PendingDraft> {
        self.pending
    }

    /// History length at the last lookup.
    pub fn last_checked(&self) -> usize {
        self.last_checked
    }

    /// Whether value statistics are skipped.
    pub fn is_key_only(&self) -> bool {
        self.key_only
    }

    /// Get config.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const K: TokenId = 100;
    const A: TokenId = 1;
    const B: TokenId = 2;

    fn map(n: usize, m: usize, min_hits: u16) -> NgramMap {
        NgramMap::new(MapConfig::new(n, m).with_min_hits(min_hits), false)
    }

    /// `[F0, K, x0, F1, K, x1, F2, ...]` with unique fillers, so every
    /// occurrence of `K` is followed by the given continuation token.
    fn voting_history(continuations: &[TokenId]) -> Vec<TokenId> {
        let mut history = vec![999];
        for (i, &x) in continuations.iter().enumerate() {
            history.extend([K, x, 1000 + i as TokenId]);
        }
        history
    }

    fn votes(a: usize, b: usize) -> Vec<TokenId> {
        let mut v = vec![A; a];
        v.extend(std::iter::repeat(B).take(b));
        v
    }

    #[test]
    fn test_end_to_end_draft() {
        let mut map = map(3, 2, 1);
        let history = [9, 1, 2, 3, 4, 5, 6, 7, 1, 2];
        assert_eq!(map.draft(&history, 3).as_slice(), &[4, 5]);
        assert_eq!(
            map.pending_draft(),
            Some(PendingDraft {
                key_index: 0,
                value_slot: 0
            })
        );

        let entry = &map.keys()[0];
        assert_eq!(entry.anchor_position, 1);
        assert_eq!(entry.hit_count, 1);
        assert_eq!(entry.scan_progress, Some(1));
        assert_eq!(entry.values[0].continuation_anchor, Some(4));
        assert_eq!(entry.values[0].occurrence_count, 0);
        assert!(!entry.values[1].is_occupied());
    }

    #[test]
    fn test_only_occurrence_at_position_zero() {
        let mut map = map(3, 2, 1);
        let history = [1, 2, 3, 4, 5, 6, 7, 8, 1, 2];
        assert!(map.draft(&history, 3).is_empty());
        assert_eq!(map.key_count(), 0);
        assert_eq!(map.pending_draft(), None);
    }

    #[test]
    fn test_feedback_shortens_next_draft() {
        let mut map = map(3, 2, 1);
        let history = [9, 1, 2, 3, 4, 5, 6, 7, 1, 2];
        map.draft(&history, 3);
        map.accept(1);

        let history = [9, 1, 2, 3, 4, 5, 6, 7, 1, 2, 3, 4, 1, 2];
        // Match at 8; the rescan of 1 gives slot 0 a count, [4, 1] takes slot 1
        assert_eq!(map.draft(&history, 3).as_slice(), &[4]);

        let entry = &map.keys()[0];
        assert_eq!(map.key_count(), 1);
        assert_eq!(entry.hit_count, 2);
        assert_eq!(entry.scan_progress, Some(8));
        assert_eq!(entry.values[1].continuation_anchor, Some(11));
        assert_eq!(entry.values[0].accepted_length, 1);
    }

    #[test]
    fn test_key_only_mode() {
        let mut map = NgramMap::new(MapConfig::new(3, 2).with_min_hits(5), true);
        let history = [9, 1, 2, 3, 4, 5, 6, 7, 1, 2];
        // min_hits does not apply
        assert_eq!(map.draft(&history, 3).as_slice(), &[4, 5]);
        assert_eq!(map.pending_draft(), None);
        assert!(map.keys()[0].values.iter().all(|v| !v.is_occupied()));

        // Feedback is discarded
        map.accept(0);
        assert_eq!(map.keys()[0].values[0].accepted_length, 2);
    }

    #[test]
    fn test_gate_passes_at_three_to_one() {
        let mut map = map(1, 1, 1);
        let history = voting_history(&votes(10, 4));
        // Most recent continuation is B, whichever slot wins
        assert_eq!(map.draft(&history, K).as_slice(), &[B]);

        let entry = &map.keys()[0];
        assert_eq!(entry.values[0].occurrence_count, 9);
        assert_eq!(entry.values[1].occurrence_count, 3);
        assert_eq!(
            map.pending_draft(),
            Some(PendingDraft {
                key_index: 0,
                value_slot: 0
            })
        );
    }

    #[test]
    fn test_gate_rejects_below_three_to_one() {
        let mut map = map(1, 1, 1);
        let history = voting_history(&votes(9, 4));
        assert!(map.draft(&history, K).is_empty());

        let entry = &map.keys()[0];
        assert_eq!(entry.values[0].occurrence_count, 8);
        assert_eq!(entry.values[1].occurrence_count, 3);
        assert_eq!(map.pending_draft(), None);
    }

    #[test]
    fn test_gate_single_slot() {
        let mut map = map(1, 1, 1);
        let history = voting_history(&votes(2, 0));
        assert_eq!(map.draft(&history, K).as_slice(), &[A]);
        assert_eq!(map.keys()[0].values[0].occurrence_count, 1);
    }

    #[test]
    fn test_tie_goes_to_lowest_slot() {
        let entry = KeyEntry::<4> {
            anchor_position: 1,
            scan_progress: None,
            hit_count: 1,
            values: [
                ValueEntry {
                    continuation_anchor: Some(2),
                    occurrence_count: 2,
                    accepted_length: 4,
                },
                ValueEntry {
                    continuation_anchor: Some(5),
                    occurrence_count: 5,
                    accepted_length: 4,
                },
                ValueEntry {
                    continuation_anchor: Some(8),
                    occurrence_count: 5,
                    accepted_length: 4,
                },
                ValueEntry::empty(4),
            ],
        };
        assert_eq!(entry.select(), (1, 7));
    }

    #[test]
    fn test_min_hits_gate() {
        let mut map = map(1, 1, 2);
        let mut history = voting_history(&votes(3, 0));
        assert!(map.draft(&history, K).is_empty());
        assert_eq!(map.keys()[0].hit_count, 1);
        assert_eq!(map.keys()[0].scan_progress, None);

        history.extend([K, A, 5000]);
        assert_eq!(map.draft(&history, K).as_slice(), &[A]);
        assert_eq!(map.keys()[0].hit_count, 2);
    }

    #[test]
    fn test_refresh_resumes_at_last_match() {
        let mut map = map(1, 1, 1);
        let mut history = voting_history(&votes(3, 0));
        map.draft(&history, K);
        assert_eq!(map.keys()[0].values[0].occurrence_count, 2);
        assert_eq!(map.keys()[0].scan_progress, Some(7));

        history.extend([K, A, 5000]);
        map.draft(&history, K);
        // Scans 7..=10: the previous match at 7 and the new one at 10
        assert_eq!(map.keys()[0].values[0].occurrence_count, 4);
        assert_eq!(map.keys()[0].scan_progress, Some(10));
    }

    #[test]
    fn test_resumed_scan_shifts_the_vote() {
        let mut map = map(1, 1, 1);
        // A A B: counts (1, 0) after the first refresh
        let mut history = voting_history(&[A, A, B]);
        assert_eq!(map.draft(&history, K).as_slice(), &[B]);
        assert_eq!(map.keys()[0].values[1].occurrence_count, 0);

        // The B at the previous match is folded in again: (1, 2) rejects
        history.extend([K, B, 5000]);
        assert!(map.draft(&history, K).is_empty());
        assert_eq!(map.keys()[0].values[0].occurrence_count, 1);
        assert_eq!(map.keys()[0].values[1].occurrence_count, 2);
    }

    #[test]
    fn test_full_slots_drop_new_continuations() {
        let mut map = NgramMap::<2>::with_slot_capacity(MapConfig::new(1, 1).with_min_hits(1), false);
        let history = voting_history(&[A, B, 3, 3, 3, 3, 3, 3, A]);
        assert_eq!(map.draft(&history, K).as_slice(), &[A]);

        let entry = &map.keys()[0];
        assert_eq!(entry.values[0].continuation_anchor, Some(2));
        assert_eq!(entry.values[0].occurrence_count, 1);
        assert_eq!(entry.values[1].continuation_anchor, Some(5));
        assert_eq!(entry.values[1].occurrence_count, 0);
    }

    #[test]
    fn test_accept_isolation() {
        let mut map = map(3, 2, 1);
        let history = [9, 1, 2, 3, 4, 5, 6, 7, 1, 2];
        map.draft(&history, 3);

        map.accept(1);
        map.accept(2);
        assert_eq!(map.keys()[0].values[0].accepted_length, 2);

        // A rejected lookup clears the pending draft
        let short = [1, 2];
        assert!(map.draft(&short, 3).is_empty());
        map.accept(0);
        assert_eq!(map.keys()[0].values[0].accepted_length, 2);
    }

    #[test]
    fn test_accept_targets_latest_key() {
        let mut map = map(1, 1, 1);
        let mut history = vec![999, 100, 1, 200, 2, 5, 6];
        assert_eq!(map.draft(&history, 100).as_slice(), &[1]);
        assert_eq!(map.pending_draft().map(|p| p.key_index), Some(0));

        history.extend([100, 1, 7]);
        assert_eq!(map.draft(&history, 200).as_slice(), &[2]);
        assert_eq!(
            map.pending_draft(),
            Some(PendingDraft {
                key_index: 1,
                value_slot: 0
            })
        );

        map.accept(0);
        assert_eq!(map.keys()[1].values[0].accepted_length, 0);
        assert_eq!(map.keys()[0].values[0].accepted_length, 1);
    }

    #[test]
    fn test_accept_before_draft() {
        let mut map = map(3, 2, 1);
        map.accept(7);
        assert_eq!(map.key_count(), 0);
    }

    #[test]
    fn test_zero_accepted_length_drafts_nothing() {
        let mut map = map(3, 2, 1);
        let history = [9, 1, 2, 3, 4, 5, 6, 7, 1, 2];
        map.draft(&history, 3);
        map.accept(0);

        let history = [9, 1, 2, 3, 4, 5, 6, 7, 1, 2, 3, 4, 1, 2];
        assert!(map.draft(&history, 3).is_empty());
        assert!(map.pending_draft().is_some());
    }

    #[test]
    fn test_throttle_leaves_keys_untouched() {
        let mut map = NgramMap::new(MapConfig::new(1, 1).with_min_hits(1).with_check_rate(4), false);
        let mut history = voting_history(&votes(3, 0));
        assert!(!map.draft(&history, K).is_empty());
        let checked = map.last_checked();
        let before = map.keys().to_vec();

        history.extend([K, A]);
        assert!(map.draft(&history, K).is_empty());
        assert_eq!(map.keys(), before.as_slice());
        assert_eq!(map.last_checked(), checked);
        assert_eq!(map.pending_draft(), None);
    }

    #[test]
    fn test_short_history_leaves_cursor() {
        let mut map = map(4, 16, 1);
        let history = [1; 23];
        assert!(map.draft(&history, 1).is_empty());
        assert_eq!(map.last_checked(), 0);
    }

    #[test]
    fn test_most_recent_match() {
        let mut map = NgramMap::new(MapConfig::new(2, 1), true);
        let history = [0, 7, 8, 1, 2, 7, 8, 3, 4, 5, 6, 7];
        assert_eq!(map.draft(&history, 8).as_slice(), &[3]);
        assert_eq!(map.keys()[0].anchor_position, 5);
    }

    #[test]
    fn test_hit_count_saturates() {
        let mut map = NgramMap::new(MapConfig::new(1, 1), true);
        let mut history = vec![7; 4];
        for _ in 0..(COUNT_CAP as usize + 10) {
            assert_eq!(map.draft(&history, 7).as_slice(), &[7]);
            history.push(7);
        }
        assert_eq!(map.key_count(), 1);
        assert_eq!(map.keys()[0].hit_count, COUNT_CAP);
    }

    #[test]
    fn test_occurrence_count_saturates() {
        let mut map = map(1, 1, 1);
        let history = vec![7; COUNT_CAP as usize + 20];
        assert_eq!(map.draft(&history, 7).as_slice(), &[7]);
        assert_eq!(map.keys()[0].values[0].occurrence_count, COUNT_CAP);
    }

    #[test]
    fn test_deterministic() {
        let history = voting_history(&votes(6, 1));
        let mut a = map(1, 1, 1);
        let mut b = a.clone();
        assert_eq!(a.draft(&history, K), b.draft(&history, K));
        assert_eq!(a.keys(), b.keys());
        assert_eq!(a.pending_draft(), b.pending_draft());
    }

    #[test]
    fn test_reset() {
        let mut map = map(3, 2, 1);
        let history = [9, 1, 2, 3, 4, 5, 6, 7, 1, 2];
        map.draft(&history, 3);
        map.reset();
        assert_eq!(map.key_count(), 0);
        assert_eq!(map.pending_draft(), None);
        assert_eq!(map.last_checked(), 0);
    }
}
