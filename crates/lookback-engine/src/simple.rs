//! # Pattern-Replay Drafter
//!
//! Looks for the most recent earlier occurrence of the trailing n-gram
//! (last `n - 1` history tokens plus the sampled token) and replays the
//! tokens that followed it. Apart from the throttle cursor there is no
//! state between calls.

use lookback_config::SimpleConfig;
use lookback_core::{DraftTokens, TokenId};
use tracing::{debug, trace};

use crate::search::{copy_draft, rfind_pattern, trailing_key};

/// Stateless pattern-replay drafter, one per generation slot.
#[derive(Debug, Clone)]
pub struct SimpleDrafter {
    config: SimpleConfig,
    /// History length at the last lookup.
    last_checked: usize,
}

impl SimpleDrafter {
    /// Create a new drafter.
    pub fn new(config: SimpleConfig) -> Self {
        Self {
            config,
            last_checked: 0,
        }
    }

    /// Propose tokens to follow `sampled`.
    ///
    /// The draft is empty when throttled, when the history is too short,
    /// when the pattern has no earlier occurrence, or when fewer than
    /// `key_len` tokens follow that occurrence.
    pub fn draft(&mut self, history: &[TokenId], sampled: TokenId) -> DraftTokens {
        let cur_len = history.len();
        let n = self.config.key_len;
        let m = self.config.continuation_len;

        if self.last_checked.saturating_add(self.config.check_rate) > cur_len {
            trace!(cur_len, last_checked = self.last_checked, "throttled");
            return DraftTokens::new();
        }

        if cur_len <= n + m + 1 {
            return DraftTokens::new();
        }

        let Some(pattern) = trailing_key(history, sampled, n) else {
            return DraftTokens::new();
        };

        self.last_checked = cur_len;

        // Candidate starts run from len - n - 1 down to 1
        let Some(last_start) = cur_len.checked_sub(n + 1) else {
            return DraftTokens::new();
        };
        let Some(match_pos) = rfind_pattern(history, &pattern, last_start) else {
            return DraftTokens::new();
        };

        let available = m.min(cur_len - (match_pos + n));
        if available < n {
            trace!(match_pos, available, "continuation shorter than pattern");
            return DraftTokens::new();
        }

        debug!(
            cur_len,
            match_pos,
            pattern_len = pattern.len(),
            draft_len = available,
            "found matching pattern"
        );

        copy_draft(history, match_pos + n, available)
    }

    /// Forget the throttle cursor, e.g. when the slot is reused.
    pub fn reset(&mut self) {
        self.last_checked = 0;
    }

    /// History length at the last lookup.
    pub fn last_checked(&self) -> usize {
        self.last_checked
    }

    /// Get config.
    pub fn config(&self) -> &SimpleConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drafter(n: usize, m: usize) -> SimpleDrafter {
        SimpleDrafter::new(SimpleConfig::new(n, m))
    }

    #[test]
    fn test_replays_continuation() {
        let mut d = drafter(2, 3);
        let history = [9, 1, 2, 3, 4, 5, 6, 1];
        assert_eq!(d.draft(&history, 2).as_slice(), &[3, 4, 5]);
        assert_eq!(d.last_checked(), history.len());
    }

    #[test]
    fn test_match_at_position_zero_is_ignored() {
        let mut d = drafter(2, 3);
        let history = [1, 2, 3, 4, 5, 6, 7, 1];
        assert!(d.draft(&history, 2).is_empty());
        // The lookup still happened
        assert_eq!(d.last_checked(), history.len());
    }

    #[test]
    fn test_most_recent_match_wins() {
        let mut d = drafter(2, 2);
        let history = [0, 7, 8, 1, 2, 7, 8, 3, 4, 5, 6, 7];
        assert_eq!(d.draft(&history, 8).as_slice(), &[3, 4]);
    }

    #[test]
    fn test_short_history() {
        let mut d = drafter(2, 3);
        // Needs more than n + m + 1 = 6 tokens
        let history = [1, 2, 3, 1, 2, 1];
        assert!(d.draft(&history, 2).is_empty());
        assert_eq!(d.last_checked(), 0);
    }

    #[test]
    fn test_throttle_leaves_state_alone() {
        let mut d = SimpleDrafter::new(SimpleConfig::new(2, 3).with_check_rate(4));
        let mut history = vec![9, 1, 2, 3, 4, 5, 6, 1];
        // 8 - 0 >= 4: lookup runs
        assert!(!d.draft(&history, 2).is_empty());
        assert_eq!(d.last_checked(), 8);

        history.extend([2, 3]);
        history.push(1);
        // 11 - 8 < 4: throttled
        assert!(d.draft(&history, 2).is_empty());
        assert_eq!(d.last_checked(), 8);

        history.push(7);
        history.push(1);
        // 13 - 8 >= 4
        assert!(!d.draft(&history, 2).is_empty());
        assert_eq!(d.last_checked(), 13);
    }

    #[test]
    fn test_draft_shorter_than_key_is_rejected() {
        let mut d = drafter(3, 4);
        // [1, 1, 1] recurs at 6, leaving a single token after it
        let history = [9, 8, 7, 6, 5, 4, 1, 1, 1, 1];
        assert!(d.draft(&history, 1).is_empty());
        assert_eq!(d.last_checked(), history.len());
    }

    #[test]
    fn test_available_caps_at_history_end() {
        let mut d = drafter(2, 4);
        let history = [9, 9, 9, 9, 5, 6, 7, 5];
        assert_eq!(d.draft(&history, 6).as_slice(), &[7, 5]);
    }

    #[test]
    fn test_deterministic() {
        let history = [3, 1, 2, 3, 4, 5, 1, 2, 9, 9, 1];
        let mut a = drafter(2, 3);
        let mut b = a.clone();
        assert_eq!(a.draft(&history, 2), b.draft(&history, 2));
        assert_eq!(a.last_checked(), b.last_checked());
    }

    #[test]
    fn test_reset() {
        let mut d = drafter(2, 3);
        let history = [9, 1, 2, 3, 4, 5, 6, 1];
        d.draft(&history, 2);
        d.reset();
        assert_eq!(d.last_checked(), 0);
    }
}
