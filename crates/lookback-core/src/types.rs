//! Core types used throughout lookback.
//!
//! Tokens are opaque integer identifiers: only equality is meaningful.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Token ID type.
pub type TokenId = u32;

/// Saturation cap for every hit and occurrence counter.
pub const COUNT_CAP: u16 = 16380;

/// Default number of candidate continuations tracked per key.
pub const DEFAULT_VALUE_SLOTS: usize = 4;

/// Number of draft tokens stored inline before spilling to the heap.
pub const DRAFT_INLINE_CAPACITY: usize = 16;

/// Tokens proposed for verification.
/// SmallVec avoids heap allocation for the common short draft.
pub type DraftTokens = SmallVec<[TokenId; DRAFT_INLINE_CAPACITY]>;

/// Identifier of a generation slot (one sequence being decoded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u64);

impl SlotId {
    /// Create a new slot ID.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric value.
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot_{}", self.0)
    }
}

impl From<u64> for SlotId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Display adapter rendering a run of tokens as `[t0, t1, ...]`.
///
/// Used in debug logs; the window is clamped to the underlying slice so a
/// span never panics on a short history.
#[derive(Debug, Clone, Copy)]
pub struct TokenSpan<'a>(&'a [TokenId]);

impl<'a> TokenSpan<'a> {
    /// Span over a whole slice.
    pub fn new(tokens: &'a [TokenId]) -> Self {
        Self(tokens)
    }

    /// Span over `len` tokens of `history` starting at `start`.
    pub fn window(history: &'a [TokenId], start: usize, len: usize) -> Self {
        let start = start.min(history.len());
        let end = start.saturating_add(len).min(history.len());
        Self(&history[start..end])
    }

    /// Tokens covered by the span.
    pub fn tokens(&self) -> &'a [TokenId] {
        self.0
    }
}

impl fmt::Display for TokenSpan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{token}")?;
        }
        f.write_str("]")
    }
}
