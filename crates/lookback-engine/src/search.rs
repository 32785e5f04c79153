//! Pattern search over the token history.
//!
//! All helpers bound-check through `slice::get`, so a window running past
//! the end of the history is simply "no match".

use lookback_core::{DraftTokens, TokenId};
use smallvec::SmallVec;

/// Lookup key: a short n-gram kept inline.
pub type KeyTokens = SmallVec<[TokenId; 16]>;

/// Build the lookup key: the last `key_len - 1` history tokens followed by
/// `sampled`, which has not been appended to the history yet.
///
/// Returns `None` for a zero key length or a history too short to supply
/// the prefix.
pub fn trailing_key(history: &[TokenId], sampled: TokenId, key_len: usize) -> Option<KeyTokens> {
    let prefix_len = key_len.checked_sub(1)?;
    let start = history.len().checked_sub(prefix_len)?;

    let mut key = KeyTokens::with_capacity(key_len);
    key.extend_from_slice(&history[start..]);
    key.push(sampled);
    Some(key)
}

/// Whether `pattern` occurs in `history` starting at `pos`.
#[inline]
pub fn matches_at(history: &[TokenId], pos: usize, pattern: &[TokenId]) -> bool {
    pos.checked_add(pattern.len())
        .and_then(|end| history.get(pos..end))
        .is_some_and(|window| window == pattern)
}

/// Whether the `len`-token windows at `a` and `b` hold the same tokens.
#[inline]
pub fn windows_equal(history: &[TokenId], a: usize, b: usize, len: usize) -> bool {
    match (window(history, a, len), window(history, b, len)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// The `len`-token window starting at `start`, if it lies inside `history`.
#[inline]
pub fn window(history: &[TokenId], start: usize, len: usize) -> Option<&[TokenId]> {
    history.get(start..start.checked_add(len)?)
}

/// Most recent start position of `pattern`, scanning from `last_start`
/// down to 1.
///
/// Position 0 is never reported: a match there has no preceding context
/// and is treated as no match.
pub fn rfind_pattern(history: &[TokenId], pattern: &[TokenId], last_start: usize) -> Option<usize> {
    (1..=last_start)
        .rev()
        .find(|&pos| matches_at(history, pos, pattern))
}

/// Copy up to `len` tokens starting at `start` into a draft.
pub fn copy_draft(history: &[TokenId], start: usize, len: usize) -> DraftTokens {
    let start = start.min(history.len());
    let end = start.saturating_add(len).min(history.len());
    DraftTokens::from_slice(&history[start..end])
}
