//! Drafter abstraction and mode dispatch.

use lookback_config::{validation_messages, DraftMode, DrafterConfig};
use lookback_core::{DraftTokens, Error, Result, TokenId};
use tracing::debug;
use validator::Validate;

use crate::ngram_map::NgramMap;
use crate::simple::SimpleDrafter;

/// A source of draft tokens for one generation slot.
///
/// Implementations never fail: every rejection is an empty draft.
pub trait Drafter: Send {
    /// Propose tokens to follow `sampled`, given the history before it.
    fn draft(&mut self, history: &[TokenId], sampled: TokenId) -> DraftTokens;

    /// Report how many tokens of the last draft were accepted.
    fn accept(&mut self, _accepted: usize) {}

    /// Drop all per-sequence state.
    fn reset(&mut self);

    /// Short name, used as the metrics label.
    fn name(&self) -> &'static str;
}

impl Drafter for SimpleDrafter {
    fn draft(&mut self, history: &[TokenId], sampled: TokenId) -> DraftTokens {
        SimpleDrafter::draft(self, history, sampled)
    }

    fn reset(&mut self) {
        SimpleDrafter::reset(self)
    }

    fn name(&self) -> &'static str {
        DraftMode::Simple.as_str()
    }
}

impl<const SLOTS: usize> Drafter for NgramMap<SLOTS> {
    fn draft(&mut self, history: &[TokenId], sampled: TokenId) -> DraftTokens {
        NgramMap::draft(self, history, sampled)
    }

    fn accept(&mut self, accepted: usize) {
        NgramMap::accept(self, accepted)
    }

    fn reset(&mut self) {
        NgramMap::reset(self)
    }

    fn name(&self) -> &'static str {
        if self.is_key_only() {
            DraftMode::MapKey.as_str()
        } else {
            DraftMode::MapKeyValues.as_str()
        }
    }
}

/// Build the drafter selected by `config.mode`.
pub fn build_drafter(config: &DrafterConfig) -> Result<Box<dyn Drafter>> {
    config.validate().map_err(|errors| {
        let messages = validation_messages(&errors);
        let message = messages
            .iter()
            .map(|(path, msg)| format!("{}: {}", path, msg))
            .collect::<Vec<_>>()
            .join("; ");
        match messages.into_iter().next() {
            Some((field, _)) => Error::validation_field(message, field),
            None => Error::validation(message),
        }
    })?;

    debug!(
        mode = %config.mode,
        key_len = config.key_len(),
        continuation_len = config.continuation_len(),
        "building drafter"
    );

    let drafter: Box<dyn Drafter> = match config.mode {
        DraftMode::Simple => Box::new(SimpleDrafter::new(config.simple.clone())),
        DraftMode::MapKey => Box::new(NgramMap::new(config.map.clone(), true)),
        DraftMode::MapKeyValues => Box::new(NgramMap::new(config.map.clone(), false)),
    };

    Ok(drafter)
}
