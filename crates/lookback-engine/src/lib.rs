//! # Lookback Engine
//!
//! N-gram self-speculative drafting: proposes the tokens a model is likely
//! to generate next by mining the sequence's own history, so a single
//! verification pass can confirm several tokens at once.
//!
//! ## Architecture
//!
//! - **Search**: bounded backward pattern search over the history
//! - **SimpleDrafter**: replays what followed the last occurrence of the trailing pattern
//! - **NgramMap**: per-key continuation statistics with a confidence gate and accept feedback
//! - **DraftSession**: one drafter per generation slot plus feedback bookkeeping
//! - **SlotRegistry**: sessions keyed by slot
//!
//! ## Example
//!
//! ```rust,ignore
//! use lookback_config::DrafterConfig;
//! use lookback_engine::DraftSession;
//!
//! let mut session = DraftSession::from_config(&DrafterConfig::default())?;
//!
//! let draft = session.draft(&history, sampled);
//! let accepted = verify(&draft);
//! session.accept(accepted);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod drafter;
pub mod ngram_map;
pub mod registry;
pub mod search;
pub mod session;
pub mod simple;

pub use drafter::*;
pub use ngram_map::*;
pub use registry::*;
pub use session::*;
pub use simple::*;

/// Prelude for common imports
pub mod prelude {
    pub use super::drafter::{build_drafter, Drafter};
    pub use super::ngram_map::NgramMap;
    pub use super::registry::SlotRegistry;
    pub use super::session::{DraftSession, DraftStats};
    pub use super::simple::SimpleDrafter;
}
