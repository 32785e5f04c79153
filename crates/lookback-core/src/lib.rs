//! # Lookback Core
//!
//! Core types and errors shared by the lookback drafting crates.
//!
//! - **Tokens**: [`TokenId`] and the [`DraftTokens`] buffer drafters return
//! - **Slots**: [`SlotId`], the identity of one generation sequence
//! - **Errors**: [`Error`] for the few fallible operations outside the hot path
//! - **Rendering**: [`TokenSpan`] for compact debug output of history windows

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::*;

    pub use smallvec::SmallVec;
}
