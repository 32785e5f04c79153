//! Progress bar utilities.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bar style presets.
pub struct ProgressStyles;

impl ProgressStyles {
    /// Replay progress, counted in tokens.
    pub fn replay() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tokens ({per_sec}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }
}

/// Create a replay progress bar. Hidden bars are used for JSON output.
pub fn create_replay_bar(total: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    pb.set_style(ProgressStyles::replay());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Progress bar that is cleared on drop.
pub struct ScopedProgress {
    bar: ProgressBar,
}

impl ScopedProgress {
    /// Create a replay bar.
    pub fn replay(total: u64, hidden: bool) -> Self {
        Self {
            bar: create_replay_bar(total, hidden),
        }
    }

    /// Set position.
    pub fn set_position(&self, pos: u64) {
        self.bar.set_position(pos);
    }

    /// Set message.
    pub fn set_message(&self, msg: impl Into<std::borrow::Cow<'static, str>>) {
        self.bar.set_message(msg);
    }
}

impl Drop for ScopedProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}
