//! Lookback CLI.

pub mod commands;
pub mod output;
pub mod progress;

use clap::{Parser, Subcommand};

/// Lookback - n-gram self-speculative drafting.
#[derive(Parser, Debug)]
#[command(
    name = "lookback",
    author = "Lookback Team",
    version,
    about = "Replay token streams through n-gram drafters and inspect their configuration",
    long_about = "Lookback proposes draft tokens for speculative decoding by mining a\n\
                  sequence's own history for repeating patterns.\n\n\
                  Drafters:\n\
                  • simple: replay what followed the last occurrence of the pattern\n\
                  • map-key: n-gram map that drafts on every key hit\n\
                  • map-key-values: n-gram map with continuation statistics and a confidence gate"
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path.
    #[arg(short, long, global = true, env = "LOOKBACK_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true, default_value = "warn", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON output.
    #[arg(long, global = true)]
    pub json: bool,
}

/// CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Simulate decoding of a recorded token stream.
    Replay(commands::replay::ReplayArgs),

    /// Validate configuration.
    Validate(commands::validate::ValidateArgs),

    /// Show version information.
    Version,
}
