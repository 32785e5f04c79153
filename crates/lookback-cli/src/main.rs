//! Lookback CLI entry point.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use lookback_cli::{Cli, Commands};
use lookback_metrics::tracing_setup::{init_tracing, TracingConfig};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let format = if cli.json { "json" } else { "compact" };
    init_tracing(TracingConfig::from_names(&cli.log_level, format))?;

    // Print banner
    if !cli.json && !matches!(cli.command, Commands::Version) {
        print_banner();
    }

    // Execute command
    match cli.command {
        Commands::Replay(args) => {
            lookback_cli::commands::replay::execute(args, cli.config, cli.json)?;
        }
        Commands::Validate(args) => {
            lookback_cli::commands::validate::execute(args, cli.json)?;
        }
        Commands::Version => {
            print_version(cli.json)?;
        }
    }

    Ok(())
}

/// Print the banner.
fn print_banner() {
    println!(
        "\n  {} {} - {}\n",
        "Lookback".bright_green().bold(),
        env!("CARGO_PKG_VERSION").bright_yellow(),
        "n-gram self-speculative drafting".white()
    );
}

/// Print version information.
fn print_version(json: bool) -> Result<()> {
    if json {
        let version = serde_json::json!({
            "name": "lookback",
            "version": env!("CARGO_PKG_VERSION"),
            "rust_version": env!("CARGO_PKG_RUST_VERSION"),
            "authors": env!("CARGO_PKG_AUTHORS"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
        });
        println!("{}", serde_json::to_string_pretty(&version)?);
    } else {
        println!("{} {}", "Lookback".bright_green().bold(), env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
        println!("Authors: {}", env!("CARGO_PKG_AUTHORS"));
        println!();
        println!("{}", env!("CARGO_PKG_DESCRIPTION"));
    }
    Ok(())
}
