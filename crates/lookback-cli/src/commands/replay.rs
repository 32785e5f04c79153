//! Replay command - simulate drafting over a recorded token stream.
//!
//! The stream stands in for the model: at every step the drafter sees the
//! tokens so far plus the next sampled one, and the verifier accepts the
//! longest draft prefix that matches what the stream actually produced.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use lookback_config::{loader::load_default_config, Config, ConfigLoader, DraftMode, DrafterConfig};
use lookback_core::TokenId;
use lookback_engine::{DraftSession, DraftStats};

use crate::output::{format_duration, format_kv_list, format_number, format_percentage, format_table, print_section};
use crate::progress::ScopedProgress;

/// Replay command arguments.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Token stream: a JSON array or whitespace-separated integers.
    pub tokens_file: String,

    /// Draft mode (simple, map-key, map-key-values).
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Key length for the active drafter, or every drafter with `--all-modes`.
    #[arg(long)]
    pub key_len: Option<usize>,

    /// Continuation length for the active drafter, or every drafter with `--all-modes`.
    #[arg(long)]
    pub continuation_len: Option<usize>,

    /// Replay once per draft mode and compare.
    #[arg(long, conflicts_with = "mode")]
    pub all_modes: bool,

    /// Print the prometheus metrics after the replay.
    #[arg(long)]
    pub metrics: bool,
}

/// Outcome of replaying a stream through one drafter.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Draft mode.
    pub mode: String,
    /// Tokens in the stream.
    pub tokens: usize,
    /// Model evaluations needed with drafting.
    pub steps: usize,
    /// Drafting statistics.
    pub stats: DraftStats,
    /// Wall time of the replay.
    pub elapsed_seconds: f64,
}

impl ReplayReport {
    /// Evaluations avoided compared to one evaluation per token.
    pub fn saved_steps(&self) -> usize {
        self.tokens.saturating_sub(self.steps)
    }

    /// Tokens produced per model evaluation.
    pub fn tokens_per_step(&self) -> f64 {
        if self.steps == 0 {
            return 0.0;
        }
        self.tokens as f64 / self.steps as f64
    }
}

/// Parse a token stream.
pub fn parse_tokens(content: &str) -> Result<Vec<TokenId>> {
    let content = content.trim();
    if content.starts_with('[') {
        return serde_json::from_str(content).context("Invalid JSON token array");
    }

    content
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            word.parse::<TokenId>()
                .with_context(|| format!("Invalid token '{}' at index {}", word, i))
        })
        .collect()
}

/// Number of leading draft tokens that match `upcoming`.
fn verify(draft: &[TokenId], upcoming: &[TokenId]) -> usize {
    draft
        .iter()
        .zip(upcoming)
        .take_while(|(d, t)| d == t)
        .count()
}

/// Replay `tokens` through a fresh session.
pub fn simulate(config: &DrafterConfig, tokens: &[TokenId], progress: Option<&ScopedProgress>) -> Result<ReplayReport> {
    let mut session = DraftSession::from_config(config)?;
    let start = Instant::now();

    let mut pos = 0;
    let mut steps = 0;
    while pos < tokens.len() {
        // One model evaluation yields tokens[pos]; the draft covers what follows
        let draft = session.draft(&tokens[..pos], tokens[pos]);
        let accepted = verify(&draft, &tokens[pos + 1..]);
        session.accept(accepted);

        steps += 1;
        pos += 1 + accepted;

        if let Some(progress) = progress {
            progress.set_position(pos as u64);
        }
    }

    let report = ReplayReport {
        mode: config.mode.to_string(),
        tokens: tokens.len(),
        steps,
        stats: *session.stats(),
        elapsed_seconds: start.elapsed().as_secs_f64(),
    };
    debug!(mode = %report.mode, steps, saved = report.saved_steps(), "replay finished");
    Ok(report)
}

/// Resolve the configuration and apply command-line overrides.
fn resolve_config(args: &ReplayArgs, config_path: Option<String>) -> Result<Config> {
    let mut config = match config_path {
        Some(path) => ConfigLoader::new()
            .with_file(path)
            .with_env_prefix("LOOKBACK")
            .load()?,
        None => load_default_config()?,
    };

    apply_overrides(args, &mut config.drafter)?;
    config.validate()?;
    Ok(config)
}

/// Apply `--mode`, `--key-len` and `--continuation-len`.
///
/// Lengths go to the active drafter, or to every drafter when comparing
/// all modes.
fn apply_overrides(args: &ReplayArgs, drafter: &mut DrafterConfig) -> Result<()> {
    if let Some(ref mode) = args.mode {
        drafter.mode = mode.parse::<DraftMode>().map_err(anyhow::Error::msg)?;
    }

    let simple = args.all_modes || drafter.mode == DraftMode::Simple;
    let map = args.all_modes || drafter.mode != DraftMode::Simple;

    if let Some(n) = args.key_len {
        if simple {
            drafter.simple.key_len = n;
        }
        if map {
            drafter.map.key_len = n;
        }
    }
    if let Some(m) = args.continuation_len {
        if simple {
            drafter.simple.continuation_len = m;
        }
        if map {
            drafter.map.continuation_len = m;
        }
    }

    Ok(())
}

/// Execute the replay command.
pub fn execute(args: ReplayArgs, config_path: Option<String>, json: bool) -> Result<()> {
    let config = resolve_config(&args, config_path)?;

    let content = std::fs::read_to_string(&args.tokens_file)
        .with_context(|| format!("Failed to read {}", args.tokens_file))?;
    let tokens = parse_tokens(&content)?;
    info!(file = %args.tokens_file, tokens = tokens.len(), "loaded token stream");

    if args.metrics {
        lookback_metrics::init_metrics()?;
    }

    let modes = if args.all_modes {
        vec![DraftMode::Simple, DraftMode::MapKey, DraftMode::MapKeyValues]
    } else {
        vec![config.drafter.mode]
    };

    if !json {
        println!(
            "{} {} ({} tokens)",
            "Replaying".bright_green().bold(),
            args.tokens_file.bright_cyan(),
            format_number(tokens.len() as u64)
        );
    }

    let mut reports = Vec::with_capacity(modes.len());
    for mode in modes {
        let drafter = DrafterConfig {
            mode,
            ..config.drafter.clone()
        };
        let progress = ScopedProgress::replay(tokens.len() as u64, json);
        progress.set_message(mode.as_str());
        reports.push(simulate(&drafter, &tokens, Some(&progress))?);
    }

    if json {
        let mut result = serde_json::json!({
            "file": args.tokens_file,
            "reports": reports,
        });
        if args.metrics {
            result["metrics"] = serde_json::Value::String(lookback_metrics::export_prometheus()?);
        }
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if let [report] = reports.as_slice() {
        print_section("Replay Results");
        println!(
            "{}",
            format_kv_list(&[
                ("Mode", report.mode.clone()),
                ("Tokens", format_number(report.tokens as u64)),
                ("Model steps", format_number(report.steps as u64)),
                ("Steps saved", format_number(report.saved_steps() as u64)),
                ("Tokens per step", format!("{:.2}", report.tokens_per_step())),
                ("Drafts", format_number(report.stats.drafts)),
                ("Mean draft length", format!("{:.2}", report.stats.mean_draft_len())),
                ("Acceptance rate", format_percentage(report.stats.acceptance_rate())),
                ("Elapsed", format_duration(report.elapsed_seconds)),
            ])
        );
    } else {
        print_section("Mode Comparison");
        let rows: Vec<Vec<String>> = reports
            .iter()
            .map(|r| {
                vec![
                    r.mode.clone(),
                    format_number(r.steps as u64),
                    format_number(r.saved_steps() as u64),
                    format!("{:.2}", r.tokens_per_step()),
                    format!("{:.2}", r.stats.mean_draft_len()),
                    format_percentage(r.stats.acceptance_rate()),
                ]
            })
            .collect();
        print!(
            "{}",
            format_table(
                &["mode", "steps", "saved", "tokens/step", "mean draft", "acceptance"],
                &rows
            )
        );
    }

    if args.metrics {
        print_section("Metrics");
        print!("{}", lookback_metrics::export_prometheus()?);
    }

    println!();
    Ok(())
}
