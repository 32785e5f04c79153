//! Validate command - validate configuration files.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use lookback_config::{Config, ConfigLoader, DraftMode, MapConfig};
use lookback_core::DRAFT_INLINE_CAPACITY;

use crate::output::{format_kv_list, print_error, print_success, print_warning};

/// Validate command arguments.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration file to validate.
    pub config_file: String,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings that are accepted but probably not what the user meant.
pub fn config_warnings(config: &Config) -> Vec<String> {
    let drafter = &config.drafter;
    let mut warnings = Vec::new();

    if drafter.mode == DraftMode::MapKey && drafter.map.min_hits != MapConfig::default().min_hits {
        warnings.push("drafter.map.min_hits has no effect in map-key mode".to_string());
    }

    if drafter.continuation_len() > DRAFT_INLINE_CAPACITY {
        warnings.push(format!(
            "continuation_len {} exceeds {} tokens, drafts will allocate",
            drafter.continuation_len(),
            DRAFT_INLINE_CAPACITY
        ));
    }

    if drafter.mode != DraftMode::Simple && drafter.map.check_rate > drafter.map.continuation_len {
        warnings.push(
            "drafter.map.check_rate is larger than continuation_len, most steps will not draft"
                .to_string(),
        );
    }

    warnings
}

/// Execute the validate command.
pub fn execute(args: ValidateArgs, json: bool) -> Result<()> {
    if !json {
        println!(
            "\n{} {}",
            "Validating".bright_green().bold(),
            args.config_file.bright_cyan()
        );
        println!();
    }

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    match ConfigLoader::new().with_file(&args.config_file).load() {
        Ok(config) => {
            if !json && args.verbose {
                print_success("Configuration loaded successfully");
            }

            warnings.extend(config_warnings(&config));

            if !json && args.verbose {
                let drafter = &config.drafter;
                println!();
                println!("  {}", "Configuration Summary".bright_cyan().underline());
                println!(
                    "{}",
                    format_kv_list(&[
                        ("Mode", drafter.mode.to_string()),
                        ("Key length", drafter.key_len().to_string()),
                        ("Continuation length", drafter.continuation_len().to_string()),
                        ("Min hits", drafter.map.min_hits.to_string()),
                        ("Log level", config.logging.level.clone()),
                        ("Metrics", config.metrics.enabled.to_string()),
                    ])
                );
                println!();
            }
        }
        Err(e) => errors.push(format!("Failed to load configuration: {}", e)),
    }

    if json {
        let result = serde_json::json!({
            "file": args.config_file,
            "valid": errors.is_empty(),
            "errors": errors,
            "warnings": warnings,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if !errors.is_empty() {
            println!("  {}", "Errors:".bright_red().bold());
            for error in &errors {
                print_error(error);
            }
            println!();
        }

        if !warnings.is_empty() {
            println!("  {}", "Warnings:".bright_yellow().bold());
            for warning in &warnings {
                print_warning(warning);
            }
            println!();
        }

        if errors.is_empty() {
            println!(
                "  {} Configuration is {}",
                "✓".bright_green(),
                "valid".bright_green().bold()
            );
        } else {
            println!(
                "  {} Configuration is {}",
                "✗".bright_red(),
                "invalid".bright_red().bold()
            );
        }
    }

    if !errors.is_empty() {
        anyhow::bail!("Configuration validation failed");
    }

    Ok(())
}
