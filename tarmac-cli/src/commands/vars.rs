//! Variable command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use serde_json::Value;
use tarmac_core::domain::launch_config::LaunchConfig;
use tarmac_orchestrator::launch::variables::parse_yaml_or_json;

use super::print_json;
use crate::config::Config;
use crate::loader::load_document;

/// Variable subcommands
#[derive(Subcommand)]
pub enum VarsCommands {
    /// Parse stored variables text (JSON or YAML) into a mapping
    Parse {
        /// File holding the variables text
        file: PathBuf,
    },
    /// Show the prompts recorded in a launch config, survey passwords redacted
    Prompts {
        /// Launch config file (JSON or YAML)
        launch_config: PathBuf,
    },
}

/// Handle variable commands
pub fn handle_vars_command(command: VarsCommands, config: &Config) -> Result<()> {
    match command {
        VarsCommands::Parse { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let vars = parse_yaml_or_json(&text)
                .with_context(|| format!("Invalid variables in {}", file.display()))?;
            print_json(&vars)
        }
        VarsCommands::Prompts { launch_config } => {
            let launch_config: LaunchConfig = load_document(&launch_config)?;
            let prompts = launch_config.prompts(true);

            if config.json {
                return print_json(&prompts);
            }
            if prompts.is_empty() {
                println!("{}", "No prompts recorded.".yellow());
                return Ok(());
            }
            println!(
                "{}",
                format!("Prompts for job {}:", launch_config.job_id()).bold()
            );
            for (field, value) in &prompts {
                println!("  {} {}", format!("{}:", field).cyan(), render(value));
            }
            Ok(())
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
