//! Relaunch command handlers

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use tarmac_core::domain::launch_config::LaunchConfig;
use tarmac_core::domain::template::Template;
use tarmac_orchestrator::launch::TemplatePolicySnapshot;
use tarmac_orchestrator::launch::relaunch::{has_any_override, unprompted_fields};

use super::print_json;
use crate::config::Config;
use crate::loader::load_document;

/// Relaunch subcommands
#[derive(Subcommand)]
pub enum RelaunchCommands {
    /// Check whether a recorded launch config may be replayed
    Check {
        /// Template file as it is configured now (JSON or YAML)
        template: PathBuf,

        /// Launch config recorded for the job (JSON or YAML)
        launch_config: PathBuf,
    },
}

/// Handle relaunch commands
pub fn handle_relaunch_command(command: RelaunchCommands, config: &Config) -> Result<()> {
    match command {
        RelaunchCommands::Check {
            template,
            launch_config,
        } => {
            let template: Template = load_document(&template)?;
            let launch_config: LaunchConfig = load_document(&launch_config)?;
            check(&template, &launch_config, config)
        }
    }
}

fn check(template: &Template, launch_config: &LaunchConfig, config: &Config) -> Result<()> {
    let policy = TemplatePolicySnapshot::of(template);
    let unprompted = unprompted_fields(launch_config, &policy);
    let overrides = has_any_override(launch_config, &policy);

    if config.json {
        let names: Vec<&str> = unprompted.iter().map(|field| field.name()).collect();
        return print_json(&serde_json::json!({
            "allowed": unprompted.is_empty(),
            "unprompted_fields": names,
            "has_overrides": overrides,
        }));
    }

    if unprompted.is_empty() {
        println!(
            "{} {}",
            "✓".green(),
            format!("Job {} can be relaunched", launch_config.job_id()).bold()
        );
    } else {
        println!(
            "{} {}",
            "✗".red(),
            format!("Job {} cannot be relaunched", launch_config.job_id()).bold()
        );
        println!("{}", "No longer prompted on launch:".red());
        for field in &unprompted {
            println!("  - {}", field);
        }
    }
    if !overrides {
        println!("{}", "  Launched without overrides.".dimmed());
    }

    Ok(())
}
