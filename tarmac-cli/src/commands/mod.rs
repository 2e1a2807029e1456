//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod relaunch;
mod template;
mod vars;

pub use relaunch::RelaunchCommands;
pub use template::TemplateCommands;
pub use vars::VarsCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use serde::Serialize;
use tarmac_core::dto::resolution::ErrorMap;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Template checks, resolution and launch planning
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Relaunch checks against a recorded launch config
    Relaunch {
        #[command(subcommand)]
        command: RelaunchCommands,
    },
    /// Extra variable parsing and display
    Vars {
        #[command(subcommand)]
        command: VarsCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Template { command } => template::handle_template_command(command, config).await,
        Commands::Relaunch { command } => relaunch::handle_relaunch_command(command, config),
        Commands::Vars { command } => vars::handle_vars_command(command, config),
    }
}

/// Print a value as pretty JSON
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print field errors, one line per message
pub(crate) fn print_errors(errors: &ErrorMap) {
    for (key, violations) in errors {
        for violation in violations {
            println!("  {} {}", format!("{}:", key).red(), violation.message);
        }
    }
}
