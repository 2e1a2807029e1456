//! Tarmac CLI
//!
//! Command-line interface for checking job templates and launch requests
//! against the launch engine.

mod commands;
mod config;
mod loader;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tarmac")]
#[command(about = "Tarmac job template launch CLI", long_about = None)]
struct Cli {
    /// Highest forks value a launch may request (0 for no ceiling)
    #[arg(long, env = "TARMAC_MAX_FORKS", default_value_t = 0)]
    max_forks: u32,

    /// Active jobs per template before launches are refused
    #[arg(long, env = "TARMAC_SCHEDULE_MAX_JOBS", default_value_t = 10)]
    schedule_max_jobs: usize,

    /// Comma separated instance group ids used when nothing else is configured
    #[arg(long, env = "TARMAC_GLOBAL_INSTANCE_GROUPS", default_value = "")]
    global_instance_groups: String,

    /// Print JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tarmac=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut engine = tarmac_orchestrator::Config::new()
        .with_global_instance_groups(tarmac_orchestrator::config::parse_id_list(
            &cli.global_instance_groups,
        )?);
    engine.max_forks = cli.max_forks;
    engine.schedule_max_jobs = cli.schedule_max_jobs;
    engine.validate()?;

    let config = Config {
        engine,
        json: cli.json,
    };

    handle_command(cli.command, &config).await
}
