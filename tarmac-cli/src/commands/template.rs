//! Template command handlers
//!
//! Checks a template file, resolves launch requests against it and previews the
//! jobs a launch would create.

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use tarmac_core::domain::job::Job;
use tarmac_core::domain::template::Template;
use tarmac_core::dto::launch::LaunchRequest;
use tarmac_core::dto::resolution::ResolutionResult;
use tarmac_orchestrator::launch::instance_groups::preferred_instance_groups;
use tarmac_orchestrator::launch::meta::job_meta_vars;
use tarmac_orchestrator::launch::notifications::notification_templates;
use tarmac_orchestrator::launch::{policy, readiness, slicing};
use tarmac_orchestrator::repository::{InMemoryStore, TemplateRepository};
use tarmac_orchestrator::service::launch_service;

use super::{print_errors, print_json};
use crate::config::Config;
use crate::loader::{load_document, load_optional};

/// Template subcommands
#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Report template problems and what a launch will ask for
    Check {
        /// Template file (JSON or YAML)
        template: PathBuf,
    },
    /// Resolve a launch request without launching
    Resolve {
        /// Template file (JSON or YAML)
        template: PathBuf,

        /// Launch request file; an empty request when omitted
        #[arg(short, long)]
        request: Option<PathBuf>,
    },
    /// Show the jobs a launch would create
    Plan {
        /// Template file (JSON or YAML)
        template: PathBuf,

        /// Launch request file; an empty request when omitted
        #[arg(short, long)]
        request: Option<PathBuf>,
    },
}

/// Handle template commands
pub async fn handle_template_command(command: TemplateCommands, config: &Config) -> Result<()> {
    match command {
        TemplateCommands::Check { template } => {
            let template: Template = load_document(&template)?;
            check_template(&template, config)
        }
        TemplateCommands::Resolve { template, request } => {
            let template: Template = load_document(&template)?;
            let request: LaunchRequest = load_optional(request.as_deref())?;
            resolve(&template, &request, config).await
        }
        TemplateCommands::Plan { template, request } => {
            let template: Template = load_document(&template)?;
            let request: LaunchRequest = load_optional(request.as_deref())?;
            plan(template, request, config).await
        }
    }
}

fn check_template(template: &Template, config: &Config) -> Result<()> {
    let Template::Job(job_template) = template else {
        if config.json {
            return print_json(&serde_json::json!({"errors": {}, "can_start_without_user_input": true}));
        }
        println!("{} {}", "✓".green(), format!("System job template '{}'", template.name()).bold());
        return Ok(());
    };

    let errors = readiness::validation_errors(job_template);
    let can_start = readiness::can_start_without_user_input(job_template, None);
    let needed = readiness::variables_needed_to_start(job_template);

    if config.json {
        return print_json(&serde_json::json!({
            "errors": errors,
            "can_start_without_user_input": can_start,
            "variables_needed_to_start": needed,
            "ask_mapping": policy::ask_mapping(template.kind()),
        }));
    }

    println!("{}", format!("Job template '{}'", job_template.name).bold());
    println!("{}", "─".repeat(80).dimmed());
    if errors.is_empty() {
        println!("{} {}", "✓".green(), "No template errors");
    } else {
        println!("{}", "Template errors:".red().bold());
        print_errors(&errors);
    }

    let prompted: Vec<&str> = policy::rules(template.kind())
        .iter()
        .filter(|rule| template.asks(rule.ask))
        .map(|rule| rule.field.name())
        .collect();
    if prompted.is_empty() {
        println!("  {} none", "Prompts on launch:".bold());
    } else {
        println!("  {} {}", "Prompts on launch:".bold(), prompted.join(", "));
    }
    if !needed.is_empty() {
        println!("  {} {}", "Required survey variables:".bold(), needed.join(", "));
    }
    println!(
        "  {} {}",
        "Starts without input:".bold(),
        if can_start { "yes".green() } else { "no".yellow() }
    );

    Ok(())
}

async fn resolve(template: &Template, request: &LaunchRequest, config: &Config) -> Result<()> {
    let store = InMemoryStore::new();
    store.save_template(template.clone()).await?;
    let resolution =
        launch_service::preview_launch(&store, &config.engine, template.id(), request).await?;

    if config.json {
        return print_json(&resolution);
    }
    print_resolution(&resolution)
}

async fn plan(template: Template, request: LaunchRequest, config: &Config) -> Result<()> {
    let store = InMemoryStore::new();
    let template_id = template.id();
    store.save_template(template.clone()).await?;

    let outcome = launch_service::launch_job(&store, &config.engine, template_id, request).await?;

    if config.json {
        return print_json(&outcome.plan);
    }

    match &outcome.workflow {
        Some(workflow) => println!(
            "{}",
            format!(
                "Sliced launch of '{}' into {} jobs",
                workflow.spec.name, workflow.spec.slice_count
            )
            .bold()
        ),
        None => println!("{}", format!("Launch of '{}'", template.name()).bold()),
    }
    println!("{}", "─".repeat(80).dimmed());
    for job in &outcome.jobs {
        print_job(job, &template, config);
    }

    let notifications = notification_templates(&template, None);
    if !notifications.is_empty() {
        println!(
            "  {} {} error, {} started, {} success",
            "Notifications:".bold(),
            notifications.error.len(),
            notifications.started.len(),
            notifications.success.len()
        );
    }

    Ok(())
}

fn print_resolution(resolution: &ResolutionResult) -> Result<()> {
    if resolution.launchable {
        println!("{} {}", "✓".green(), "Launchable".green().bold());
    } else {
        println!("{} {}", "✗".red(), "Not launchable".red().bold());
    }

    let accepted = serde_json::to_value(&resolution.accepted)?;
    let rejected = serde_json::to_value(&resolution.rejected)?;
    print_section("Accepted", &accepted);
    print_section("Rejected", &rejected);

    if !resolution.errors.is_empty() {
        println!("{}", "Errors:".red().bold());
        print_errors(&resolution.errors);
    }
    Ok(())
}

fn print_section(title: &str, values: &serde_json::Value) {
    let Some(fields) = values.as_object().filter(|fields| !fields.is_empty()) else {
        return;
    };
    println!("{}", format!("{}:", title).bold());
    for (field, value) in fields {
        println!("  {} {}", format!("{}:", field).cyan(), value);
    }
}

fn print_job(job: &Job, template: &Template, config: &Config) {
    let Some(spec) = job.spec() else {
        println!("  {} {}", "System job".bold(), job.id.to_string().dimmed());
        return;
    };

    let groups = preferred_instance_groups(
        spec,
        template.as_job(),
        None,
        &config.engine.global_instance_groups,
    );
    let slice = if spec.slice.is_sliced() {
        format!("slice {}/{}", spec.slice.number, spec.slice.count)
    } else {
        "unsliced".to_string()
    };

    println!("  {} {}", "Job".bold(), job.id.to_string().dimmed());
    println!("    {} {}", "Slice:".bold(), slice);
    if let Some(inventory) = &spec.inventory {
        println!("    {} {}", "Inventory:".bold(), inventory.name);
    }
    if !spec.options.limit.is_empty() {
        println!("    {} {}", "Limit:".bold(), spec.options.limit);
    }
    println!("    {} {}", "Task impact:".bold(), slicing::task_impact(spec));
    println!("    {} {}", "Instance groups:".bold(), groups.len());

    let meta = job_meta_vars(job, template.as_job());
    let names: Vec<&str> = meta.keys().map(String::as_str).collect();
    println!("    {} {}", "Meta variables:".bold(), names.join(", ").dimmed());
}
