//! Error types for launch services

use tarmac_core::domain::host_summary::InvalidStatusFilter;
use tarmac_core::domain::prompt::PromptField;
use tarmac_core::dto::resolution::ErrorMap;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, LaunchError>;

/// Errors returned by the launch, relaunch, host summary and fact cache services
///
/// Field-level problems are not errors: they are reported in a `ResolutionResult`.
/// `Rejected` wraps those when a caller asked to actually launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Template not found: {0}")]
    TemplateNotFound(Uuid),

    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    /// Too many jobs of the template are already waiting to run
    #[error(
        "Job template {template} could not be started because there are {active} other jobs from that template waiting to run"
    )]
    CapacityBlocked { template: String, active: usize },

    /// The launch request did not resolve to a launchable configuration
    #[error("Launch rejected: {}", format_errors(.0))]
    Rejected(ErrorMap),

    /// The template no longer prompts for fields the job was launched with
    #[error("Relaunch blocked, no longer prompted on launch: {}", format_fields(.0))]
    RelaunchBlocked(Vec<PromptField>),

    #[error(transparent)]
    InvalidStatusFilter(#[from] InvalidStatusFilter),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Repository error: {0}")]
    Repository(#[from] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LaunchError {
    /// Check if this error means a stored record is missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TemplateNotFound(_) | Self::JobNotFound(_))
    }
}

fn format_errors(errors: &ErrorMap) -> String {
    errors
        .iter()
        .map(|(key, violations)| {
            let messages: Vec<&str> = violations.iter().map(|v| v.message.as_str()).collect();
            format!("{}: {}", key, messages.join(" "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_fields(fields: &[PromptField]) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}
