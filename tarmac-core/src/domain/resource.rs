//! Linked resource snapshots
//!
//! Inventories, projects and credentials are owned by other services. Templates
//! and launch requests carry read-only snapshots of the attributes the launch
//! engine needs from them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Organization snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,

    /// Instance groups preferred by the organization, in priority order
    #[serde(default)]
    pub instance_groups: Vec<Uuid>,

    #[serde(default)]
    pub notifications: NotificationTemplates,
}

/// Inventory snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: Uuid,
    pub name: String,

    /// Number of hosts currently in the inventory
    pub host_count: u64,

    #[serde(default)]
    pub organization_id: Option<Uuid>,

    /// Instance groups preferred by this inventory, in priority order
    #[serde(default)]
    pub instance_groups: Vec<Uuid>,

    #[serde(default)]
    pub prevent_instance_group_fallback: bool,
}

/// Inventory host with its cached facts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub name: String,
    pub inventory_id: Uuid,
    #[serde(default)]
    pub facts: Map<String, Value>,
    #[serde(default)]
    pub facts_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// New facts for a host, collected after a job ran
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactUpdate {
    pub host_name: String,

    /// Empty when the facts were cleared
    pub facts: Map<String, Value>,
    pub modified_at: chrono::DateTime<chrono::Utc>,
}

/// Project snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,

    /// Default branch of the project
    #[serde(default)]
    pub scm_branch: String,

    /// Revision the project is currently checked out at
    #[serde(default)]
    pub scm_revision: String,

    /// Whether jobs may run a branch other than `scm_branch`
    #[serde(default)]
    pub allow_override: bool,

    #[serde(default)]
    pub organization_id: Option<Uuid>,

    #[serde(default)]
    pub notifications: NotificationTemplates,
}

/// Kind of a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Ssh,
    Net,
    Cloud,
    Vault,
    Scm,
    Insights,
    Kubernetes,
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CredentialKind::Ssh => "ssh",
            CredentialKind::Net => "net",
            CredentialKind::Cloud => "cloud",
            CredentialKind::Vault => "vault",
            CredentialKind::Scm => "scm",
            CredentialKind::Insights => "insights",
            CredentialKind::Kubernetes => "kubernetes",
        };
        write!(f, "{}", name)
    }
}

/// Credential snapshot
///
/// Credentials are compared by `id` when computing launch-time deltas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: Uuid,
    pub name: String,
    pub kind: CredentialKind,

    /// Password fields that must be supplied when a job using this credential starts
    #[serde(default)]
    pub passwords_needed: Vec<String>,
}

/// Notification templates attached to a template, project or organization,
/// grouped by the job event that triggers them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTemplates {
    #[serde(default)]
    pub error: BTreeSet<Uuid>,
    #[serde(default)]
    pub started: BTreeSet<Uuid>,
    #[serde(default)]
    pub success: BTreeSet<Uuid>,
}

impl NotificationTemplates {
    /// Add every template of `other` to the matching trigger list
    pub fn merge(&mut self, other: &NotificationTemplates) {
        self.error.extend(other.error.iter().copied());
        self.started.extend(other.started.iter().copied());
        self.success.extend(other.success.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.error.is_empty() && self.started.is_empty() && self.success.is_empty()
    }
}
