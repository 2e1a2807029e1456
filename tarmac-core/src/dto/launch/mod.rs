//! Launch request DTOs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::host_summary::HostStatusFilter;
use crate::domain::job::LaunchType;
use crate::domain::prompt::LaunchOverrides;
use crate::dto::plan::Slice;

/// Error categories a caller may ask the resolver to suppress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Errors about fields the template does not prompt for
    Prompts,
    /// Errors about required survey answers that are missing
    Required,
}

/// Request to launch a template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchRequest {
    /// Proposed field overrides; `extra_vars` holds the proposed variables
    #[serde(flatten)]
    pub overrides: LaunchOverrides,

    /// Answers to survey questions, keyed by variable name
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub survey_answers: Map<String, Value>,

    /// Credential passwords supplied at launch, keyed by password field
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub credential_passwords: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub exclude_errors: BTreeSet<ErrorCategory>,

    /// Launch a single job even when the template slices
    pub prevent_slicing: bool,

    /// Slice to stamp on the single job when slicing is prevented
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_slice: Option<Slice>,

    pub launch_type: LaunchType,
}

impl LaunchRequest {
    pub fn new(overrides: LaunchOverrides) -> Self {
        Self {
            overrides,
            ..Default::default()
        }
    }

    pub fn excludes(&self, category: ErrorCategory) -> bool {
        self.exclude_errors.contains(&category)
    }

    /// Suppress an error category (builder pattern)
    pub fn excluding(mut self, category: ErrorCategory) -> Self {
        self.exclude_errors.insert(category);
        self
    }
}

/// Request to relaunch a finished job with its recorded overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaunchRequest {
    /// Restrict the new job to hosts of the original with this status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosts: Option<HostStatusFilter>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub credential_passwords: BTreeMap<String, String>,
}
