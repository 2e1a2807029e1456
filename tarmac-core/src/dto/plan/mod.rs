//! Launch plan DTOs
//!
//! A plan is the fully resolved description of the job or jobs a launch creates.
//! Specs carry no persistent ids; the orchestrator assigns those when it stores
//! the jobs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::job::LaunchType;
use crate::domain::resource::{Credential, Inventory, Project};
use crate::domain::template::{JobOptions, SystemJobType};

/// Position of a job within a sliced launch
///
/// Slices are numbered from 1. An unsliced job is `{ number: 0, count: 1 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    pub number: u32,
    pub count: u32,
}

impl Slice {
    pub const UNSLICED: Slice = Slice {
        number: 0,
        count: 1,
    };

    pub fn is_sliced(&self) -> bool {
        self.count > 1
    }
}

impl Default for Slice {
    fn default() -> Self {
        Slice::UNSLICED
    }
}

/// Concrete configuration of one playbook job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub template_id: Uuid,
    pub name: String,
    pub launch_type: LaunchType,
    pub options: JobOptions,
    pub inventory: Option<Inventory>,
    pub project: Option<Project>,
    pub execution_environment: Option<Uuid>,
    pub credentials: Vec<Credential>,
    pub labels: Vec<Uuid>,

    /// Instance groups chosen at launch; `None` when the template's own are used
    pub instance_groups: Option<Vec<Uuid>>,
    pub prevent_instance_group_fallback: bool,

    /// Survey password variables and their redacted value
    #[serde(default)]
    pub survey_passwords: BTreeMap<String, String>,

    #[serde(default)]
    pub slice: Slice,
}

/// Parent of a sliced launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub template_id: Uuid,
    pub name: String,
    pub launch_type: LaunchType,
    pub slice_count: u32,
    pub inventory: Option<Inventory>,
    pub extra_vars: Map<String, Value>,
}

/// Concrete configuration of one system job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemJobSpec {
    pub template_id: Uuid,
    pub name: String,
    pub job_type: SystemJobType,
    pub launch_type: LaunchType,
    pub extra_vars: Map<String, Value>,
}

/// Everything one launch creates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum LaunchPlan {
    Single(JobSpec),
    Sliced {
        workflow: WorkflowSpec,
        slices: Vec<JobSpec>,
    },
    System(SystemJobSpec),
}

impl LaunchPlan {
    /// Number of jobs the plan creates, not counting a slice workflow
    pub fn job_count(&self) -> usize {
        match self {
            LaunchPlan::Single(_) | LaunchPlan::System(_) => 1,
            LaunchPlan::Sliced { slices, .. } => slices.len(),
        }
    }

    /// Playbook job specs in creation order
    pub fn job_specs(&self) -> Vec<&JobSpec> {
        match self {
            LaunchPlan::Single(spec) => vec![spec],
            LaunchPlan::Sliced { slices, .. } => slices.iter().collect(),
            LaunchPlan::System(_) => Vec::new(),
        }
    }
}
