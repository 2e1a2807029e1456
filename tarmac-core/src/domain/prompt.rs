//! Prompt fields and values
//!
//! Every field a template may let callers override at launch is a `PromptField`.
//! A `FieldValue` is a typed value for exactly one of those fields, and
//! `LaunchOverrides` holds at most one value per field. The same shape is used for
//! requested, accepted and rejected overrides and for the stored launch config.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::resource::{Credential, Inventory};
use crate::domain::template::{JobTemplate, JobType};

/// A field that can be overridden at launch time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptField {
    ExtraVars,
    Inventory,
    ScmBranch,
    Limit,
    JobTags,
    SkipTags,
    JobType,
    Verbosity,
    DiffMode,
    Credentials,
    ExecutionEnvironment,
    Labels,
    Forks,
    JobSliceCount,
    Timeout,
    InstanceGroups,
}

impl PromptField {
    pub fn name(&self) -> &'static str {
        match self {
            PromptField::ExtraVars => "extra_vars",
            PromptField::Inventory => "inventory",
            PromptField::ScmBranch => "scm_branch",
            PromptField::Limit => "limit",
            PromptField::JobTags => "job_tags",
            PromptField::SkipTags => "skip_tags",
            PromptField::JobType => "job_type",
            PromptField::Verbosity => "verbosity",
            PromptField::DiffMode => "diff_mode",
            PromptField::Credentials => "credentials",
            PromptField::ExecutionEnvironment => "execution_environment",
            PromptField::Labels => "labels",
            PromptField::Forks => "forks",
            PromptField::JobSliceCount => "job_slice_count",
            PromptField::Timeout => "timeout",
            PromptField::InstanceGroups => "instance_groups",
        }
    }

    /// Whether the field holds a selection of related objects
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            PromptField::Credentials | PromptField::Labels | PromptField::InstanceGroups
        )
    }
}

impl std::fmt::Display for PromptField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A typed value for one prompt field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    ExtraVars(Map<String, Value>),
    Inventory(Inventory),
    ScmBranch(String),
    Limit(String),
    JobTags(String),
    SkipTags(String),
    JobType(JobType),
    Verbosity(u8),
    DiffMode(bool),
    Credentials(Vec<Credential>),
    ExecutionEnvironment(Uuid),
    Labels(Vec<Uuid>),
    Forks(u32),
    JobSliceCount(u32),
    Timeout(i64),
    InstanceGroups(Vec<Uuid>),
}

impl FieldValue {
    pub fn field(&self) -> PromptField {
        match self {
            FieldValue::ExtraVars(_) => PromptField::ExtraVars,
            FieldValue::Inventory(_) => PromptField::Inventory,
            FieldValue::ScmBranch(_) => PromptField::ScmBranch,
            FieldValue::Limit(_) => PromptField::Limit,
            FieldValue::JobTags(_) => PromptField::JobTags,
            FieldValue::SkipTags(_) => PromptField::SkipTags,
            FieldValue::JobType(_) => PromptField::JobType,
            FieldValue::Verbosity(_) => PromptField::Verbosity,
            FieldValue::DiffMode(_) => PromptField::DiffMode,
            FieldValue::Credentials(_) => PromptField::Credentials,
            FieldValue::ExecutionEnvironment(_) => PromptField::ExecutionEnvironment,
            FieldValue::Labels(_) => PromptField::Labels,
            FieldValue::Forks(_) => PromptField::Forks,
            FieldValue::JobSliceCount(_) => PromptField::JobSliceCount,
            FieldValue::Timeout(_) => PromptField::Timeout,
            FieldValue::InstanceGroups(_) => PromptField::InstanceGroups,
        }
    }

    /// Ids of the related objects for multi-valued fields, in stored order
    pub fn ids(&self) -> Option<Vec<Uuid>> {
        match self {
            FieldValue::Credentials(creds) => Some(creds.iter().map(|c| c.id).collect()),
            FieldValue::Labels(ids) | FieldValue::InstanceGroups(ids) => Some(ids.clone()),
            _ => None,
        }
    }

    /// Scalar equality; inventories are the same when their ids match
    pub fn same_value(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Inventory(a), FieldValue::Inventory(b)) => a.id == b.id,
            _ => self == other,
        }
    }

    /// Whether a multi-valued field holds an empty selection
    pub fn is_empty_selection(&self) -> bool {
        match self {
            FieldValue::Credentials(creds) => creds.is_empty(),
            FieldValue::Labels(ids) | FieldValue::InstanceGroups(ids) => ids.is_empty(),
            _ => false,
        }
    }

    /// JSON rendering used for display and error reporting
    pub fn to_json(&self) -> Value {
        let rendered = match self {
            FieldValue::ExtraVars(vars) => Ok(Value::Object(vars.clone())),
            FieldValue::Inventory(inv) => serde_json::to_value(inv),
            FieldValue::ScmBranch(s)
            | FieldValue::Limit(s)
            | FieldValue::JobTags(s)
            | FieldValue::SkipTags(s) => Ok(Value::String(s.clone())),
            FieldValue::JobType(job_type) => Ok(Value::String(job_type.to_string())),
            FieldValue::Verbosity(v) => Ok(Value::from(*v)),
            FieldValue::DiffMode(b) => Ok(Value::Bool(*b)),
            FieldValue::Credentials(creds) => serde_json::to_value(creds),
            FieldValue::ExecutionEnvironment(id) => Ok(Value::String(id.to_string())),
            FieldValue::Labels(ids) | FieldValue::InstanceGroups(ids) => serde_json::to_value(ids),
            FieldValue::Forks(v) | FieldValue::JobSliceCount(v) => Ok(Value::from(*v)),
            FieldValue::Timeout(v) => Ok(Value::from(*v)),
        };
        rendered.unwrap_or(Value::Null)
    }
}

/// At most one value per prompt field
///
/// `None` means the field was not provided.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_vars: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Inventory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scm_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Vec<Credential>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_environment: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_slice_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_groups: Option<Vec<Uuid>>,
}

impl LaunchOverrides {
    pub fn get(&self, field: PromptField) -> Option<FieldValue> {
        match field {
            PromptField::ExtraVars => self.extra_vars.clone().map(FieldValue::ExtraVars),
            PromptField::Inventory => self.inventory.clone().map(FieldValue::Inventory),
            PromptField::ScmBranch => self.scm_branch.clone().map(FieldValue::ScmBranch),
            PromptField::Limit => self.limit.clone().map(FieldValue::Limit),
            PromptField::JobTags => self.job_tags.clone().map(FieldValue::JobTags),
            PromptField::SkipTags => self.skip_tags.clone().map(FieldValue::SkipTags),
            PromptField::JobType => self.job_type.map(FieldValue::JobType),
            PromptField::Verbosity => self.verbosity.map(FieldValue::Verbosity),
            PromptField::DiffMode => self.diff_mode.map(FieldValue::DiffMode),
            PromptField::Credentials => self.credentials.clone().map(FieldValue::Credentials),
            PromptField::ExecutionEnvironment => self
                .execution_environment
                .map(FieldValue::ExecutionEnvironment),
            PromptField::Labels => self.labels.clone().map(FieldValue::Labels),
            PromptField::Forks => self.forks.map(FieldValue::Forks),
            PromptField::JobSliceCount => self.job_slice_count.map(FieldValue::JobSliceCount),
            PromptField::Timeout => self.timeout.map(FieldValue::Timeout),
            PromptField::InstanceGroups => {
                self.instance_groups.clone().map(FieldValue::InstanceGroups)
            }
        }
    }

    pub fn set(&mut self, value: FieldValue) {
        match value {
            FieldValue::ExtraVars(v) => self.extra_vars = Some(v),
            FieldValue::Inventory(v) => self.inventory = Some(v),
            FieldValue::ScmBranch(v) => self.scm_branch = Some(v),
            FieldValue::Limit(v) => self.limit = Some(v),
            FieldValue::JobTags(v) => self.job_tags = Some(v),
            FieldValue::SkipTags(v) => self.skip_tags = Some(v),
            FieldValue::JobType(v) => self.job_type = Some(v),
            FieldValue::Verbosity(v) => self.verbosity = Some(v),
            FieldValue::DiffMode(v) => self.diff_mode = Some(v),
            FieldValue::Credentials(v) => self.credentials = Some(v),
            FieldValue::ExecutionEnvironment(v) => self.execution_environment = Some(v),
            FieldValue::Labels(v) => self.labels = Some(v),
            FieldValue::Forks(v) => self.forks = Some(v),
            FieldValue::JobSliceCount(v) => self.job_slice_count = Some(v),
            FieldValue::Timeout(v) => self.timeout = Some(v),
            FieldValue::InstanceGroups(v) => self.instance_groups = Some(v),
        }
    }

    pub fn contains(&self, field: PromptField) -> bool {
        self.get(field).is_some()
    }

    /// All provided values, in field order
    pub fn values(&self) -> Vec<FieldValue> {
        ALL_FIELDS.iter().filter_map(|field| self.get(*field)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}

const ALL_FIELDS: [PromptField; 16] = [
    PromptField::ExtraVars,
    PromptField::Inventory,
    PromptField::ScmBranch,
    PromptField::Limit,
    PromptField::JobTags,
    PromptField::SkipTags,
    PromptField::JobType,
    PromptField::Verbosity,
    PromptField::DiffMode,
    PromptField::Credentials,
    PromptField::ExecutionEnvironment,
    PromptField::Labels,
    PromptField::Forks,
    PromptField::JobSliceCount,
    PromptField::Timeout,
    PromptField::InstanceGroups,
];

impl JobTemplate {
    /// Current template value of a prompt field
    ///
    /// Returns `None` for unset links (no inventory, no execution environment).
    pub fn prompt_value(&self, field: PromptField) -> Option<FieldValue> {
        let options = &self.options;
        match field {
            PromptField::ExtraVars => Some(FieldValue::ExtraVars(options.extra_vars.clone())),
            PromptField::Inventory => self.inventory.clone().map(FieldValue::Inventory),
            PromptField::ScmBranch => Some(FieldValue::ScmBranch(options.scm_branch.clone())),
            PromptField::Limit => Some(FieldValue::Limit(options.limit.clone())),
            PromptField::JobTags => Some(FieldValue::JobTags(options.job_tags.clone())),
            PromptField::SkipTags => Some(FieldValue::SkipTags(options.skip_tags.clone())),
            PromptField::JobType => Some(FieldValue::JobType(options.job_type)),
            PromptField::Verbosity => Some(FieldValue::Verbosity(options.verbosity)),
            PromptField::DiffMode => Some(FieldValue::DiffMode(options.diff_mode)),
            PromptField::Credentials => Some(FieldValue::Credentials(self.credentials.clone())),
            PromptField::ExecutionEnvironment => self
                .execution_environment
                .map(FieldValue::ExecutionEnvironment),
            PromptField::Labels => Some(FieldValue::Labels(self.labels.clone())),
            PromptField::Forks => Some(FieldValue::Forks(options.forks)),
            PromptField::JobSliceCount => Some(FieldValue::JobSliceCount(self.job_slice_count)),
            PromptField::Timeout => Some(FieldValue::Timeout(options.timeout)),
            PromptField::InstanceGroups => {
                Some(FieldValue::InstanceGroups(self.instance_groups.clone()))
            }
        }
    }
}
