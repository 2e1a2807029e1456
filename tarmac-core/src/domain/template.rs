//! Template domain types
//!
//! A template is a reusable job definition. Job templates run playbooks against
//! an inventory; system job templates run fixed maintenance commands. Each kind
//! has its own, fixed set of fields that may be overridden at launch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::resource::{Credential, Inventory, NotificationTemplates, Project};
use crate::domain::survey::SurveySpec;

/// Playbook job type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    #[default]
    Run,
    Check,
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobType::Run => write!(f, "run"),
            JobType::Check => write!(f, "check"),
        }
    }
}

/// Maintenance command run by a system job template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemJobType {
    CleanupJobs,
    CleanupActivitystream,
    CleanupSessions,
    CleanupTokens,
}

impl SystemJobType {
    /// Whether the command takes a `days` retention argument
    pub fn takes_days(&self) -> bool {
        matches!(
            self,
            SystemJobType::CleanupJobs | SystemJobType::CleanupActivitystream
        )
    }
}

/// Options shared by job templates and the jobs launched from them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    pub job_type: JobType,
    pub playbook: String,

    /// Branch to run; the project default is used when empty
    pub scm_branch: String,

    /// Parallel processes; 0 means the runner default
    pub forks: u32,
    pub limit: String,
    pub verbosity: u8,
    pub extra_vars: Map<String, Value>,
    pub job_tags: String,
    pub skip_tags: String,
    pub start_at_task: String,
    pub force_handlers: bool,
    pub become_enabled: bool,
    pub allow_simultaneous: bool,

    /// Seconds before the job is cancelled; 0 means no timeout
    pub timeout: i64,
    pub use_fact_cache: bool,
    pub diff_mode: bool,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            job_type: JobType::Run,
            playbook: String::new(),
            scm_branch: String::new(),
            forks: 0,
            limit: String::new(),
            verbosity: 0,
            extra_vars: Map::new(),
            job_tags: String::new(),
            skip_tags: String::new(),
            start_at_task: String::new(),
            force_handlers: false,
            become_enabled: false,
            allow_simultaneous: false,
            timeout: 0,
            use_fact_cache: false,
            diff_mode: false,
        }
    }
}

/// Permission to override a field at launch time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AskFlag {
    Variables,
    Inventory,
    ScmBranch,
    Limit,
    Tags,
    SkipTags,
    JobType,
    Verbosity,
    DiffMode,
    Credential,
    ExecutionEnvironment,
    Labels,
    Forks,
    JobSliceCount,
    Timeout,
    InstanceGroups,
}

impl AskFlag {
    /// Name of the template attribute holding this flag
    pub fn attribute(&self) -> &'static str {
        match self {
            AskFlag::Variables => "ask_variables_on_launch",
            AskFlag::Inventory => "ask_inventory_on_launch",
            AskFlag::ScmBranch => "ask_scm_branch_on_launch",
            AskFlag::Limit => "ask_limit_on_launch",
            AskFlag::Tags => "ask_tags_on_launch",
            AskFlag::SkipTags => "ask_skip_tags_on_launch",
            AskFlag::JobType => "ask_job_type_on_launch",
            AskFlag::Verbosity => "ask_verbosity_on_launch",
            AskFlag::DiffMode => "ask_diff_mode_on_launch",
            AskFlag::Credential => "ask_credential_on_launch",
            AskFlag::ExecutionEnvironment => "ask_execution_environment_on_launch",
            AskFlag::Labels => "ask_labels_on_launch",
            AskFlag::Forks => "ask_forks_on_launch",
            AskFlag::JobSliceCount => "ask_job_slice_count_on_launch",
            AskFlag::Timeout => "ask_timeout_on_launch",
            AskFlag::InstanceGroups => "ask_instance_groups_on_launch",
        }
    }
}

/// Launch-time override permissions of a job template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AskFlags {
    pub ask_variables_on_launch: bool,
    pub ask_inventory_on_launch: bool,
    pub ask_scm_branch_on_launch: bool,
    pub ask_limit_on_launch: bool,
    pub ask_tags_on_launch: bool,
    pub ask_skip_tags_on_launch: bool,
    pub ask_job_type_on_launch: bool,
    pub ask_verbosity_on_launch: bool,
    pub ask_diff_mode_on_launch: bool,
    pub ask_credential_on_launch: bool,
    pub ask_execution_environment_on_launch: bool,
    pub ask_labels_on_launch: bool,
    pub ask_forks_on_launch: bool,
    pub ask_job_slice_count_on_launch: bool,
    pub ask_timeout_on_launch: bool,
    pub ask_instance_groups_on_launch: bool,
}

impl AskFlags {
    pub fn is_set(&self, flag: AskFlag) -> bool {
        match flag {
            AskFlag::Variables => self.ask_variables_on_launch,
            AskFlag::Inventory => self.ask_inventory_on_launch,
            AskFlag::ScmBranch => self.ask_scm_branch_on_launch,
            AskFlag::Limit => self.ask_limit_on_launch,
            AskFlag::Tags => self.ask_tags_on_launch,
            AskFlag::SkipTags => self.ask_skip_tags_on_launch,
            AskFlag::JobType => self.ask_job_type_on_launch,
            AskFlag::Verbosity => self.ask_verbosity_on_launch,
            AskFlag::DiffMode => self.ask_diff_mode_on_launch,
            AskFlag::Credential => self.ask_credential_on_launch,
            AskFlag::ExecutionEnvironment => self.ask_execution_environment_on_launch,
            AskFlag::Labels => self.ask_labels_on_launch,
            AskFlag::Forks => self.ask_forks_on_launch,
            AskFlag::JobSliceCount => self.ask_job_slice_count_on_launch,
            AskFlag::Timeout => self.ask_timeout_on_launch,
            AskFlag::InstanceGroups => self.ask_instance_groups_on_launch,
        }
    }

    /// Set a flag (builder pattern)
    pub fn with(mut self, flag: AskFlag, value: bool) -> Self {
        let slot = match flag {
            AskFlag::Variables => &mut self.ask_variables_on_launch,
            AskFlag::Inventory => &mut self.ask_inventory_on_launch,
            AskFlag::ScmBranch => &mut self.ask_scm_branch_on_launch,
            AskFlag::Limit => &mut self.ask_limit_on_launch,
            AskFlag::Tags => &mut self.ask_tags_on_launch,
            AskFlag::SkipTags => &mut self.ask_skip_tags_on_launch,
            AskFlag::JobType => &mut self.ask_job_type_on_launch,
            AskFlag::Verbosity => &mut self.ask_verbosity_on_launch,
            AskFlag::DiffMode => &mut self.ask_diff_mode_on_launch,
            AskFlag::Credential => &mut self.ask_credential_on_launch,
            AskFlag::ExecutionEnvironment => &mut self.ask_execution_environment_on_launch,
            AskFlag::Labels => &mut self.ask_labels_on_launch,
            AskFlag::Forks => &mut self.ask_forks_on_launch,
            AskFlag::JobSliceCount => &mut self.ask_job_slice_count_on_launch,
            AskFlag::Timeout => &mut self.ask_timeout_on_launch,
            AskFlag::InstanceGroups => &mut self.ask_instance_groups_on_launch,
        };
        *slot = value;
        self
    }

    /// Whether any field may be overridden at launch
    pub fn any(&self) -> bool {
        [
            self.ask_variables_on_launch,
            self.ask_inventory_on_launch,
            self.ask_scm_branch_on_launch,
            self.ask_limit_on_launch,
            self.ask_tags_on_launch,
            self.ask_skip_tags_on_launch,
            self.ask_job_type_on_launch,
            self.ask_verbosity_on_launch,
            self.ask_diff_mode_on_launch,
            self.ask_credential_on_launch,
            self.ask_execution_environment_on_launch,
            self.ask_labels_on_launch,
            self.ask_forks_on_launch,
            self.ask_job_slice_count_on_launch,
            self.ask_timeout_on_launch,
            self.ask_instance_groups_on_launch,
        ]
        .into_iter()
        .any(|flag| flag)
    }
}

fn default_slice_count() -> u32 {
    1
}

/// Playbook job template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub organization_id: Option<Uuid>,

    #[serde(flatten)]
    pub options: JobOptions,

    #[serde(flatten)]
    pub ask: AskFlags,

    #[serde(default)]
    pub inventory: Option<Inventory>,
    #[serde(default)]
    pub project: Option<Project>,
    #[serde(default)]
    pub execution_environment: Option<Uuid>,

    #[serde(default)]
    pub credentials: Vec<Credential>,
    #[serde(default)]
    pub labels: Vec<Uuid>,

    /// Preferred instance groups, in priority order
    #[serde(default)]
    pub instance_groups: Vec<Uuid>,
    #[serde(default)]
    pub prevent_instance_group_fallback: bool,

    #[serde(default)]
    pub survey_enabled: bool,
    #[serde(default)]
    pub survey_spec: SurveySpec,

    /// Number of jobs to slice into at runtime
    #[serde(default = "default_slice_count")]
    pub job_slice_count: u32,

    /// Key that provisioning callbacks must present
    #[serde(default)]
    pub host_config_key: String,

    #[serde(default)]
    pub notifications: NotificationTemplates,
}

impl JobTemplate {
    /// Create a template with default options and no linked resources
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            organization_id: None,
            options: JobOptions::default(),
            ask: AskFlags::default(),
            inventory: None,
            project: None,
            execution_environment: None,
            credentials: Vec::new(),
            labels: Vec::new(),
            instance_groups: Vec::new(),
            prevent_instance_group_fallback: false,
            survey_enabled: false,
            survey_spec: SurveySpec::default(),
            job_slice_count: 1,
            host_config_key: String::new(),
            notifications: NotificationTemplates::default(),
        }
    }

    /// Whether a non-empty survey governs the accepted variables
    pub fn survey_active(&self) -> bool {
        self.survey_enabled && !self.survey_spec.is_empty()
    }

    /// Password fields the assigned credentials still need to start a job
    pub fn passwords_needed_to_start(&self) -> Vec<String> {
        self.credentials
            .iter()
            .flat_map(|cred| cred.passwords_needed.iter().cloned())
            .collect()
    }

    /// Mandatory linked resources that are not set
    pub fn resources_needed_to_start(&self) -> Vec<&'static str> {
        let mut needed = Vec::new();
        if self.project.is_none() {
            needed.push("project");
        }
        if self.inventory.is_none() {
            needed.push("inventory");
        }
        needed
    }
}

/// System job template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemJobTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub job_type: SystemJobType,
    #[serde(default)]
    pub extra_vars: Map<String, Value>,
    #[serde(default)]
    pub notifications: NotificationTemplates,
}

impl SystemJobTemplate {
    pub fn new(name: impl Into<String>, job_type: SystemJobType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            job_type,
            extra_vars: Map::new(),
            notifications: NotificationTemplates::default(),
        }
    }
}

/// Template kind; each kind has its own overridable field set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Job,
    System,
}

/// Any launchable template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Template {
    Job(JobTemplate),
    System(SystemJobTemplate),
}

impl Template {
    pub fn id(&self) -> Uuid {
        match self {
            Template::Job(t) => t.id,
            Template::System(t) => t.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Template::Job(t) => &t.name,
            Template::System(t) => &t.name,
        }
    }

    pub fn kind(&self) -> TemplateKind {
        match self {
            Template::Job(_) => TemplateKind::Job,
            Template::System(_) => TemplateKind::System,
        }
    }

    /// Whether the template lets callers override the field behind `flag`
    ///
    /// System templates have no ask flags; their variables are always open to
    /// prompting and filtered by an allow-list instead.
    pub fn asks(&self, flag: AskFlag) -> bool {
        match self {
            Template::Job(t) => t.ask.is_set(flag),
            Template::System(_) => flag == AskFlag::Variables,
        }
    }

    pub fn extra_vars(&self) -> &Map<String, Value> {
        match self {
            Template::Job(t) => &t.options.extra_vars,
            Template::System(t) => &t.extra_vars,
        }
    }

    pub fn as_job(&self) -> Option<&JobTemplate> {
        match self {
            Template::Job(t) => Some(t),
            Template::System(_) => None,
        }
    }
}

impl From<JobTemplate> for Template {
    fn from(template: JobTemplate) -> Self {
        Template::Job(template)
    }
}

impl From<SystemJobTemplate> for Template {
    fn from(template: SystemJobTemplate) -> Self {
        Template::System(template)
    }
}
