//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::plan::{JobSpec, SystemJobSpec, WorkflowSpec};

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Waiting,
    Running,
    Succeeded,
    Failed,
    Error,
    Cancelled,
}

impl JobStatus {
    /// Counted against the per-template concurrency ceiling
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobStatus::Pending | JobStatus::Waiting | JobStatus::Running
        )
    }

    pub fn is_finished(&self) -> bool {
        !self.is_active()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStatus::Pending => "pending",
            JobStatus::Waiting => "waiting",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Error => "error",
            JobStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// How a job was started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchType {
    #[default]
    Manual,
    Relaunch,
    Callback,
    Scheduled,
    Workflow,
}

/// What a job runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobDefinition {
    Playbook(JobSpec),
    System(SystemJobSpec),
}

/// Job record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub template_id: Uuid,

    /// Slice workflow this job belongs to
    pub workflow_id: Option<Uuid>,
    pub status: JobStatus,
    pub launch_type: LaunchType,
    pub requested_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub definition: JobDefinition,
}

impl Job {
    /// New pending playbook job
    pub fn playbook(spec: JobSpec, workflow_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id: spec.template_id,
            workflow_id,
            status: JobStatus::Pending,
            launch_type: spec.launch_type,
            requested_at: chrono::Utc::now(),
            finished_at: None,
            definition: JobDefinition::Playbook(spec),
        }
    }

    /// New pending system job
    pub fn system(spec: SystemJobSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id: spec.template_id,
            workflow_id: None,
            status: JobStatus::Pending,
            launch_type: spec.launch_type,
            requested_at: chrono::Utc::now(),
            finished_at: None,
            definition: JobDefinition::System(spec),
        }
    }

    pub fn spec(&self) -> Option<&JobSpec> {
        match &self.definition {
            JobDefinition::Playbook(spec) => Some(spec),
            JobDefinition::System(_) => None,
        }
    }
}

/// Parent record of a sliced launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowJob {
    pub id: Uuid,
    pub template_id: Uuid,
    pub status: JobStatus,
    pub requested_at: chrono::DateTime<chrono::Utc>,
    pub spec: WorkflowSpec,
}

impl WorkflowJob {
    pub fn new(spec: WorkflowSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id: spec.template_id,
            status: JobStatus::Pending,
            requested_at: chrono::Utc::now(),
            spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_statuses() {
        assert!(JobStatus::Pending.is_active());
        assert!(JobStatus::Waiting.is_active());
        assert!(JobStatus::Running.is_active());
        assert!(JobStatus::Succeeded.is_finished());
        assert!(JobStatus::Cancelled.is_finished());
        assert!(!JobStatus::Error.is_active());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&JobStatus::Waiting).unwrap();
        assert_eq!(json, "\"waiting\"");
        assert_eq!(JobStatus::Failed.to_string(), "failed");
        assert_eq!(LaunchType::default(), LaunchType::Manual);
    }
}
