//! Job repository
//!
//! Stores jobs, slice workflows and the launch configuration recorded for each
//! job.

use anyhow::Result;
use async_trait::async_trait;
use tarmac_core::domain::job::{Job, JobStatus, WorkflowJob};
use tarmac_core::domain::launch_config::LaunchConfig;
use uuid::Uuid;

/// Repository trait for job records
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Counts jobs of a template that are pending, waiting or running
    async fn count_active(&self, template_id: Uuid) -> Result<usize>;

    async fn create_job(&self, job: Job) -> Result<()>;

    async fn create_workflow(&self, workflow: WorkflowJob) -> Result<()>;

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>>;

    /// Jobs spawned by a slice workflow, in slice order
    async fn jobs_for_workflow(&self, workflow_id: Uuid) -> Result<Vec<Job>>;

    /// Records the launch configuration of a job
    ///
    /// A job has at most one; saving a second one replaces the first.
    async fn save_launch_config(&self, config: LaunchConfig) -> Result<()>;

    async fn find_launch_config(&self, job_id: Uuid) -> Result<Option<LaunchConfig>>;

    /// Updates the job status
    ///
    /// Sets `finished_at` when the new status is final. Returns `None` when the
    /// job does not exist.
    async fn update_status(&self, id: Uuid, status: JobStatus) -> Result<Option<Job>>;
}
