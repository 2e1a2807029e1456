//! Admission gate
//!
//! Soft per-template ceiling on jobs waiting to run. The count and the launch
//! that follows are not atomic, so concurrent launches may overshoot slightly.

use tarmac_core::domain::job::Job;
use tarmac_core::domain::template::Template;
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionGate {
    max_jobs: usize,
}

impl AdmissionGate {
    pub fn new(max_jobs: usize) -> Self {
        Self { max_jobs }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.schedule_max_jobs)
    }

    /// Whether a new launch of `template` must be refused
    ///
    /// System templates are never blocked.
    pub fn is_blocked(&self, template: &Template, active_jobs: usize) -> bool {
        if matches!(template, Template::System(_)) {
            return false;
        }
        if active_jobs >= self.max_jobs {
            tracing::error!(
                "Job template {} could not be started because there are more than {} other jobs from that template waiting to run",
                template.name(),
                self.max_jobs
            );
            return true;
        }
        false
    }
}

/// Jobs of a template that are pending, waiting or running
pub fn count_active<'a>(jobs: impl IntoIterator<Item = &'a Job>, template_id: Uuid) -> usize {
    jobs.into_iter()
        .filter(|job| job.template_id == template_id && job.status.is_active())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::fixtures;
    use tarmac_core::domain::job::{JobStatus, LaunchType};
    use tarmac_core::domain::template::{SystemJobTemplate, SystemJobType};
    use tarmac_core::dto::plan::SystemJobSpec;

    #[test]
    fn test_blocks_at_ceiling() {
        let template: Template = fixtures::template(3).into();
        let gate = AdmissionGate::new(10);
        assert!(!gate.is_blocked(&template, 9));
        assert!(gate.is_blocked(&template, 10));
        assert!(gate.is_blocked(&template, 11));
    }

    #[test]
    fn test_system_templates_never_blocked() {
        let template: Template =
            SystemJobTemplate::new("cleanup", SystemJobType::CleanupJobs).into();
        assert!(!AdmissionGate::new(1).is_blocked(&template, 100));
    }

    #[test]
    fn test_count_active() {
        let template_id = Uuid::new_v4();
        let spec = SystemJobSpec {
            template_id,
            name: "cleanup".to_string(),
            job_type: SystemJobType::CleanupJobs,
            launch_type: LaunchType::Manual,
            extra_vars: Default::default(),
        };
        let mut jobs: Vec<Job> = (0..4).map(|_| Job::system(spec.clone())).collect();
        jobs[1].status = JobStatus::Running;
        jobs[2].status = JobStatus::Succeeded;
        jobs[3].template_id = Uuid::new_v4();

        assert_eq!(count_active(&jobs, template_id), 2);
        assert_eq!(AdmissionGate::from_config(&Config::default()), AdmissionGate::new(10));
    }
}
