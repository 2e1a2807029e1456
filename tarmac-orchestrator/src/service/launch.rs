//! Launch Service
//!
//! Resolves a launch request against a stored template and creates the jobs it
//! plans. Nothing is written unless the request resolves cleanly.

use tarmac_core::domain::job::{Job, WorkflowJob};
use tarmac_core::domain::launch_config::LaunchConfig;
use tarmac_core::domain::template::Template;
use tarmac_core::dto::launch::LaunchRequest;
use tarmac_core::dto::plan::LaunchPlan;
use tarmac_core::dto::resolution::ResolutionResult;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{LaunchError, Result};
use crate::launch::{AdmissionGate, ConfigResolver, slicing};
use crate::repository::{JobRepository, TemplateRepository};

/// Records created by a successful launch
#[derive(Debug, Clone)]
pub struct LaunchOutcome {
    pub plan: LaunchPlan,
    pub resolution: ResolutionResult,
    pub jobs: Vec<Job>,
    pub workflow: Option<WorkflowJob>,
}

/// Resolve a request without launching anything
pub async fn preview_launch<S>(
    store: &S,
    config: &Config,
    template_id: Uuid,
    request: &LaunchRequest,
) -> Result<ResolutionResult>
where
    S: TemplateRepository + ?Sized,
{
    let template = load_template(store, template_id).await?;
    Ok(ConfigResolver::from_config(config).resolve(&template, request))
}

/// Launch a template
pub async fn launch_job<S>(
    store: &S,
    config: &Config,
    template_id: Uuid,
    request: LaunchRequest,
) -> Result<LaunchOutcome>
where
    S: TemplateRepository + JobRepository + ?Sized,
{
    let template = load_template(store, template_id).await?;
    let (plan, resolution) = plan_launch(store, config, &template, &request).await?;
    persist_launch(store, &request, plan, resolution).await
}

pub(crate) async fn load_template<S>(store: &S, template_id: Uuid) -> Result<Template>
where
    S: TemplateRepository + ?Sized,
{
    store
        .find_template(template_id)
        .await?
        .ok_or(LaunchError::TemplateNotFound(template_id))
}

/// Admission check, resolution and planning
pub(crate) async fn plan_launch<S>(
    store: &S,
    config: &Config,
    template: &Template,
    request: &LaunchRequest,
) -> Result<(LaunchPlan, ResolutionResult)>
where
    S: JobRepository + ?Sized,
{
    let active = store.count_active(template.id()).await?;
    if AdmissionGate::from_config(config).is_blocked(template, active) {
        return Err(LaunchError::CapacityBlocked {
            template: template.name().to_string(),
            active,
        });
    }

    let resolution = ConfigResolver::from_config(config).resolve(template, request);
    if !resolution.launchable {
        tracing::info!(
            "Launch of template {} rejected with {} error(s)",
            template.name(),
            resolution.errors.len()
        );
        return Err(LaunchError::Rejected(resolution.errors));
    }

    let plan = slicing::plan(template, &resolution, request);
    Ok((plan, resolution))
}

/// Store the planned jobs and a launch config for each of them
pub(crate) async fn persist_launch<S>(
    store: &S,
    request: &LaunchRequest,
    plan: LaunchPlan,
    resolution: ResolutionResult,
) -> Result<LaunchOutcome>
where
    S: JobRepository + ?Sized,
{
    let (jobs, workflow) = match &plan {
        LaunchPlan::Single(spec) => (vec![Job::playbook(spec.clone(), None)], None),
        LaunchPlan::System(spec) => (vec![Job::system(spec.clone())], None),
        LaunchPlan::Sliced { workflow, slices } => {
            let workflow = WorkflowJob::new(workflow.clone());
            let jobs = slices
                .iter()
                .map(|spec| Job::playbook(spec.clone(), Some(workflow.id)))
                .collect();
            (jobs, Some(workflow))
        }
    };

    if let Some(workflow) = &workflow {
        store.create_workflow(workflow.clone()).await?;
    }
    for job in &jobs {
        store.create_job(job.clone()).await?;
        store
            .save_launch_config(LaunchConfig::capture(
                job.id,
                request.launch_type,
                &resolution.accepted,
                &resolution.survey_passwords,
            ))
            .await?;
    }

    tracing::info!(
        "Launched {} job(s) for template {}",
        jobs.len(),
        jobs.first().map(|job| job.template_id).unwrap_or_default()
    );

    Ok(LaunchOutcome {
        plan,
        resolution,
        jobs,
        workflow,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::fixtures;
    use crate::repository::InMemoryStore;
    use tarmac_core::domain::job::JobStatus;
    use tarmac_core::domain::prompt::LaunchOverrides;

    async fn store_with(template: impl Into<Template>) -> (InMemoryStore, Uuid) {
        let template = template.into();
        let id = template.id();
        let store = InMemoryStore::new();
        store.save_template(template).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_launch_single_job_records_config() {
        let mut template = fixtures::template(3);
        template.ask.ask_limit_on_launch = true;
        let (store, id) = store_with(template).await;

        let request = LaunchRequest::new(LaunchOverrides {
            limit: Some("web*".to_string()),
            ..Default::default()
        });
        let outcome = launch_job(&store, &Config::default(), id, request).await.unwrap();

        assert_eq!(outcome.jobs.len(), 1);
        assert!(outcome.workflow.is_none());
        let job = &outcome.jobs[0];
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.spec().unwrap().options.limit, "web*");

        let config = store.find_launch_config(job.id).await.unwrap().unwrap();
        assert_eq!(config.overrides().limit.as_deref(), Some("web*"));
    }

    #[tokio::test]
    async fn test_rejected_launch_persists_nothing() {
        let (store, id) = store_with(fixtures::template(3)).await;
        let request = LaunchRequest::new(LaunchOverrides {
            limit: Some("web*".to_string()),
            ..Default::default()
        });

        let err = launch_job(&store, &Config::default(), id, request).await.unwrap_err();
        match err {
            LaunchError::Rejected(errors) => assert!(errors.contains_key("limit")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_sliced_launch_creates_workflow() {
        let mut template = fixtures::template(5);
        template.job_slice_count = 3;
        let (store, id) = store_with(template).await;

        let outcome = launch_job(&store, &Config::default(), id, LaunchRequest::default())
            .await
            .unwrap();

        let workflow = outcome.workflow.unwrap();
        assert_eq!(outcome.jobs.len(), 3);
        assert!(store.find_workflow(workflow.id).await.is_some());
        let slices: Vec<u32> = store
            .jobs_for_workflow(workflow.id)
            .await
            .unwrap()
            .iter()
            .map(|job| job.spec().unwrap().slice.number)
            .collect();
        assert_eq!(slices, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_capacity_blocks_launch() {
        let (store, id) = store_with(fixtures::template(3)).await;
        let config = Config {
            schedule_max_jobs: 1,
            ..Config::default()
        };

        launch_job(&store, &config, id, LaunchRequest::default()).await.unwrap();
        let err = launch_job(&store, &config, id, LaunchRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::CapacityBlocked { active: 1, .. }));
    }

    #[tokio::test]
    async fn test_unknown_template() {
        let store = InMemoryStore::new();
        let err = preview_launch(&store, &Config::default(), Uuid::new_v4(), &LaunchRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
