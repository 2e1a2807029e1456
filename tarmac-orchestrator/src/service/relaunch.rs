//! Relaunch Service
//!
//! Replays the overrides recorded for a job against its template as the
//! template is configured today.

use std::collections::BTreeMap;

use tarmac_core::domain::host_summary::HostStatusFilter;
use tarmac_core::domain::job::{Job, LaunchType};
use tarmac_core::domain::launch_config::LaunchConfig;
use tarmac_core::dto::launch::{LaunchRequest, RelaunchRequest};
use tarmac_core::dto::plan::LaunchPlan;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{LaunchError, Result};
use crate::launch::TemplatePolicySnapshot;
use crate::launch::relaunch::unprompted_fields;
use crate::repository::{HostSummaryRepository, JobRepository, TemplateRepository};
use crate::service::launch::{LaunchOutcome, load_template, persist_launch, plan_launch};

/// Relaunch a job with the overrides it was launched with
///
/// A job from a sliced launch is relaunched alone, keeping its slice. With a
/// host filter the new job is limited to the matching hosts of the original.
pub async fn relaunch_job<S>(
    store: &S,
    config: &Config,
    job_id: Uuid,
    request: RelaunchRequest,
) -> Result<LaunchOutcome>
where
    S: TemplateRepository + JobRepository + HostSummaryRepository + ?Sized,
{
    let job = store
        .find_job(job_id)
        .await?
        .ok_or(LaunchError::JobNotFound(job_id))?;
    let template = load_template(store, job.template_id).await?;
    let launch_config = recorded_config(store, &job).await?;

    let unprompted = unprompted_fields(&launch_config, &TemplatePolicySnapshot::of(&template));
    if !unprompted.is_empty() {
        tracing::warn!(
            "Relaunch of job {} blocked, {} field(s) no longer prompted",
            job.id,
            unprompted.len()
        );
        return Err(LaunchError::RelaunchBlocked(unprompted));
    }

    let retry_limit = match request.hosts {
        Some(filter) => Some(retry_limit(store, &job, filter).await?),
        None => None,
    };

    let mut launch_request = replay_request(&job, &launch_config, request.credential_passwords);
    // Callback jobs keep their limit whether or not the template still asks for it
    let callback_limit = match launch_config.launch_type() {
        LaunchType::Callback => launch_request.overrides.limit.take(),
        _ => None,
    };

    let (mut plan, resolution) = plan_launch(store, config, &template, &launch_request).await?;
    if let Some(limit) = retry_limit.or(callback_limit) {
        apply_limit(&mut plan, &limit);
    }

    tracing::info!("Relaunching job {} of template {}", job.id, template.name());
    persist_launch(store, &launch_request, plan, resolution).await
}

/// Launch configuration of `job`, or an empty one when none was recorded
async fn recorded_config<S>(store: &S, job: &Job) -> Result<LaunchConfig>
where
    S: JobRepository + ?Sized,
{
    let recorded = store.find_launch_config(job.id).await?;
    Ok(recorded.unwrap_or_else(|| {
        LaunchConfig::capture(job.id, job.launch_type, &Default::default(), &BTreeMap::new())
    }))
}

/// Launch request that replays a recorded configuration
fn replay_request(
    job: &Job,
    config: &LaunchConfig,
    credential_passwords: BTreeMap<String, String>,
) -> LaunchRequest {
    let mut request = LaunchRequest::new(config.overrides().clone());
    request.credential_passwords = credential_passwords;
    request.launch_type = LaunchType::Relaunch;

    if let Some(spec) = job.spec().filter(|spec| spec.slice.is_sliced()) {
        request.prevent_slicing = true;
        request.pinned_slice = Some(spec.slice);
    }
    request
}

/// Host limit selecting the hosts of `job` that match `filter`
async fn retry_limit<S>(store: &S, job: &Job, filter: HostStatusFilter) -> Result<String>
where
    S: HostSummaryRepository + ?Sized,
{
    let hosts: Vec<String> = store
        .list_summaries(job.id)
        .await?
        .into_iter()
        .filter(|summary| filter.matches(summary))
        .map(|summary| summary.host_name)
        .collect();

    if hosts.is_empty() {
        return Err(LaunchError::InvalidState(format!(
            "No hosts with status {} to relaunch",
            filter
        )));
    }
    Ok(hosts.join(","))
}

fn apply_limit(plan: &mut LaunchPlan, limit: &str) {
    match plan {
        LaunchPlan::Single(spec) => spec.options.limit = limit.to_string(),
        LaunchPlan::Sliced { slices, .. } => {
            for spec in slices {
                spec.options.limit = limit.to_string();
            }
        }
        LaunchPlan::System(_) => {}
    }
}
