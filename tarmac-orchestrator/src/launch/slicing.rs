//! Slicing and launch plans
//!
//! Turns a resolved launch into the concrete jobs to create. A template sliced
//! into N runs as a parent workflow with N identical jobs, each targeting every
//! N-th host of the inventory.

use tarmac_core::domain::prompt::LaunchOverrides;
use tarmac_core::domain::resource::Inventory;
use tarmac_core::domain::template::{JobTemplate, SystemJobTemplate, Template};
use tarmac_core::dto::launch::LaunchRequest;
use tarmac_core::dto::plan::{JobSpec, LaunchPlan, Slice, SystemJobSpec, WorkflowSpec};
use tarmac_core::dto::resolution::ResolutionResult;

use crate::launch::credentials::{effective_credentials, id_delta};
use crate::launch::variables::apply_survey_defaults;

/// Forks assumed when a job does not set them
const DEFAULT_FORKS: u64 = 5;

/// Hosts counted for a provisioning callback launch
const CALLBACK_HOSTS: u64 = 2;

/// Number of slices a launch can actually use
pub fn effective_slice_count(inventory: Option<&Inventory>, requested: u32) -> u32 {
    match inventory {
        Some(inventory) => u64::from(requested).min(inventory.host_count) as u32,
        None => requested,
    }
}

/// Effective slice count of a template once `overrides` are applied
///
/// Overrides only count for fields the template prompts for.
pub fn effective_slice_count_for(template: &JobTemplate, overrides: &LaunchOverrides) -> u32 {
    let inventory = match &overrides.inventory {
        Some(inventory) if template.ask.ask_inventory_on_launch => Some(inventory),
        _ => template.inventory.as_ref(),
    };
    let requested = match overrides.job_slice_count {
        Some(count) if template.ask.ask_job_slice_count_on_launch => count,
        _ => template.job_slice_count,
    };
    effective_slice_count(inventory, requested)
}

/// Plan the jobs for a resolved launch
pub fn plan(template: &Template, resolution: &ResolutionResult, request: &LaunchRequest) -> LaunchPlan {
    match template {
        Template::Job(template) => plan_job(template, resolution, request),
        Template::System(template) => LaunchPlan::System(system_job_spec(template, resolution, request)),
    }
}

fn plan_job(template: &JobTemplate, resolution: &ResolutionResult, request: &LaunchRequest) -> LaunchPlan {
    let mut spec = job_spec(template, resolution, request);
    let slice_count = effective_slice_count_for(template, &resolution.accepted);

    if request.prevent_slicing {
        spec.slice = request.pinned_slice.unwrap_or(Slice::UNSLICED);
        return LaunchPlan::Single(spec);
    }

    if slice_count <= 1 {
        if template.job_slice_count > 1 {
            tracing::debug!(
                "Template {} slices into {} but inventory has too few hosts, launching a single job",
                template.name,
                template.job_slice_count
            );
        }
        spec.slice = Slice::UNSLICED;
        return LaunchPlan::Single(spec);
    }

    let workflow = WorkflowSpec {
        template_id: template.id,
        name: template.name.clone(),
        launch_type: request.launch_type,
        slice_count,
        inventory: spec.inventory.clone(),
        extra_vars: spec.options.extra_vars.clone(),
    };
    let slices = (1..=slice_count)
        .map(|number| JobSpec {
            slice: Slice {
                number,
                count: slice_count,
            },
            ..spec.clone()
        })
        .collect();

    LaunchPlan::Sliced { workflow, slices }
}

/// Template configuration with the accepted overrides applied
pub fn job_spec(template: &JobTemplate, resolution: &ResolutionResult, request: &LaunchRequest) -> JobSpec {
    let accepted = &resolution.accepted;
    let mut options = template.options.clone();

    if let Some(vars) = &accepted.extra_vars {
        for (key, value) in vars {
            options.extra_vars.insert(key.clone(), value.clone());
        }
    }
    apply_survey_defaults(template, &mut options.extra_vars);

    if let Some(job_type) = accepted.job_type {
        options.job_type = job_type;
    }
    if let Some(branch) = &accepted.scm_branch {
        options.scm_branch = branch.clone();
    }
    if let Some(limit) = &accepted.limit {
        options.limit = limit.clone();
    }
    if let Some(tags) = &accepted.job_tags {
        options.job_tags = tags.clone();
    }
    if let Some(tags) = &accepted.skip_tags {
        options.skip_tags = tags.clone();
    }
    if let Some(verbosity) = accepted.verbosity {
        options.verbosity = verbosity;
    }
    if let Some(diff_mode) = accepted.diff_mode {
        options.diff_mode = diff_mode;
    }
    if let Some(forks) = accepted.forks {
        options.forks = forks;
    }
    if let Some(timeout) = accepted.timeout {
        options.timeout = timeout;
    }

    let mut labels = template.labels.clone();
    if let Some(requested) = &accepted.labels {
        labels.extend(id_delta(&template.labels, requested));
    }

    JobSpec {
        template_id: template.id,
        name: template.name.clone(),
        launch_type: request.launch_type,
        options,
        inventory: accepted.inventory.clone().or_else(|| template.inventory.clone()),
        project: template.project.clone(),
        execution_environment: accepted.execution_environment.or(template.execution_environment),
        credentials: effective_credentials(
            &template.credentials,
            accepted.credentials.as_deref().unwrap_or_default(),
        ),
        labels,
        instance_groups: accepted.instance_groups.clone(),
        prevent_instance_group_fallback: template.prevent_instance_group_fallback,
        survey_passwords: resolution.survey_passwords.clone(),
        slice: Slice::UNSLICED,
    }
}

fn system_job_spec(
    template: &SystemJobTemplate,
    resolution: &ResolutionResult,
    request: &LaunchRequest,
) -> SystemJobSpec {
    let mut extra_vars = template.extra_vars.clone();
    if let Some(vars) = &resolution.accepted.extra_vars {
        for (key, value) in vars {
            extra_vars.insert(key.clone(), value.clone());
        }
    }
    SystemJobSpec {
        template_id: template.id,
        name: template.name.clone(),
        job_type: template.job_type,
        launch_type: request.launch_type,
        extra_vars,
    }
}

/// Hosts targeted by one slice: every `count`-th host starting at `number`
pub fn slice_hosts<T: Clone>(hosts: &[T], slice: Slice) -> Vec<T> {
    if !slice.is_sliced() || slice.number == 0 {
        return hosts.to_vec();
    }
    hosts
        .iter()
        .skip((slice.number - 1) as usize)
        .step_by(slice.count as usize)
        .cloned()
        .collect()
}

/// Capacity a job is expected to consume
pub fn task_impact(spec: &JobSpec) -> u64 {
    let forks = match spec.options.forks {
        0 => DEFAULT_FORKS,
        forks => u64::from(forks),
    };
    let hosts = if spec.launch_type == tarmac_core::domain::job::LaunchType::Callback {
        CALLBACK_HOSTS
    } else {
        match &spec.inventory {
            Some(inventory) if spec.slice.is_sliced() => {
                let count = u64::from(spec.slice.count);
                let number = u64::from(spec.slice.number);
                (inventory.host_count + count).saturating_sub(number) / count
            }
            Some(inventory) => inventory.host_count,
            None => forks,
        }
    };
    hosts.min(forks) + 1
}
