//! Job meta variables injected into every playbook run

use serde_json::{Map, Value};

use tarmac_core::domain::job::Job;
use tarmac_core::domain::template::JobTemplate;

pub const META_PREFIX: &str = "tarmac";

/// Meta variables describing `job`, its template and its project
pub fn job_meta_vars(job: &Job, template: Option<&JobTemplate>) -> Map<String, Value> {
    let mut vars = Map::new();
    let mut put = |name: &str, value: Value| {
        vars.insert(format!("{}_{}", META_PREFIX, name), value);
    };

    put("job_id", Value::String(job.id.to_string()));
    put(
        "job_launch_type",
        serde_json::to_value(job.launch_type).unwrap_or(Value::Null),
    );

    if let Some(spec) = job.spec() {
        if let Some(project) = &spec.project {
            put(
                "project_revision",
                Value::String(project.scm_revision.clone()),
            );
            put(
                "project_scm_branch",
                Value::String(project.scm_branch.clone()),
            );
        }
        if !spec.options.scm_branch.is_empty() {
            put(
                "job_scm_branch",
                Value::String(spec.options.scm_branch.clone()),
            );
        }
    }

    if let Some(template) = template {
        put("job_template_id", Value::String(template.id.to_string()));
        put("job_template_name", Value::String(template.name.clone()));
    }

    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::fixtures;
    use crate::launch::slicing::job_spec;
    use tarmac_core::dto::launch::LaunchRequest;
    use tarmac_core::dto::resolution::ResolutionResult;

    #[test]
    fn test_meta_vars() {
        let mut template = fixtures::template(3);
        template.options.scm_branch = "release".to_string();
        let spec = job_spec(&template, &ResolutionResult::default(), &LaunchRequest::default());
        let job = Job::playbook(spec, None);

        let vars = job_meta_vars(&job, Some(&template));
        assert_eq!(vars["tarmac_job_template_name"], "deploy");
        assert_eq!(vars["tarmac_project_revision"], "4f2a9c1");
        assert_eq!(vars["tarmac_project_scm_branch"], "main");
        assert_eq!(vars["tarmac_job_scm_branch"], "release");
        assert_eq!(vars["tarmac_job_launch_type"], "manual");
    }

    #[test]
    fn test_no_branch_no_template() {
        let template = fixtures::template(3);
        let spec = job_spec(&template, &ResolutionResult::default(), &LaunchRequest::default());
        let vars = job_meta_vars(&Job::playbook(spec, None), None);
        assert!(!vars.contains_key("tarmac_job_scm_branch"));
        assert!(!vars.contains_key("tarmac_job_template_id"));
        assert!(vars.contains_key("tarmac_job_id"));
    }
}
