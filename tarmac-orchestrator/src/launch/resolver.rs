//! Launch-time configuration resolution
//!
//! For every field a request proposes, decide independently whether the
//! override is a no-op, accepted, or rejected, and why. The resolver is a pure
//! function of the template, the request and the configured limits.

use tarmac_core::domain::prompt::{FieldValue, PromptField};
use tarmac_core::domain::template::{JobTemplate, Template, TemplateKind};
use tarmac_core::dto::launch::{ErrorCategory, LaunchRequest};
use tarmac_core::dto::resolution::{ResolutionResult, Violation};

use crate::config::Config;
use crate::launch::credentials::{credential_delta, id_delta, passwords_needed};
use crate::launch::policy::{self, MergeStrategy, PromptRule};
use crate::launch::readiness::missing_resources;
use crate::launch::slicing::effective_slice_count_for;
use crate::launch::variables;

/// Outcome for a single proposed field
#[derive(Debug, Clone, PartialEq)]
enum Decision {
    /// Same as the template; neither accepted nor rejected
    Unchanged,
    Accept(FieldValue),
    Reject(FieldValue, Option<Violation>),
}

/// Resolves launch requests against templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigResolver {
    max_forks: u32,
}

impl ConfigResolver {
    /// Creates a resolver; `max_forks` of 0 disables the forks ceiling
    pub fn new(max_forks: u32) -> Self {
        Self { max_forks }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_forks)
    }

    /// Decide which overrides of `request` apply to `template`
    pub fn resolve(&self, template: &Template, request: &LaunchRequest) -> ResolutionResult {
        let mut result = ResolutionResult::default();

        let extra_vars = request.overrides.extra_vars.clone().unwrap_or_default();
        let merge = variables::merge(
            template,
            &extra_vars,
            &request.survey_answers,
            &request.exclude_errors,
        );
        if !merge.accepted.is_empty() {
            result.accepted.extra_vars = Some(merge.accepted);
        }
        if !merge.rejected.is_empty() {
            result.rejected.extra_vars = Some(merge.rejected);
        }
        for (key, violations) in merge.errors {
            for violation in violations {
                result.add_error(key.clone(), violation);
            }
        }
        result.survey_passwords = merge.survey_passwords;

        if let Template::Job(job_template) = template {
            self.resolve_fields(job_template, request, &mut result);
        }

        let result = result.finish();
        tracing::debug!(
            "Resolved launch of {}: {} accepted, {} rejected, {} error keys",
            template.name(),
            result.accepted.values().len(),
            result.rejected.values().len(),
            result.errors.len()
        );
        result
    }

    fn resolve_fields(
        &self,
        template: &JobTemplate,
        request: &LaunchRequest,
        result: &mut ResolutionResult,
    ) {
        let exclude_prompts = request.excludes(ErrorCategory::Prompts);

        for rule in policy::rules(TemplateKind::Job) {
            if rule.field == PromptField::ExtraVars {
                continue;
            }
            let Some(requested) = request.overrides.get(rule.field) else {
                continue;
            };

            match self.decide(template, rule, requested, request) {
                Decision::Unchanged => {
                    tracing::debug!("{}: same as template, skipped", rule.field);
                }
                Decision::Accept(value) => {
                    tracing::debug!("{}: accepted", rule.field);
                    result.accepted.set(value);
                }
                Decision::Reject(value, violation) => {
                    tracing::debug!("{}: rejected", rule.field);
                    result.rejected.set(value);
                    if let Some(violation) = violation {
                        result.add_error(rule.field.name(), violation);
                    }
                }
            }
        }

        if !exclude_prompts && !template.ask.ask_credential_on_launch {
            let needed = passwords_needed(&template.credentials, &request.credential_passwords);
            if !needed.is_empty() {
                result.add_error(
                    "passwords_needed_to_start",
                    Violation::resource_missing(
                        "Saved launch configurations cannot provide passwords needed to start.",
                    ),
                );
            }
        }

        for violation in missing_resources(template, &result.accepted) {
            result.add_error("resources_needed_to_start", violation);
        }
    }

    fn decide(
        &self,
        template: &JobTemplate,
        rule: &PromptRule,
        requested: FieldValue,
        request: &LaunchRequest,
    ) -> Decision {
        let current = template.prompt_value(rule.field);

        let requested = match rule.strategy {
            MergeStrategy::Scalar => {
                if current.as_ref().is_some_and(|c| c.same_value(&requested)) {
                    return Decision::Unchanged;
                }
                requested
            }
            MergeStrategy::OrderedSet => {
                let unchanged = !requested.is_empty_selection()
                    && current.as_ref().and_then(FieldValue::ids) == requested.ids();
                if unchanged {
                    return Decision::Unchanged;
                }
                requested
            }
            MergeStrategy::UnorderedSet => match requested {
                FieldValue::Credentials(creds) => {
                    let delta = credential_delta(&template.credentials, &creds);
                    if delta.is_empty() {
                        return Decision::Unchanged;
                    }
                    FieldValue::Credentials(delta)
                }
                FieldValue::Labels(ids) => {
                    let delta = id_delta(&template.labels, &ids);
                    if delta.is_empty() {
                        return Decision::Unchanged;
                    }
                    FieldValue::Labels(delta)
                }
                other => other,
            },
        };

        // A template without a branch runs the project branch
        if let (FieldValue::ScmBranch(branch), Some(project)) = (&requested, &template.project) {
            if template.options.scm_branch.is_empty() && project.scm_branch == *branch {
                return Decision::Unchanged;
            }
        }

        if !template.ask.is_set(rule.ask) {
            let violation = (!request.excludes(ErrorCategory::Prompts))
                .then(|| Violation::policy("Field is not configured to prompt on launch."));
            return Decision::Reject(requested, violation);
        }

        match self.field_violation(template, &requested, request) {
            Some(violation) => Decision::Reject(requested, Some(violation)),
            None => Decision::Accept(requested),
        }
    }

    /// Checks for prompted fields whose validity depends on other settings
    fn field_violation(
        &self,
        template: &JobTemplate,
        requested: &FieldValue,
        request: &LaunchRequest,
    ) -> Option<Violation> {
        match requested {
            FieldValue::ScmBranch(branch) => match &template.project {
                None => Some(Violation::validation("Project is missing.")),
                Some(project) if *branch != project.scm_branch && !project.allow_override => {
                    Some(Violation::validation(
                        "Project does not allow override of branch.",
                    ))
                }
                Some(_) => None,
            },
            FieldValue::JobSliceCount(count) => {
                let too_few_hosts =
                    *count > 1 && effective_slice_count_for(template, &request.overrides) <= 1;
                too_few_hosts.then(|| {
                    Violation::validation("Job inventory does not have enough hosts for slicing")
                })
            }
            FieldValue::Forks(forks) if self.max_forks > 0 && *forks > self.max_forks => {
                Some(Violation::validation(format!(
                    "Maximum number of forks ({}) exceeded.",
                    self.max_forks
                )))
            }
            _ => None,
        }
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::fixtures;
    use serde_json::json;
    use tarmac_core::domain::prompt::LaunchOverrides;
    use tarmac_core::domain::resource::CredentialKind;
    use tarmac_core::domain::survey::{REDACTED, SurveySpec};
    use tarmac_core::domain::template::{SystemJobTemplate, SystemJobType};
    use tarmac_core::dto::resolution::ViolationKind;
    use uuid::Uuid;

    fn request(overrides: LaunchOverrides) -> LaunchRequest {
        LaunchRequest::new(overrides)
    }

    fn resolve(template: &JobTemplate, request: &LaunchRequest) -> ResolutionResult {
        ConfigResolver::default().resolve(&template.clone().into(), request)
    }

    #[test]
    fn test_unprompted_limit_is_rejected() {
        let template = fixtures::template(3);
        let result = resolve(
            &template,
            &request(LaunchOverrides {
                limit: Some("web*".to_string()),
                ..Default::default()
            }),
        );

        assert!(result.accepted.limit.is_none());
        assert_eq!(result.rejected.limit.as_deref(), Some("web*"));
        assert_eq!(
            result.messages("limit"),
            vec!["Field is not configured to prompt on launch."]
        );
        assert_eq!(result.errors["limit"][0].kind, ViolationKind::Policy);
        assert!(!result.launchable);
    }

    #[test]
    fn test_excluded_prompt_errors_leave_launchable() {
        let template = fixtures::template(3);
        let req = request(LaunchOverrides {
            limit: Some("web*".to_string()),
            ..Default::default()
        })
        .excluding(ErrorCategory::Prompts);
        let result = resolve(&template, &req);

        assert_eq!(result.rejected.limit.as_deref(), Some("web*"));
        assert!(result.errors.is_empty());
        assert!(result.launchable);
    }

    #[test]
    fn test_prompted_fields_are_accepted() {
        let mut template = fixtures::template(3);
        template.ask.ask_limit_on_launch = true;
        template.ask.ask_verbosity_on_launch = true;
        let result = resolve(
            &template,
            &request(LaunchOverrides {
                limit: Some("db".to_string()),
                verbosity: Some(3),
                ..Default::default()
            }),
        );

        assert_eq!(result.accepted.limit.as_deref(), Some("db"));
        assert_eq!(result.accepted.verbosity, Some(3));
        assert!(result.rejected.is_empty());
        assert!(result.launchable);
    }

    #[test]
    fn test_same_value_is_noop() {
        let mut template = fixtures::template(3);
        template.options.limit = "web".to_string();
        let result = resolve(
            &template,
            &request(LaunchOverrides {
                limit: Some("web".to_string()),
                ..Default::default()
            }),
        );

        assert!(result.accepted.is_empty());
        assert!(result.rejected.is_empty());
        assert!(result.launchable);
    }

    #[test]
    fn test_absent_fields_never_appear() {
        let template = fixtures::template(3);
        let result = resolve(&template, &LaunchRequest::default());
        assert!(result.accepted.is_empty());
        assert!(result.rejected.is_empty());
        assert!(result.launchable);
    }

    #[test]
    fn test_branch_same_as_project_default_is_noop() {
        let template = fixtures::template(3);
        let result = resolve(
            &template,
            &request(LaunchOverrides {
                scm_branch: Some("main".to_string()),
                ..Default::default()
            }),
        );
        assert!(result.rejected.is_empty());
        assert!(result.launchable);
    }

    #[test]
    fn test_branch_override_disallowed_by_project() {
        let mut template = fixtures::template(3);
        template.ask.ask_scm_branch_on_launch = true;
        let result = resolve(
            &template,
            &request(LaunchOverrides {
                scm_branch: Some("feature".to_string()),
                ..Default::default()
            }),
        );

        assert_eq!(result.rejected.scm_branch.as_deref(), Some("feature"));
        assert_eq!(
            result.messages("scm_branch"),
            vec!["Project does not allow override of branch."]
        );

        template.project = Some(fixtures::project("main", true));
        let allowed = resolve(
            &template,
            &request(LaunchOverrides {
                scm_branch: Some("feature".to_string()),
                ..Default::default()
            }),
        );
        assert_eq!(allowed.accepted.scm_branch.as_deref(), Some("feature"));
    }

    #[test]
    fn test_branch_without_project() {
        let mut template = fixtures::template(3);
        template.project = None;
        template.ask.ask_scm_branch_on_launch = true;
        let result = resolve(
            &template,
            &request(LaunchOverrides {
                scm_branch: Some("feature".to_string()),
                ..Default::default()
            }),
        );

        assert_eq!(result.messages("scm_branch"), vec!["Project is missing."]);
        assert_eq!(
            result.messages("resources_needed_to_start"),
            vec!["Job Template project is missing or undefined."]
        );
    }

    #[test]
    fn test_slice_count_needs_enough_hosts() {
        let mut template = fixtures::template(1);
        template.ask.ask_job_slice_count_on_launch = true;
        let result = resolve(
            &template,
            &request(LaunchOverrides {
                job_slice_count: Some(3),
                ..Default::default()
            }),
        );

        assert_eq!(result.rejected.job_slice_count, Some(3));
        assert_eq!(
            result.messages("job_slice_count"),
            vec!["Job inventory does not have enough hosts for slicing"]
        );
    }

    #[test]
    fn test_slice_count_uses_prompted_inventory() {
        let mut template = fixtures::template(1);
        template.ask.ask_job_slice_count_on_launch = true;
        template.ask.ask_inventory_on_launch = true;
        let result = resolve(
            &template,
            &request(LaunchOverrides {
                job_slice_count: Some(3),
                inventory: Some(fixtures::inventory(10)),
                ..Default::default()
            }),
        );

        assert_eq!(result.accepted.job_slice_count, Some(3));
        assert!(result.accepted.inventory.is_some());
        assert!(result.launchable);
    }

    #[test]
    fn test_forks_ceiling() {
        let mut template = fixtures::template(3);
        template.ask.ask_forks_on_launch = true;
        let resolver = ConfigResolver::new(10);
        let result = resolver.resolve(
            &template.clone().into(),
            &request(LaunchOverrides {
                forks: Some(50),
                ..Default::default()
            }),
        );
        assert_eq!(
            result.messages("forks"),
            vec!["Maximum number of forks (10) exceeded."]
        );

        let unlimited = ConfigResolver::new(0).resolve(
            &template.into(),
            &request(LaunchOverrides {
                forks: Some(50),
                ..Default::default()
            }),
        );
        assert_eq!(unlimited.accepted.forks, Some(50));
    }

    #[test]
    fn test_default_forks_request_is_noop() {
        let template = fixtures::template(3);
        let result = resolve(
            &template,
            &request(LaunchOverrides {
                forks: Some(0),
                ..Default::default()
            }),
        );

        assert!(result.accepted.forks.is_none());
        assert!(result.rejected.forks.is_none());
        assert!(result.errors.is_empty());
        assert!(result.launchable);
    }

    #[test]
    fn test_slice_count_capped_by_host_count() {
        use crate::launch::slicing;
        use tarmac_core::dto::plan::{LaunchPlan, Slice};

        let mut template = fixtures::template(3);
        template.job_slice_count = 5;
        template.ask.ask_job_slice_count_on_launch = true;
        let req = request(LaunchOverrides {
            job_slice_count: Some(5),
            ..Default::default()
        });

        let result = resolve(&template, &req);
        assert!(result.launchable);

        match slicing::plan(&template.into(), &result, &req) {
            LaunchPlan::Sliced { workflow, slices } => {
                assert_eq!(workflow.slice_count, 3);
                let positions: Vec<Slice> = slices.iter().map(|spec| spec.slice).collect();
                assert_eq!(
                    positions,
                    (1..=3).map(|number| Slice { number, count: 3 }).collect::<Vec<_>>()
                );
            }
            other => panic!("expected a sliced plan, got {other:?}"),
        }
    }

    #[test]
    fn test_credentials_use_set_difference() {
        let mut template = fixtures::template(3);
        let machine = fixtures::credential("machine", CredentialKind::Ssh);
        template.credentials = vec![machine.clone()];

        let same = resolve(
            &template,
            &request(LaunchOverrides {
                credentials: Some(vec![machine.clone()]),
                ..Default::default()
            }),
        );
        assert!(same.rejected.is_empty());
        assert!(same.launchable);

        template.ask.ask_credential_on_launch = true;
        let cloud = fixtures::credential("aws", CredentialKind::Cloud);
        let added = resolve(
            &template,
            &request(LaunchOverrides {
                credentials: Some(vec![machine, cloud.clone()]),
                ..Default::default()
            }),
        );
        assert_eq!(added.accepted.credentials, Some(vec![cloud]));
    }

    #[test]
    fn test_labels_record_only_added_ids() {
        use tarmac_core::domain::job::LaunchType;
        use tarmac_core::domain::launch_config::LaunchConfig;

        let (assigned, added) = (Uuid::new_v4(), Uuid::new_v4());
        let mut template = fixtures::template(3);
        template.labels = vec![assigned];
        template.ask.ask_labels_on_launch = true;

        let result = resolve(
            &template,
            &request(LaunchOverrides {
                labels: Some(vec![assigned, added]),
                ..Default::default()
            }),
        );
        assert_eq!(result.accepted.labels, Some(vec![added]));

        let snapshot = LaunchConfig::capture(
            Uuid::new_v4(),
            LaunchType::Manual,
            &result.accepted,
            &result.survey_passwords,
        );
        assert_eq!(snapshot.overrides().labels, Some(vec![added]));

        let unchanged = resolve(
            &template,
            &request(LaunchOverrides {
                labels: Some(vec![assigned]),
                ..Default::default()
            }),
        );
        assert!(unchanged.accepted.is_empty());
    }

    #[test]
    fn test_empty_instance_groups_are_not_noop() {
        let template = fixtures::template(3);
        let result = resolve(
            &template,
            &request(LaunchOverrides {
                instance_groups: Some(Vec::new()),
                ..Default::default()
            }),
        );
        assert_eq!(result.rejected.instance_groups, Some(Vec::new()));
        assert!(result.errors.contains_key("instance_groups"));
    }

    #[test]
    fn test_instance_groups_compare_in_order() {
        let mut template = fixtures::template(3);
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        template.instance_groups = vec![a, b];

        let same = resolve(
            &template,
            &request(LaunchOverrides {
                instance_groups: Some(vec![a, b]),
                ..Default::default()
            }),
        );
        assert!(same.rejected.is_empty());

        template.ask.ask_instance_groups_on_launch = true;
        let reordered = resolve(
            &template,
            &request(LaunchOverrides {
                instance_groups: Some(vec![b, a]),
                ..Default::default()
            }),
        );
        assert_eq!(reordered.accepted.instance_groups, Some(vec![b, a]));
    }

    #[test]
    fn test_passwords_needed_to_start() {
        let mut template = fixtures::template(3);
        let mut machine = fixtures::credential("machine", CredentialKind::Ssh);
        machine.passwords_needed = vec!["ssh_password".to_string()];
        template.credentials = vec![machine];

        let result = resolve(&template, &LaunchRequest::default());
        assert_eq!(
            result.messages("passwords_needed_to_start"),
            vec!["Saved launch configurations cannot provide passwords needed to start."]
        );

        let mut supplied = LaunchRequest::default();
        supplied
            .credential_passwords
            .insert("ssh_password".to_string(), "pw".to_string());
        assert!(resolve(&template, &supplied).launchable);
    }

    #[test]
    fn test_missing_inventory_satisfied_by_prompt() {
        let mut template = fixtures::template(3);
        template.inventory = None;
        let missing = resolve(&template, &LaunchRequest::default());
        assert_eq!(
            missing.messages("resources_needed_to_start"),
            vec!["Job Template inventory is missing or undefined."]
        );

        template.ask.ask_inventory_on_launch = true;
        let prompted = resolve(
            &template,
            &request(LaunchOverrides {
                inventory: Some(fixtures::inventory(2)),
                ..Default::default()
            }),
        );
        assert!(prompted.launchable);
    }

    #[test]
    fn test_survey_scenario() {
        let mut template = fixtures::template(3);
        template.survey_enabled = true;
        template.survey_spec = serde_json::from_value::<SurveySpec>(json!({
            "spec": [
                {"variable": "env", "type": "multiplechoice", "choices": ["dev", "prod"], "required": true},
                {"variable": "token", "type": "password"}
            ]
        }))
        .unwrap();

        let mut req = LaunchRequest::default();
        req.survey_answers = json!({"env": "prod", "token": "t"}).as_object().cloned().unwrap();
        let result = resolve(&template, &req);

        assert!(result.launchable);
        let vars = result.accepted.extra_vars.clone().unwrap();
        assert_eq!(vars["env"], "prod");
        assert_eq!(result.survey_passwords["token"], REDACTED);
    }

    #[test]
    fn test_system_template_only_merges_variables() {
        let template: Template =
            SystemJobTemplate::new("cleanup", SystemJobType::CleanupJobs).into();
        let mut req = request(LaunchOverrides {
            limit: Some("ignored".to_string()),
            ..Default::default()
        });
        req.overrides.extra_vars = json!({"days": "x"}).as_object().cloned();

        let result = ConfigResolver::default().resolve(&template, &req);
        assert!(result.rejected.limit.is_none());
        assert_eq!(
            result.messages("extra_vars"),
            vec!["days must be a positive integer."]
        );
        assert!(!result.launchable);
    }

    #[test]
    fn test_system_template_rejects_non_numeric_days() {
        let template: Template =
            SystemJobTemplate::new("cleanup", SystemJobType::CleanupJobs).into();
        let mut req = LaunchRequest::default();
        req.overrides.extra_vars = json!({"days": "abc"}).as_object().cloned();

        let result = ConfigResolver::default().resolve(&template, &req);
        let rejected = result.rejected.extra_vars.as_ref().unwrap();
        assert_eq!(rejected["days"], json!("abc"));
        assert!(result.accepted.extra_vars.is_none());
        assert_eq!(
            result.messages("extra_vars"),
            vec!["days must be a positive integer."]
        );
    }

    #[test]
    fn test_resolve_is_pure() {
        let mut template = fixtures::template(4);
        template.ask.ask_limit_on_launch = true;
        template.ask.ask_job_slice_count_on_launch = true;
        let req = request(LaunchOverrides {
            limit: Some("web".to_string()),
            forks: Some(9),
            job_slice_count: Some(2),
            ..Default::default()
        });
        let before = serde_json::to_string(&template).unwrap();

        let first = serde_json::to_string(&resolve(&template, &req)).unwrap();
        let second = serde_json::to_string(&resolve(&template, &req)).unwrap();
        assert_eq!(first, second);
        assert_eq!(serde_json::to_string(&template).unwrap(), before);
    }
}
