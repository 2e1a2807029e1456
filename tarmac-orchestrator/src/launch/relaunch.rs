//! Relaunch legitimacy
//!
//! A relaunch replays the overrides stored with a past job. Those overrides are
//! checked against what the template allows *now*: if the template stopped
//! prompting for a field the job was launched with, replaying it is not allowed.

use std::collections::BTreeSet;

use tarmac_core::domain::job::LaunchType;
use tarmac_core::domain::launch_config::LaunchConfig;
use tarmac_core::domain::prompt::PromptField;
use tarmac_core::domain::template::{AskFlag, AskFlags, Template, TemplateKind};

use crate::launch::policy;

/// Prompt permissions of a template at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePolicySnapshot {
    kind: TemplateKind,
    ask: AskFlags,
    survey_enabled: bool,
    survey_variables: BTreeSet<String>,
}

impl TemplatePolicySnapshot {
    pub fn of(template: &Template) -> Self {
        match template {
            Template::Job(t) => Self {
                kind: TemplateKind::Job,
                ask: t.ask,
                survey_enabled: t.survey_enabled,
                survey_variables: t.survey_spec.variables(),
            },
            Template::System(_) => Self {
                kind: TemplateKind::System,
                ask: AskFlags::default().with(AskFlag::Variables, true),
                survey_enabled: false,
                survey_variables: BTreeSet::new(),
            },
        }
    }

    pub fn asks(&self, flag: AskFlag) -> bool {
        self.ask.is_set(flag)
    }

    /// Whether the survey alone decides which variables are prompted
    fn survey_governs_variables(&self) -> bool {
        self.survey_enabled && !self.asks(AskFlag::Variables)
    }
}

/// Fields in the snapshot the template no longer prompts for
pub fn unprompted_fields(config: &LaunchConfig, policy: &TemplatePolicySnapshot) -> Vec<PromptField> {
    user_prompts(config, policy, true)
}

/// Whether every stored override is still allowed by the template
pub fn was_fully_prompted(config: &LaunchConfig, policy: &TemplatePolicySnapshot) -> bool {
    unprompted_fields(config, policy).is_empty()
}

/// Whether the snapshot carries any override at all, allowed or not
pub fn has_any_override(config: &LaunchConfig, policy: &TemplatePolicySnapshot) -> bool {
    !user_prompts(config, policy, false).is_empty()
}

fn user_prompts(
    config: &LaunchConfig,
    policy: &TemplatePolicySnapshot,
    only_unprompted: bool,
) -> Vec<PromptField> {
    let prompts = config.prompts(false);
    let mut fields = Vec::new();

    for rule in policy::rules(policy.kind) {
        if !prompts.contains_key(rule.field.name()) {
            continue;
        }

        if rule.field == PromptField::ExtraVars && policy.survey_governs_variables() {
            let provided: BTreeSet<String> = config.extra_vars().keys().cloned().collect();
            let outside_survey = provided.difference(&policy.survey_variables).next().is_some();
            if outside_survey || (!only_unprompted && !provided.is_empty()) {
                fields.push(rule.field);
            }
            continue;
        }

        if only_unprompted && policy.asks(rule.ask) {
            continue;
        }
        // Callbacks always set a limit for the calling host
        if rule.field == PromptField::Limit && config.launch_type() == LaunchType::Callback {
            continue;
        }
        fields.push(rule.field);
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::fixtures;
    use serde_json::{Map, Value, json};
    use std::collections::BTreeMap;
    use tarmac_core::domain::prompt::LaunchOverrides;
    use tarmac_core::domain::survey::SurveySpec;
    use tarmac_core::domain::template::{JobTemplate, SystemJobTemplate, SystemJobType};
    use uuid::Uuid;

    fn snapshot(launch_type: LaunchType, overrides: LaunchOverrides) -> LaunchConfig {
        LaunchConfig::capture(Uuid::new_v4(), launch_type, &overrides, &BTreeMap::new())
    }

    fn vars(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn surveyed(template: &mut JobTemplate) {
        template.survey_enabled = true;
        template.survey_spec = serde_json::from_value::<SurveySpec>(json!({
            "spec": [{"variable": "env", "type": "text"}]
        }))
        .unwrap();
    }

    #[test]
    fn test_ask_flag_turned_off_blocks_relaunch() {
        let mut template = fixtures::template(3);
        template.ask.ask_limit_on_launch = true;
        let config = snapshot(
            LaunchType::Manual,
            LaunchOverrides {
                limit: Some("web".to_string()),
                ..Default::default()
            },
        );

        let policy = TemplatePolicySnapshot::of(&template.clone().into());
        assert!(was_fully_prompted(&config, &policy));
        assert!(has_any_override(&config, &policy));

        template.ask.ask_limit_on_launch = false;
        let policy = TemplatePolicySnapshot::of(&template.into());
        assert_eq!(unprompted_fields(&config, &policy), vec![PromptField::Limit]);
        assert!(!was_fully_prompted(&config, &policy));
    }

    #[test]
    fn test_callback_limit_is_exempt() {
        let template = fixtures::template(3);
        let config = snapshot(
            LaunchType::Callback,
            LaunchOverrides {
                limit: Some("host-17".to_string()),
                ..Default::default()
            },
        );
        let policy = TemplatePolicySnapshot::of(&template.into());

        assert!(was_fully_prompted(&config, &policy));
        assert!(!has_any_override(&config, &policy));
    }

    #[test]
    fn test_survey_variables_stay_prompted() {
        let mut template = fixtures::template(3);
        surveyed(&mut template);
        let policy = TemplatePolicySnapshot::of(&template.into());

        let inside = snapshot(
            LaunchType::Manual,
            LaunchOverrides {
                extra_vars: Some(vars(json!({"env": "prod"}))),
                ..Default::default()
            },
        );
        assert!(was_fully_prompted(&inside, &policy));
        assert!(has_any_override(&inside, &policy));

        let outside = snapshot(
            LaunchType::Manual,
            LaunchOverrides {
                extra_vars: Some(vars(json!({"env": "prod", "debug": true}))),
                ..Default::default()
            },
        );
        assert_eq!(
            unprompted_fields(&outside, &policy),
            vec![PromptField::ExtraVars]
        );
    }

    #[test]
    fn test_empty_selections_are_not_overrides() {
        let template = fixtures::template(3);
        let config = snapshot(
            LaunchType::Manual,
            LaunchOverrides {
                labels: Some(Vec::new()),
                extra_vars: Some(Map::new()),
                ..Default::default()
            },
        );
        let policy = TemplatePolicySnapshot::of(&template.into());
        assert!(!has_any_override(&config, &policy));
    }

    #[test]
    fn test_system_template_variables_stay_prompted() {
        let template: Template =
            SystemJobTemplate::new("cleanup", SystemJobType::CleanupJobs).into();
        let config = snapshot(
            LaunchType::Scheduled,
            LaunchOverrides {
                extra_vars: Some(vars(json!({"days": 30}))),
                ..Default::default()
            },
        );
        let policy = TemplatePolicySnapshot::of(&template);
        assert!(was_fully_prompted(&config, &policy));
        assert!(has_any_override(&config, &policy));
    }
}
