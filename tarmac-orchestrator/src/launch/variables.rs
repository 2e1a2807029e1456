//! Variable merging
//!
//! Decides which proposed extra variables a launch may apply. Survey answers
//! overlay the plain extra variables, surveys validate their own variables, and
//! everything else is accepted only when the template prompts for variables.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use tarmac_core::domain::survey::{QuestionType, REDACTED, SurveyQuestion};
use tarmac_core::domain::template::{JobTemplate, SystemJobTemplate, Template};
use tarmac_core::dto::launch::ErrorCategory;
use tarmac_core::dto::resolution::{ErrorMap, Violation};

use crate::launch::policy::SYSTEM_JOB_VARIABLES;

pub use tarmac_core::domain::survey::display_extra_vars;

/// Errors reading stored variables text
#[derive(Debug, thiserror::Error)]
pub enum VariablesError {
    #[error("Cannot parse variables as JSON or YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Variables must be a mapping, not {0}")]
    NotAMapping(&'static str),
}

/// Parse variables stored as JSON or YAML text; blank text is an empty mapping
pub fn parse_yaml_or_json(text: &str) -> Result<Map<String, Value>, VariablesError> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }

    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => serde_yaml::from_str(text)?,
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::Bool(_) => Err(VariablesError::NotAMapping("a boolean")),
        Value::Number(_) => Err(VariablesError::NotAMapping("a number")),
        Value::String(_) => Err(VariablesError::NotAMapping("a string")),
        Value::Array(_) => Err(VariablesError::NotAMapping("a list")),
    }
}

/// Outcome of merging the proposed variables of one launch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableMerge {
    pub accepted: Map<String, Value>,
    pub rejected: Map<String, Value>,
    pub errors: ErrorMap,

    /// Password survey variables that end up in the job, mapped to their redacted value
    pub survey_passwords: BTreeMap<String, String>,
}

/// Split proposed variables into accepted and rejected ones
pub fn merge(
    template: &Template,
    extra_vars: &Map<String, Value>,
    survey_answers: &Map<String, Value>,
    exclude_errors: &BTreeSet<ErrorCategory>,
) -> VariableMerge {
    let mut data = extra_vars.clone();
    for (key, value) in survey_answers {
        data.insert(key.clone(), value.clone());
    }

    match template {
        Template::Job(template) => merge_job(template, data, exclude_errors),
        Template::System(template) => merge_system(template, data),
    }
}

fn merge_job(
    template: &JobTemplate,
    mut data: Map<String, Value>,
    exclude_errors: &BTreeSet<ErrorCategory>,
) -> VariableMerge {
    let mut merge = VariableMerge::default();

    if template.survey_active() {
        let validate_required = !exclude_errors.contains(&ErrorCategory::Required);
        let mut survey_errors = Vec::new();

        for question in &template.survey_spec.spec {
            restore_redacted_password(question, &mut data);
            let problems = validate_answer(question, &data, validate_required);
            let target = if problems.is_empty() {
                &mut merge.accepted
            } else {
                &mut merge.rejected
            };
            if let Some(value) = data.remove(&question.variable) {
                target.insert(question.variable.clone(), value);
            }
            survey_errors.extend(problems);
        }

        if !survey_errors.is_empty() {
            merge.errors.insert(
                "variables_needed_to_start".to_string(),
                survey_errors.into_iter().map(Violation::validation).collect(),
            );
        }
        merge.survey_passwords = survey_passwords(template, &merge.accepted);
    }

    if template.ask.ask_variables_on_launch {
        for (key, value) in std::mem::take(&mut data) {
            merge.accepted.insert(key, value);
        }
    }

    // Re-sending the template's own values is not an override
    data.retain(|key, value| template.options.extra_vars.get(key) != Some(value));

    if !data.is_empty() {
        let keys: Vec<String> = data.keys().cloned().collect();
        for (key, value) in data {
            merge.rejected.insert(key, value);
        }
        if !exclude_errors.contains(&ErrorCategory::Prompts) {
            merge.errors.insert(
                "extra_vars".to_string(),
                vec![Violation::unsupported_variable(format!(
                    "Variables {} provided, but this template cannot accept variables.",
                    keys.join(", ")
                ))],
            );
        }
    }

    merge
}

fn merge_system(template: &SystemJobTemplate, mut data: Map<String, Value>) -> VariableMerge {
    let mut merge = VariableMerge::default();
    let mut problems = Vec::new();

    let unallowed: Vec<String> = data
        .keys()
        .filter(|key| !SYSTEM_JOB_VARIABLES.contains(&key.as_str()))
        .cloned()
        .collect();
    if !unallowed.is_empty() {
        problems.push(Violation::unsupported_variable(format!(
            "Variables {} are not allowed for system jobs.",
            unallowed.join(", ")
        )));
        for key in unallowed {
            if let Some(value) = data.remove(&key) {
                merge.rejected.insert(key, value);
            }
        }
    }

    if template.job_type.takes_days() {
        let invalid_days = data.get("days").is_some_and(|days| parse_days(days).is_none());
        if invalid_days {
            problems.push(Violation::validation("days must be a positive integer."));
            if let Some(days) = data.remove("days") {
                merge.rejected.insert("days".to_string(), days);
            }
        }
    }

    if !problems.is_empty() {
        merge.errors.insert("extra_vars".to_string(), problems);
    }
    merge.accepted = data;
    merge
}

/// Retention in days for cleanup jobs
///
/// Accepts non-negative integers, integral floats and strings holding an
/// integer. Booleans, null and anything else are invalid.
pub fn parse_days(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|days| u64::try_from(days).ok()),
        _ => None,
    }
}

/// A redacted password sent back on relaunch stands for the question default
fn restore_redacted_password(question: &SurveyQuestion, data: &mut Map<String, Value>) {
    if !question.is_password() {
        return;
    }
    let is_redacted = data
        .get(&question.variable)
        .is_some_and(|value| value.as_str() == Some(REDACTED));
    if !is_redacted {
        return;
    }
    match question.effective_default() {
        Some(default) => {
            data.insert(question.variable.clone(), default.clone());
        }
        None => {
            data.remove(&question.variable);
        }
    }
}

/// Problems with the answer to one survey question
pub fn validate_answer(
    question: &SurveyQuestion,
    data: &Map<String, Value>,
    validate_required: bool,
) -> Vec<String> {
    let var = &question.variable;
    let Some(value) = data.get(var) else {
        if question.required && validate_required && question.effective_default().is_none() {
            return vec![format!("'{}' value missing", var)];
        }
        return Vec::new();
    };

    let shown = if question.is_password() {
        REDACTED.to_string()
    } else {
        render(value)
    };
    let mut problems = Vec::new();

    match question.question_type {
        QuestionType::Text | QuestionType::Textarea | QuestionType::Password => {
            let Some(text) = value.as_str() else {
                return vec![format!(
                    "Value {} for '{}' expected to be a string.",
                    shown, var
                )];
            };
            let length = text.chars().count() as i64;
            if let Some(min) = question.min.filter(|min| length < *min) {
                problems.push(format!(
                    "'{}' value {} is too small (length is {} must be at least {}).",
                    var, shown, length, min
                ));
            }
            if let Some(max) = question.max.filter(|max| length > *max) {
                problems.push(format!(
                    "'{}' value {} is too large (must be no more than {}).",
                    var, shown, max
                ));
            }
        }
        QuestionType::Integer | QuestionType::Float => {
            let numeric = match question.question_type {
                QuestionType::Integer => value.is_i64() || value.is_u64(),
                _ => value.is_number(),
            };
            if !numeric {
                let expected = match question.question_type {
                    QuestionType::Integer => "an integer",
                    _ => "a numeric type",
                };
                return vec![format!(
                    "Value {} for '{}' expected to be {}.",
                    shown, var, expected
                )];
            }
            let number = value.as_f64().unwrap_or_default();
            if let Some(min) = question.min.filter(|min| number < *min as f64) {
                problems.push(format!(
                    "'{}' value {} is too small (must be at least {}).",
                    var, shown, min
                ));
            }
            if let Some(max) = question.max.filter(|max| number > *max as f64) {
                problems.push(format!(
                    "'{}' value {} is too large (must be no more than {}).",
                    var, shown, max
                ));
            }
        }
        QuestionType::MultipleChoice => {
            if !is_choice(question, value) {
                problems.push(format!(
                    "Value {} for '{}' expected to be one of {}.",
                    shown,
                    var,
                    render_choices(&question.choices)
                ));
            }
        }
        QuestionType::MultiSelect => {
            let Some(items) = value.as_array() else {
                return vec![format!("'{}' value is expected to be a list.", var)];
            };
            for item in items.iter().filter(|item| !is_choice(question, item)) {
                problems.push(format!(
                    "Value {} for '{}' expected to be one of {}.",
                    render(item),
                    var,
                    render_choices(&question.choices)
                ));
            }
        }
    }

    problems
}

/// Fill unanswered survey questions with their defaults
pub fn apply_survey_defaults(template: &JobTemplate, vars: &mut Map<String, Value>) {
    if !template.survey_active() {
        return;
    }
    for question in &template.survey_spec.spec {
        if vars.contains_key(&question.variable) {
            continue;
        }
        if let Some(default) = question.effective_default() {
            vars.insert(question.variable.clone(), default.clone());
        }
    }
}

/// Password questions whose variable will be present in the job
pub fn survey_passwords(
    template: &JobTemplate,
    accepted: &Map<String, Value>,
) -> BTreeMap<String, String> {
    if !template.survey_active() {
        return BTreeMap::new();
    }
    template
        .survey_spec
        .spec
        .iter()
        .filter(|q| q.is_password())
        .filter(|q| accepted.contains_key(&q.variable) || q.effective_default().is_some())
        .map(|q| (q.variable.clone(), REDACTED.to_string()))
        .collect()
}

fn is_choice(question: &SurveyQuestion, value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| question.choices.iter().any(|choice| choice == s))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_choices(choices: &[String]) -> String {
    let quoted: Vec<String> = choices.iter().map(|c| format!("'{}'", c)).collect();
    format!("[{}]", quoted.join(", "))
}
