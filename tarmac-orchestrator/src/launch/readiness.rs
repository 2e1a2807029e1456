//! Resource readiness checks

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use tarmac_core::domain::prompt::LaunchOverrides;
use tarmac_core::domain::template::JobTemplate;
use tarmac_core::dto::resolution::{ErrorMap, Violation};

use crate::launch::credentials::passwords_needed;

/// Problems with the template itself that no launch request can fix
pub fn validation_errors(template: &JobTemplate) -> ErrorMap {
    let mut errors = ErrorMap::new();
    if template.inventory.is_none() && !template.ask.ask_inventory_on_launch {
        errors.insert(
            "inventory".to_string(),
            vec![Violation::resource_missing(
                "Job Template must provide 'inventory' or allow prompting for it.",
            )],
        );
    }
    if template.project.is_none() {
        errors.insert(
            "project".to_string(),
            vec![Violation::resource_missing(
                "Job Templates must have a project assigned.",
            )],
        );
    }
    errors
}

/// Mandatory resources missing from the template and not supplied by the launch
pub fn missing_resources(template: &JobTemplate, accepted: &LaunchOverrides) -> Vec<Violation> {
    template
        .resources_needed_to_start()
        .into_iter()
        .filter(|resource| match *resource {
            "inventory" => accepted.inventory.is_none(),
            _ => true,
        })
        .map(|resource| {
            Violation::resource_missing(format!("Job Template {} is missing or undefined.", resource))
        })
        .collect()
}

/// Required survey variables without a usable default
pub fn variables_needed_to_start(template: &JobTemplate) -> Vec<String> {
    if !template.survey_active() {
        return Vec::new();
    }
    template
        .survey_spec
        .spec
        .iter()
        .filter(|q| q.required && q.effective_default().is_none())
        .map(|q| q.variable.clone())
        .collect()
}

/// Whether a job can start from the template alone
///
/// Provisioning callbacks pass the variables they carry; prompting does not block
/// them, since callbacks launch with whatever the template defines.
pub fn can_start_without_user_input(
    template: &JobTemplate,
    callback_vars: Option<&Map<String, Value>>,
) -> bool {
    let needed = variables_needed_to_start(template);
    let variables_needed = match callback_vars {
        Some(vars) => needed.iter().any(|var| !vars.contains_key(var)),
        None => !needed.is_empty(),
    };
    let prompting_needed = callback_vars.is_none() && template.ask.any();
    let passwords = passwords_needed(&template.credentials, &BTreeMap::new());

    !prompting_needed && passwords.is_empty() && !variables_needed
}
