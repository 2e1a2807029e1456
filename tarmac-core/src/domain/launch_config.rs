//! Launch configuration snapshot
//!
//! Records the overrides accepted for one job so a later relaunch can replay
//! them. A snapshot is written once, after a successful resolution, and is never
//! mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::job::LaunchType;
use crate::domain::prompt::{FieldValue, LaunchOverrides};
use crate::domain::survey::display_extra_vars;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    job_id: Uuid,
    launch_type: LaunchType,
    prompts: LaunchOverrides,
    survey_passwords: BTreeMap<String, String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl LaunchConfig {
    /// Snapshot the accepted overrides of a launch
    pub fn capture(
        job_id: Uuid,
        launch_type: LaunchType,
        accepted: &LaunchOverrides,
        survey_passwords: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            job_id,
            launch_type,
            prompts: accepted.clone(),
            survey_passwords: survey_passwords.clone(),
            created_at: chrono::Utc::now(),
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn launch_type(&self) -> LaunchType {
        self.launch_type
    }

    pub fn overrides(&self) -> &LaunchOverrides {
        &self.prompts
    }

    pub fn survey_passwords(&self) -> &BTreeMap<String, String> {
        &self.survey_passwords
    }

    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    /// Variables recorded for the launch, empty when none were accepted
    pub fn extra_vars(&self) -> Map<String, Value> {
        self.prompts.extra_vars.clone().unwrap_or_default()
    }

    /// Prompted values keyed by field name
    ///
    /// Empty selections and empty variables are left out. With `display` set,
    /// survey passwords show their redacted value.
    pub fn prompts(&self, display: bool) -> Map<String, Value> {
        let mut out = Map::new();
        for value in self.prompts.values() {
            let rendered = match &value {
                FieldValue::ExtraVars(vars) if vars.is_empty() => continue,
                FieldValue::ExtraVars(vars) if display => {
                    Value::Object(display_extra_vars(vars, &self.survey_passwords))
                }
                other if other.is_empty_selection() => continue,
                other => other.to_json(),
            };
            out.insert(value.field().name().to_string(), rendered);
        }
        out
    }
}
