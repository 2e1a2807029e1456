//! Resolution result DTOs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::prompt::LaunchOverrides;

/// Why a value was refused or a launch cannot start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The value itself is invalid
    Validation,
    /// The template does not allow overriding the field
    Policy,
    /// A mandatory linked resource or secret is missing
    ResourceMissing,
    /// A variable the template cannot accept
    UnsupportedVariable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::Validation, message)
    }

    pub fn policy(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::Policy, message)
    }

    pub fn resource_missing(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::ResourceMissing, message)
    }

    pub fn unsupported_variable(message: impl Into<String>) -> Self {
        Self::new(ViolationKind::UnsupportedVariable, message)
    }
}

/// Violations keyed by field name or error category
pub type ErrorMap = BTreeMap<String, Vec<Violation>>;

/// Outcome of resolving one launch request against a template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub accepted: LaunchOverrides,
    pub rejected: LaunchOverrides,
    pub errors: ErrorMap,
    pub launchable: bool,

    /// Password survey variables accepted for the job, mapped to their redacted value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub survey_passwords: BTreeMap<String, String>,
}

impl ResolutionResult {
    pub fn add_error(&mut self, key: impl Into<String>, violation: Violation) {
        self.errors.entry(key.into()).or_default().push(violation);
    }

    /// Error messages recorded under `key`
    pub fn messages(&self, key: &str) -> Vec<&str> {
        self.errors
            .get(key)
            .map(|violations| violations.iter().map(|v| v.message.as_str()).collect())
            .unwrap_or_default()
    }

    /// Seal the result; launchable exactly when no errors were recorded
    pub fn finish(mut self) -> Self {
        self.launchable = self.errors.is_empty();
        self
    }
}
