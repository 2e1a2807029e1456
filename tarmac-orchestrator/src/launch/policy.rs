//! Prompt policy
//!
//! Static table of the fields each template kind lets callers override, the
//! ask flag guarding each field and how a requested value is compared with the
//! template's own.

use std::collections::BTreeMap;

use tarmac_core::domain::prompt::PromptField;
use tarmac_core::domain::template::{AskFlag, TemplateKind};

/// How a requested value is compared with the template value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Plain equality; the requested value replaces the template value
    Scalar,
    /// Sequences compared in order
    OrderedSet,
    /// Only ids not already on the template count as a change
    UnorderedSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptRule {
    pub field: PromptField,
    pub ask: AskFlag,
    pub strategy: MergeStrategy,
}

const fn rule(field: PromptField, ask: AskFlag, strategy: MergeStrategy) -> PromptRule {
    PromptRule {
        field,
        ask,
        strategy,
    }
}

const JOB_TEMPLATE_RULES: [PromptRule; 16] = [
    rule(PromptField::ExtraVars, AskFlag::Variables, MergeStrategy::Scalar),
    rule(PromptField::Inventory, AskFlag::Inventory, MergeStrategy::Scalar),
    rule(PromptField::ScmBranch, AskFlag::ScmBranch, MergeStrategy::Scalar),
    rule(PromptField::Limit, AskFlag::Limit, MergeStrategy::Scalar),
    rule(PromptField::JobTags, AskFlag::Tags, MergeStrategy::Scalar),
    rule(PromptField::SkipTags, AskFlag::SkipTags, MergeStrategy::Scalar),
    rule(PromptField::JobType, AskFlag::JobType, MergeStrategy::Scalar),
    rule(PromptField::Verbosity, AskFlag::Verbosity, MergeStrategy::Scalar),
    rule(PromptField::DiffMode, AskFlag::DiffMode, MergeStrategy::Scalar),
    rule(
        PromptField::Credentials,
        AskFlag::Credential,
        MergeStrategy::UnorderedSet,
    ),
    rule(
        PromptField::ExecutionEnvironment,
        AskFlag::ExecutionEnvironment,
        MergeStrategy::Scalar,
    ),
    rule(PromptField::Labels, AskFlag::Labels, MergeStrategy::UnorderedSet),
    rule(PromptField::Forks, AskFlag::Forks, MergeStrategy::Scalar),
    rule(
        PromptField::JobSliceCount,
        AskFlag::JobSliceCount,
        MergeStrategy::Scalar,
    ),
    rule(PromptField::Timeout, AskFlag::Timeout, MergeStrategy::Scalar),
    rule(
        PromptField::InstanceGroups,
        AskFlag::InstanceGroups,
        MergeStrategy::OrderedSet,
    ),
];

const SYSTEM_TEMPLATE_RULES: [PromptRule; 1] = [rule(
    PromptField::ExtraVars,
    AskFlag::Variables,
    MergeStrategy::Scalar,
)];

/// Variables a system job accepts
pub const SYSTEM_JOB_VARIABLES: [&str; 3] = ["days", "older_than", "granularity"];

/// Overridable fields of a template kind, in evaluation order
pub fn rules(kind: TemplateKind) -> &'static [PromptRule] {
    match kind {
        TemplateKind::Job => &JOB_TEMPLATE_RULES,
        TemplateKind::System => &SYSTEM_TEMPLATE_RULES,
    }
}

pub fn rule_for(kind: TemplateKind, field: PromptField) -> Option<&'static PromptRule> {
    rules(kind).iter().find(|r| r.field == field)
}

/// Field name to ask flag attribute for a template kind
pub fn ask_mapping(kind: TemplateKind) -> BTreeMap<&'static str, &'static str> {
    rules(kind)
        .iter()
        .map(|r| (r.field.name(), r.ask.attribute()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_job_template_mapping() {
        let mapping = ask_mapping(TemplateKind::Job);
        assert_eq!(mapping.len(), 16);
        assert_eq!(mapping["job_tags"], "ask_tags_on_launch");
        assert_eq!(mapping["credentials"], "ask_credential_on_launch");
        assert_eq!(mapping["extra_vars"], "ask_variables_on_launch");
    }

    #[test]
    fn test_system_template_exposes_only_variables() {
        let mapping = ask_mapping(TemplateKind::System);
        assert_eq!(mapping.len(), 1);
        assert!(mapping.contains_key("extra_vars"));
        assert!(rule_for(TemplateKind::System, PromptField::Limit).is_none());
    }

    #[test]
    fn test_kinds_share_only_variables() {
        let job: BTreeSet<PromptField> = rules(TemplateKind::Job).iter().map(|r| r.field).collect();
        let system: BTreeSet<PromptField> =
            rules(TemplateKind::System).iter().map(|r| r.field).collect();
        let shared: Vec<PromptField> = job.intersection(&system).copied().collect();
        assert_eq!(shared, vec![PromptField::ExtraVars]);
    }

    #[test]
    fn test_merge_strategies() {
        let strategy = |field| rule_for(TemplateKind::Job, field).unwrap().strategy;
        assert_eq!(strategy(PromptField::InstanceGroups), MergeStrategy::OrderedSet);
        assert_eq!(strategy(PromptField::Credentials), MergeStrategy::UnorderedSet);
        assert_eq!(strategy(PromptField::Labels), MergeStrategy::UnorderedSet);
        assert_eq!(strategy(PromptField::Limit), MergeStrategy::Scalar);
    }
}
