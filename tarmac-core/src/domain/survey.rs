//! Survey domain types
//!
//! A survey is an ordered list of questions a template asks at launch time. Each
//! question binds its answer to one extra variable.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Value stored in place of a survey password
pub const REDACTED: &str = "$encrypted$";

/// Survey attached to a job template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveySpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub spec: Vec<SurveyQuestion>,
}

impl SurveySpec {
    /// Variable names declared by the survey, in a stable order
    pub fn variables(&self) -> BTreeSet<String> {
        self.spec.iter().map(|q| q.variable.clone()).collect()
    }

    pub fn question(&self, variable: &str) -> Option<&SurveyQuestion> {
        self.spec.iter().find(|q| q.variable == variable)
    }

    pub fn is_empty(&self) -> bool {
        self.spec.is_empty()
    }
}

/// Question answer type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Text,
    Textarea,
    Password,
    Integer,
    Float,
    #[serde(rename = "multiplechoice")]
    MultipleChoice,
    #[serde(rename = "multiselect")]
    MultiSelect,
}

/// A single survey question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyQuestion {
    #[serde(default)]
    pub question_name: String,

    /// Extra variable the answer is stored under
    pub variable: String,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub default: Option<Value>,

    /// Minimum length for text answers, minimum value for numeric answers
    #[serde(default)]
    pub min: Option<i64>,

    /// Maximum length for text answers, maximum value for numeric answers
    #[serde(default)]
    pub max: Option<i64>,

    #[serde(default, deserialize_with = "deserialize_choices")]
    pub choices: Vec<String>,
}

impl SurveyQuestion {
    /// Default value usable when the question is left unanswered
    ///
    /// An empty string default counts as no default.
    pub fn effective_default(&self) -> Option<&Value> {
        match &self.default {
            Some(Value::Null) | None => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(value) => Some(value),
        }
    }

    pub fn is_password(&self) -> bool {
        self.question_type == QuestionType::Password
    }
}

/// Copy of `vars` with every recorded survey password replaced by its redacted value
pub fn display_extra_vars(
    vars: &Map<String, Value>,
    survey_passwords: &BTreeMap<String, String>,
) -> Map<String, Value> {
    let mut shown = vars.clone();
    for (key, redacted) in survey_passwords {
        if let Some(value) = shown.get_mut(key) {
            *value = Value::String(redacted.clone());
        }
    }
    shown
}

/// Choices are stored either as a list or as newline separated text
fn deserialize_choices<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Choices {
        List(Vec<String>),
        Text(String),
    }

    Ok(match Option::<Choices>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Choices::List(list)) => list,
        Some(Choices::Text(text)) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choices_from_newline_text() {
        let question: SurveyQuestion = serde_json::from_value(serde_json::json!({
            "variable": "env",
            "type": "multiplechoice",
            "choices": "dev\nstaging\n\nprod"
        }))
        .unwrap();

        assert_eq!(question.choices, vec!["dev", "staging", "prod"]);
        assert_eq!(question.question_type, QuestionType::MultipleChoice);
    }

    #[test]
    fn test_choices_from_list() {
        let question: SurveyQuestion = serde_json::from_value(serde_json::json!({
            "variable": "regions",
            "type": "multiselect",
            "choices": ["eu", "us"]
        }))
        .unwrap();

        assert_eq!(question.choices, vec!["eu", "us"]);
    }

    #[test]
    fn test_empty_default_is_not_a_default() {
        let question: SurveyQuestion = serde_json::from_value(serde_json::json!({
            "variable": "token",
            "type": "password",
            "default": ""
        }))
        .unwrap();

        assert!(question.effective_default().is_none());
        assert!(question.is_password());
    }

    #[test]
    fn test_display_extra_vars_redacts_passwords() {
        let vars = serde_json::json!({"secret": "hunter2", "region": "eu"});
        let vars = vars.as_object().unwrap();
        let passwords = BTreeMap::from([
            ("secret".to_string(), REDACTED.to_string()),
            ("absent".to_string(), REDACTED.to_string()),
        ]);

        let shown = display_extra_vars(vars, &passwords);
        assert_eq!(shown["secret"], REDACTED);
        assert_eq!(shown["region"], "eu");
        assert!(!shown.contains_key("absent"));
    }

    #[test]
    fn test_survey_variables() {
        let survey: SurveySpec = serde_json::from_value(serde_json::json!({
            "spec": [
                {"variable": "b", "type": "text"},
                {"variable": "a", "type": "integer"}
            ]
        }))
        .unwrap();

        let vars: Vec<String> = survey.variables().into_iter().collect();
        assert_eq!(vars, vec!["a", "b"]);
        assert!(survey.question("a").is_some());
        assert!(survey.question("c").is_none());
    }
}
