//! Question manifests: flows described in YAML
//!
//! ```yaml
//! questions:
//!   - type: select
//!     name: template
//!     message: Template
//!     options: [quickstart, api]
//!   - type: confirm
//!     name: git
//!     message: Initialize git?
//!     initial: true
//!     when: { answer: template, equals: quickstart }
//! ```

use crate::error::{PromptError, Result};
use crate::prompt::{
    confirm, multiselect, password, select, text, Answers, PromptBuilder, PromptConfig,
    PromptKind, SelectOption, Value, WhenFn,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Root of a questions file
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionManifest {
    pub questions: Vec<Question>,
}

impl QuestionManifest {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Convert every question, failing on the first unusable one
    pub fn into_configs(self) -> Result<Vec<PromptConfig>> {
        self.questions
            .into_iter()
            .map(Question::into_config)
            .collect()
    }
}

/// One question as written in the manifest
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    /// select, multiselect, text (or input), password, confirm
    #[serde(rename = "type")]
    pub kind: String,

    /// Answer key
    #[serde(default)]
    pub name: Option<String>,

    pub message: String,

    #[serde(default)]
    pub required: bool,

    /// Choices for select and multiselect
    #[serde(default)]
    pub options: Vec<OptionSpec>,

    #[serde(default)]
    pub searchable: bool,

    #[serde(default)]
    pub group_by: bool,

    #[serde(default)]
    pub page_size: Option<usize>,

    #[serde(default)]
    pub show_numbers: bool,

    #[serde(default)]
    pub max_width: Option<usize>,

    /// Preselected value(s), or the text used for an empty answer
    #[serde(default)]
    pub default: Option<Value>,

    /// Pre-filled text, or the starting answer of a confirm
    #[serde(default)]
    pub initial: Option<Value>,

    #[serde(default)]
    pub placeholder: Option<String>,

    /// Characters for text and password, checked options for multiselect
    #[serde(default)]
    pub min_length: Option<usize>,

    #[serde(default)]
    pub max_length: Option<usize>,

    /// Only ask when an earlier answer matches
    #[serde(default)]
    pub when: Option<WhenSpec>,
}

/// An option is either a bare value or a full record
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OptionSpec {
    Plain(String),
    Full {
        value: String,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        group: Option<String>,
        #[serde(default)]
        disabled: bool,
    },
}

impl From<OptionSpec> for SelectOption {
    fn from(spec: OptionSpec) -> Self {
        match spec {
            OptionSpec::Plain(value) => SelectOption::new(value.clone(), value),
            OptionSpec::Full {
                value,
                label,
                description,
                group,
                disabled,
            } => SelectOption {
                label: label.unwrap_or_else(|| value.clone()),
                value,
                description,
                disabled,
                group,
            },
        }
    }
}

/// Condition on an earlier answer.
///
/// With no comparison given, the question is asked when the answer exists
/// and is non-empty (or `true`).
#[derive(Debug, Clone, Deserialize)]
pub struct WhenSpec {
    pub answer: String,

    #[serde(default)]
    pub equals: Option<Value>,

    #[serde(default)]
    pub not_equals: Option<Value>,

    /// Text answer equals it, or list answer contains it
    #[serde(default)]
    pub includes: Option<String>,
}

impl WhenSpec {
    pub fn matches(&self, answers: &Answers) -> bool {
        let answer = answers.get(&self.answer);
        if let Some(expected) = &self.equals {
            return answer == Some(expected);
        }
        if let Some(unexpected) = &self.not_equals {
            return answer != Some(unexpected);
        }
        if let Some(needle) = &self.includes {
            return answer.is_some_and(|a| a.contains(needle));
        }
        match answer {
            Some(Value::Bool(b)) => *b,
            Some(value) => !value.is_empty(),
            None => false,
        }
    }

    pub fn into_predicate(self) -> WhenFn {
        Arc::new(move |answers: &Answers| self.matches(answers))
    }
}

impl Question {
    pub fn into_config(self) -> Result<PromptConfig> {
        let kind: PromptKind = self.kind.parse()?;
        let message = self.message.clone();

        let initial_text = match &self.initial {
            Some(Value::Text(s)) => Some(s.clone()),
            Some(Value::Bool(_)) | Some(Value::List(_)) if kind != PromptKind::Confirm => {
                return Err(PromptError::invalid(&message, "initial must be text"));
            }
            _ => None,
        };
        let has_limits = self.min_length.is_some() || self.max_length.is_some();
        if has_limits && matches!(kind, PromptKind::Select | PromptKind::Confirm) {
            return Err(PromptError::invalid(
                &message,
                format!("min_length and max_length don't apply to {} questions", kind),
            ));
        }
        let validator = length_validator(self.min_length, self.max_length);

        let mut config: PromptConfig = match kind {
            PromptKind::Select | PromptKind::Multiselect => {
                let builder = if kind == PromptKind::Multiselect {
                    multiselect(&message)
                } else {
                    select(&message)
                };
                let mut builder = builder
                    .options(self.options.into_iter().map(SelectOption::from))
                    .searchable(self.searchable)
                    .group_by(self.group_by);
                builder.default_value = self.default;
                if let Some(validator) = validator {
                    builder = builder.validate(validator);
                }
                builder.into()
            }
            PromptKind::Text | PromptKind::Password => {
                let mut builder = if kind == PromptKind::Password {
                    password(&message)
                } else {
                    text(&message)
                };
                builder.initial = initial_text.unwrap_or_default();
                builder.placeholder = self.placeholder;
                builder.default = self.default.map(|v| v.to_string());
                if let Some(validator) = validator {
                    builder = builder.validate(validator);
                }
                builder.into()
            }
            PromptKind::Confirm => {
                let initial = match self.initial.as_ref().or(self.default.as_ref()) {
                    None => false,
                    Some(Value::Bool(b)) => *b,
                    Some(_) => {
                        return Err(PromptError::invalid(&message, "initial must be true or false"))
                    }
                };
                confirm(&message).initial(initial).into()
            }
        };

        let common = config.common_mut();
        common.name = self.name;
        common.required = self.required;
        common.max_width = self.max_width;
        common.pagination.show_numbers = self.show_numbers;
        if let Some(page_size) = self.page_size {
            common.pagination.page_size = page_size;
        }
        common.when = self.when.map(WhenSpec::into_predicate);

        Ok(config)
    }
}

fn length_validator(
    min: Option<usize>,
    max: Option<usize>,
) -> Option<impl Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static> {
    if min.is_none() && max.is_none() {
        return None;
    }
    Some(move |value: &Value| {
        let (len, unit) = match value {
            Value::List(items) => (items.len(), "options"),
            other => (other.to_string().chars().count(), "characters"),
        };
        if let Some(min) = min {
            if len < min {
                anyhow::bail!("Must be at least {} {}", min, unit);
            }
        }
        if let Some(max) = max {
            if len > max {
                anyhow::bail!("Must be at most {} {}", max, unit);
            }
        }
        Ok(())
    })
}
