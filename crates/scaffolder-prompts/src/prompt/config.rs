//! Prompt configuration and builders

use super::{Answers, Value};
use crate::error::PromptError;
use crate::theme::ThemeOverrides;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Checks a candidate answer. An `Err` is shown inline and blocks submission.
pub type Validator = Arc<dyn Fn(&Value) -> anyhow::Result<()> + Send + Sync>;

/// Decides from earlier answers whether a prompt is shown at all
pub type WhenFn = Arc<dyn Fn(&Answers) -> bool + Send + Sync>;

pub const DEFAULT_PAGE_SIZE: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_size: usize,
    /// Prefix options with their 1-based position
    pub show_numbers: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            show_numbers: false,
        }
    }
}

/// Settings shared by every prompt kind
#[derive(Clone, Default)]
pub struct CommonConfig {
    pub message: String,
    /// Key under which a flow records the answer
    pub name: Option<String>,
    pub required: bool,
    pub validate: Option<Validator>,
    pub when: Option<WhenFn>,
    pub theme: ThemeOverrides,
    pub max_width: Option<usize>,
    pub pagination: Pagination,
}

impl CommonConfig {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Evaluate the `when` predicate. Prompts without one are always shown.
    pub fn should_ask(&self, answers: &Answers) -> bool {
        self.when.as_ref().map_or(true, |when| when(answers))
    }
}

impl fmt::Debug for CommonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonConfig")
            .field("message", &self.message)
            .field("name", &self.name)
            .field("required", &self.required)
            .field("validate", &self.validate.is_some())
            .field("when", &self.when.is_some())
            .field("max_width", &self.max_width)
            .field("pagination", &self.pagination)
            .finish()
    }
}

/// One choice in a select or multiselect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub description: Option<String>,
    pub disabled: bool,
    pub group: Option<String>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            description: None,
            disabled: false,
            group: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

impl From<&str> for SelectOption {
    fn from(value: &str) -> Self {
        SelectOption::new(value, value)
    }
}

#[derive(Debug, Clone)]
pub struct SelectConfig {
    pub common: CommonConfig,
    pub options: Vec<SelectOption>,
    pub searchable: bool,
    /// Bucket options under their group headers
    pub group_by: bool,
    pub multiple: bool,
    /// Initially highlighted value (select) or checked values (multiselect)
    pub default_value: Option<Value>,
}

impl SelectConfig {
    pub fn option(mut self, option: impl Into<SelectOption>) -> Self {
        self.options.push(option.into());
        self
    }

    pub fn options<I, O>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<SelectOption>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn group_by(mut self, group_by: bool) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct TextConfig {
    pub common: CommonConfig,
    /// Pre-filled buffer contents
    pub initial: String,
    /// Dimmed hint shown while the buffer is empty
    pub placeholder: Option<String>,
    /// Answer used when the buffer is submitted empty
    pub default: Option<String>,
    /// Password mask character
    pub mask: Option<char>,
}

impl TextConfig {
    pub fn initial(mut self, initial: impl Into<String>) -> Self {
        self.initial = initial.into();
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn mask(mut self, mask: char) -> Self {
        self.mask = Some(mask);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmConfig {
    pub common: CommonConfig,
    pub initial: bool,
}

impl ConfirmConfig {
    pub fn initial(mut self, initial: bool) -> Self {
        self.initial = initial;
        self
    }
}

/// Builder methods for the settings every prompt kind shares
pub trait PromptBuilder: Sized {
    fn common_mut(&mut self) -> &mut CommonConfig;

    fn name(mut self, name: impl Into<String>) -> Self {
        self.common_mut().name = Some(name.into());
        self
    }

    fn required(mut self, required: bool) -> Self {
        self.common_mut().required = required;
        self
    }

    fn validate<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.common_mut().validate = Some(Arc::new(validator));
        self
    }

    fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Answers) -> bool + Send + Sync + 'static,
    {
        self.common_mut().when = Some(Arc::new(predicate));
        self
    }

    fn theme(mut self, overrides: ThemeOverrides) -> Self {
        self.common_mut().theme = overrides;
        self
    }

    fn max_width(mut self, width: usize) -> Self {
        self.common_mut().max_width = Some(width);
        self
    }

    fn page_size(mut self, page_size: usize) -> Self {
        self.common_mut().pagination.page_size = page_size;
        self
    }

    fn show_numbers(mut self, show_numbers: bool) -> Self {
        self.common_mut().pagination.show_numbers = show_numbers;
        self
    }
}

impl PromptBuilder for SelectConfig {
    fn common_mut(&mut self) -> &mut CommonConfig {
        &mut self.common
    }
}

impl PromptBuilder for TextConfig {
    fn common_mut(&mut self) -> &mut CommonConfig {
        &mut self.common
    }
}

impl PromptBuilder for ConfirmConfig {
    fn common_mut(&mut self) -> &mut CommonConfig {
        &mut self.common
    }
}

/// Single choice from a list
pub fn select(message: impl Into<String>) -> SelectConfig {
    SelectConfig {
        common: CommonConfig::new(message),
        options: Vec::new(),
        searchable: false,
        group_by: false,
        multiple: false,
        default_value: None,
    }
}

/// Any number of choices from a list
pub fn multiselect(message: impl Into<String>) -> SelectConfig {
    SelectConfig {
        multiple: true,
        ..select(message)
    }
}

pub fn text(message: impl Into<String>) -> TextConfig {
    TextConfig {
        common: CommonConfig::new(message),
        initial: String::new(),
        placeholder: None,
        default: None,
        mask: None,
    }
}

/// Text input with every character masked
pub fn password(message: impl Into<String>) -> TextConfig {
    text(message).mask('•')
}

/// Yes/no question, defaulting to no
pub fn confirm(message: impl Into<String>) -> ConfirmConfig {
    ConfirmConfig {
        common: CommonConfig::new(message),
        initial: false,
    }
}

/// The prompt kinds a config can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Select,
    Multiselect,
    Text,
    Password,
    Confirm,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Select => "select",
            PromptKind::Multiselect => "multiselect",
            PromptKind::Text => "text",
            PromptKind::Password => "password",
            PromptKind::Confirm => "confirm",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptKind {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "select" => Ok(PromptKind::Select),
            "multiselect" => Ok(PromptKind::Multiselect),
            "text" | "input" => Ok(PromptKind::Text),
            "password" => Ok(PromptKind::Password),
            "confirm" => Ok(PromptKind::Confirm),
            _ => Err(PromptError::UnsupportedKind(s.to_string())),
        }
    }
}

/// A prompt to ask, tagged by kind
#[derive(Debug, Clone)]
pub enum PromptConfig {
    Select(SelectConfig),
    Multiselect(SelectConfig),
    Text(TextConfig),
    Password(TextConfig),
    Confirm(ConfirmConfig),
}

impl PromptConfig {
    pub fn kind(&self) -> PromptKind {
        match self {
            PromptConfig::Select(_) => PromptKind::Select,
            PromptConfig::Multiselect(_) => PromptKind::Multiselect,
            PromptConfig::Text(_) => PromptKind::Text,
            PromptConfig::Password(_) => PromptKind::Password,
            PromptConfig::Confirm(_) => PromptKind::Confirm,
        }
    }

    pub fn common(&self) -> &CommonConfig {
        match self {
            PromptConfig::Select(c) | PromptConfig::Multiselect(c) => &c.common,
            PromptConfig::Text(c) | PromptConfig::Password(c) => &c.common,
            PromptConfig::Confirm(c) => &c.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut CommonConfig {
        match self {
            PromptConfig::Select(c) | PromptConfig::Multiselect(c) => &mut c.common,
            PromptConfig::Text(c) | PromptConfig::Password(c) => &mut c.common,
            PromptConfig::Confirm(c) => &mut c.common,
        }
    }
}

impl From<SelectConfig> for PromptConfig {
    fn from(config: SelectConfig) -> Self {
        if config.multiple {
            PromptConfig::Multiselect(config)
        } else {
            PromptConfig::Select(config)
        }
    }
}

impl From<TextConfig> for PromptConfig {
    fn from(config: TextConfig) -> Self {
        if config.mask.is_some() {
            PromptConfig::Password(config)
        } else {
            PromptConfig::Text(config)
        }
    }
}

impl From<ConfirmConfig> for PromptConfig {
    fn from(config: ConfirmConfig) -> Self {
        PromptConfig::Confirm(config)
    }
}
