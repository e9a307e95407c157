//! Prompt framework: shared state, the [`Prompt`] capability trait and the
//! answer values prompts produce
//!
//! Every variant owns a [`PromptState`] and implements a pure `render` plus
//! key/mouse handlers. The run loop in [`engine`] drives the lifecycle:
//!
//! ```text
//! initialize_state -> render -> (handle event -> render)* -> submit | cancel
//! ```

pub mod config;
pub mod confirm;
pub mod engine;
pub mod select;
pub mod text;

use crate::input::{KeyEvent, MouseEvent};
use crate::theme::Theme;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub use config::{
    confirm, multiselect, password, select, text, CommonConfig, ConfirmConfig, Pagination,
    PromptBuilder, PromptConfig, PromptKind, SelectConfig, SelectOption, TextConfig, Validator,
    WhenFn,
};
pub use engine::{prompt, prompt_in_flow, validate, Renderer};

/// An answer: text, yes/no, or a list of option values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

impl Value {
    /// Empty text or empty list. Booleans are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Bool(_) => false,
            Value::Text(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Text equals `needle`, or list contains it
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            Value::Text(s) => s == needle,
            Value::List(items) => items.iter().any(|item| item == needle),
            Value::Bool(_) => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Text(String::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => write!(f, "yes"),
            Value::Bool(false) => write!(f, "no"),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

/// Answers accumulated by a flow, in the order they were given
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answers {
    entries: Vec<(String, Value)>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Record an answer, replacing an earlier one with the same name in place
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Answers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Mutable per-prompt record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptState {
    pub value: Value,
    /// Highlight position within the filtered option list
    pub selected_index: usize,
    /// Multiselect: positions in the filtered list that are checked
    pub selected_indices: Vec<usize>,
    pub search_query: String,
    /// Cursor position in characters
    pub cursor_position: usize,
    pub page: usize,
    pub error: Option<String>,
    pub show_help: bool,
    pub done: bool,
    pub cancelled: bool,
}

/// Outcome of one prompt, produced exactly once
#[derive(Debug, Clone, PartialEq)]
pub struct PromptResult {
    pub name: Option<String>,
    pub value: Value,
    pub cancelled: bool,
}

/// What the run loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Submit,
    Cancel,
}

/// Capabilities every prompt variant provides.
///
/// Rendering is pure: it reads state and returns lines, line 0 being the
/// question header. The framework appends the error and help lines, so mouse
/// line numbers passed to `handle_mouse` index into the variant's own lines.
pub trait Prompt: Send + Sync {
    fn common(&self) -> &CommonConfig;

    fn state(&self) -> &PromptState;

    fn state_mut(&mut self) -> &mut PromptState;

    /// Reset state to a consistent starting point
    fn initialize_state(&mut self);

    fn render(&self, theme: &Theme) -> Vec<String>;

    fn handle_key(&mut self, key: &KeyEvent) -> Step;

    /// `line` is the frame line under the pointer, when known
    fn handle_mouse(&mut self, _mouse: &MouseEvent, _line: Option<usize>) -> Step {
        Step::Continue
    }

    fn value(&self) -> Value;

    /// Key bindings shown in the help block
    fn help(&self) -> Vec<(&'static str, &'static str)>;

    /// Value as shown once the prompt is answered
    fn summary(&self) -> String {
        self.value().to_string()
    }

    /// Message shown when a required prompt is submitted empty
    fn required_message(&self) -> &'static str {
        "This field is required"
    }

    /// Whether printable keys are consumed as text input
    fn takes_text(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_emptiness() {
        assert!(Value::default().is_empty());
        assert!(Value::List(vec![]).is_empty());
        assert!(!Value::Bool(false).is_empty());
        assert!(!Value::from("x").is_empty());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Bool(true).to_string(), "yes");
        assert_eq!(
            Value::from(vec!["ts".to_string(), "py".to_string()]).to_string(),
            "ts, py"
        );
    }

    #[test]
    fn test_value_deserializes_untagged() {
        let v: Value = serde_yaml::from_str("true").unwrap();
        assert_eq!(v, Value::Bool(true));
        let v: Value = serde_yaml::from_str("api").unwrap();
        assert_eq!(v, Value::from("api"));
        let v: Value = serde_yaml::from_str("[a, b]").unwrap();
        assert_eq!(v, Value::List(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_answers_keep_order_and_replace_in_place() {
        let mut answers = Answers::new();
        answers.insert("b", Value::from("one"));
        answers.insert("a", Value::Bool(true));
        answers.insert("b", Value::from("two"));

        let keys: Vec<&str> = answers.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(answers.get("b"), Some(&Value::from("two")));

        let yaml = serde_yaml::to_string(&answers).unwrap();
        assert_eq!(yaml, "b: two\na: true\n");
    }
}
