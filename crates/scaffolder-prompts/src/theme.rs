//! Prompt glyphs and role-based styling

use colored::Colorize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Semantic role of a piece of prompt output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Primary,
    Secondary,
    Success,
    Error,
    Warning,
    Disabled,
    Highlight,
    Text,
}

/// Formatting function for one role
pub type Painter = Arc<dyn Fn(&str) -> String + Send + Sync>;

fn painter(f: fn(&str) -> String) -> Painter {
    Arc::new(f)
}

/// Glyphs and role painters used when composing prompt frames
#[derive(Clone)]
pub struct Theme {
    pub prefix: String,
    pub done_prefix: String,
    pub cancel_prefix: String,
    pub pointer: String,
    pub checkbox_on: String,
    pub checkbox_off: String,
    /// Style for the character under the (hidden) terminal cursor
    pub cursor: Painter,
    styles: HashMap<Role, Painter>,
}

impl Theme {
    /// ANSI-colored theme
    pub fn colored() -> Self {
        let mut styles = HashMap::new();
        styles.insert(Role::Primary, painter(|s| s.cyan().to_string()));
        styles.insert(Role::Secondary, painter(|s| s.dimmed().to_string()));
        styles.insert(Role::Success, painter(|s| s.green().to_string()));
        styles.insert(Role::Error, painter(|s| s.red().to_string()));
        styles.insert(Role::Warning, painter(|s| s.yellow().to_string()));
        styles.insert(Role::Disabled, painter(|s| s.bright_black().strikethrough().to_string()));
        styles.insert(Role::Highlight, painter(|s| s.cyan().bold().to_string()));
        styles.insert(Role::Text, painter(|s| s.bold().to_string()));

        Self {
            prefix: "?".to_string(),
            done_prefix: "✔".to_string(),
            cancel_prefix: "✖".to_string(),
            pointer: "❯".to_string(),
            checkbox_on: "◉".to_string(),
            checkbox_off: "◯".to_string(),
            cursor: painter(|s| s.reversed().to_string()),
            styles,
        }
    }

    /// Same glyphs, no escape codes
    pub fn plain() -> Self {
        Self {
            cursor: painter(|s| s.to_string()),
            styles: HashMap::new(),
            ..Self::colored()
        }
    }

    /// Style `text` for `role`. Roles without a painter pass through unchanged.
    pub fn paint(&self, role: Role, text: &str) -> String {
        match self.styles.get(&role) {
            Some(paint) => paint(text),
            None => text.to_string(),
        }
    }

    pub fn with_style(mut self, role: Role, paint: Painter) -> Self {
        self.styles.insert(role, paint);
        self
    }

    /// Copy of this theme with per-prompt overrides applied
    pub fn apply(&self, overrides: &ThemeOverrides) -> Theme {
        if overrides.is_empty() {
            return self.clone();
        }
        let mut theme = self.clone();
        if let Some(prefix) = &overrides.prefix {
            theme.prefix = prefix.clone();
        }
        if let Some(pointer) = &overrides.pointer {
            theme.pointer = pointer.clone();
        }
        if let Some(on) = &overrides.checkbox_on {
            theme.checkbox_on = on.clone();
        }
        if let Some(off) = &overrides.checkbox_off {
            theme.checkbox_off = off.clone();
        }
        for (role, paint) in &overrides.styles {
            theme.styles.insert(*role, Arc::clone(paint));
        }
        theme
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::colored()
    }
}

impl fmt::Debug for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Theme")
            .field("prefix", &self.prefix)
            .field("pointer", &self.pointer)
            .field("checkbox_on", &self.checkbox_on)
            .field("checkbox_off", &self.checkbox_off)
            .field("styled_roles", &self.styles.len())
            .finish()
    }
}

/// Per-prompt theme changes
#[derive(Clone, Default)]
pub struct ThemeOverrides {
    pub prefix: Option<String>,
    pub pointer: Option<String>,
    pub checkbox_on: Option<String>,
    pub checkbox_off: Option<String>,
    pub styles: HashMap<Role, Painter>,
}

impl ThemeOverrides {
    pub fn is_empty(&self) -> bool {
        self.prefix.is_none()
            && self.pointer.is_none()
            && self.checkbox_on.is_none()
            && self.checkbox_off.is_none()
            && self.styles.is_empty()
    }
}
