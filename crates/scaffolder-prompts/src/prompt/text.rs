//! Single-line text and password input

use super::{CommonConfig, Prompt, PromptState, Step, TextConfig, Value};
use crate::input::{Key, KeyEvent};
use crate::theme::{Role, Theme};

pub struct TextPrompt {
    config: TextConfig,
    buffer: Vec<char>,
    state: PromptState,
}

impl TextPrompt {
    pub fn new(config: TextConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            state: PromptState::default(),
        }
    }

    fn sync_value(&mut self) {
        self.state.value = Value::Text(self.buffer.iter().collect());
    }

    fn insert(&mut self, c: char) {
        let at = self.state.cursor_position;
        self.buffer.insert(at, c);
        self.state.cursor_position = at + 1;
    }

    fn render_input(&self, theme: &Theme) -> String {
        let cursor = self.state.cursor_position;

        if self.buffer.is_empty() {
            return match &self.config.placeholder {
                Some(placeholder) => {
                    let mut chars = placeholder.chars();
                    let first = chars.next().map(String::from).unwrap_or_default();
                    format!(
                        "{}{}",
                        (theme.cursor)(&first),
                        theme.paint(Role::Secondary, chars.as_str())
                    )
                }
                None => (theme.cursor)(" "),
            };
        }

        let shown: Vec<char> = match self.config.mask {
            Some(mask) => vec![mask; self.buffer.len()],
            None => self.buffer.clone(),
        };
        let before: String = shown[..cursor].iter().collect();
        let (under, after) = match shown.get(cursor) {
            Some(c) => (c.to_string(), shown[cursor + 1..].iter().collect()),
            None => (" ".to_string(), String::new()),
        };
        format!("{}{}{}", before, (theme.cursor)(&under), after)
    }
}

impl Prompt for TextPrompt {
    fn common(&self) -> &CommonConfig {
        &self.config.common
    }

    fn state(&self) -> &PromptState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PromptState {
        &mut self.state
    }

    fn initialize_state(&mut self) {
        self.buffer = self.config.initial.chars().collect();
        self.state = PromptState {
            cursor_position: self.buffer.len(),
            ..PromptState::default()
        };
        self.sync_value();
    }

    fn render(&self, theme: &Theme) -> Vec<String> {
        let mut header = format!(
            "{} {}",
            theme.paint(Role::Primary, &theme.prefix),
            theme.paint(Role::Text, &self.config.common.message)
        );
        if let Some(default) = &self.config.default {
            header.push(' ');
            header.push_str(&theme.paint(Role::Secondary, &format!("({})", default)));
        }
        vec![format!(
            "{} {} {}",
            header,
            theme.paint(Role::Secondary, "›"),
            self.render_input(theme)
        )]
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Step {
        let len = self.buffer.len();
        let cursor = self.state.cursor_position;

        if key.is_ctrl('u') {
            self.buffer.clear();
            self.state.cursor_position = 0;
        } else if key.is_ctrl('a') {
            self.state.cursor_position = 0;
        } else if key.is_ctrl('e') {
            self.state.cursor_position = len;
        } else {
            match key.key {
                Key::Enter => return Step::Submit,
                Key::Left => self.state.cursor_position = cursor.saturating_sub(1),
                Key::Right => self.state.cursor_position = (cursor + 1).min(len),
                Key::Home => self.state.cursor_position = 0,
                Key::End => self.state.cursor_position = len,
                Key::Backspace if cursor > 0 => {
                    self.buffer.remove(cursor - 1);
                    self.state.cursor_position = cursor - 1;
                }
                Key::Delete if cursor < len => {
                    self.buffer.remove(cursor);
                }
                _ => match key.printable() {
                    Some(c) => self.insert(c),
                    None => return Step::Continue,
                },
            }
        }

        self.sync_value();
        Step::Continue
    }

    /// The buffer, or the configured default when the buffer is empty
    fn value(&self) -> Value {
        match &self.config.default {
            Some(default) if self.buffer.is_empty() => Value::Text(default.clone()),
            _ => self.state.value.clone(),
        }
    }

    fn help(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("←/→", "move cursor"),
            ("home/end", "jump to start/end"),
            ("ctrl+u", "clear input"),
            ("enter", "submit"),
        ]
    }

    fn summary(&self) -> String {
        let value = self.value().to_string();
        match self.config.mask {
            Some(mask) => std::iter::repeat(mask).take(value.chars().count()).collect(),
            None => value,
        }
    }

    fn takes_text(&self) -> bool {
        true
    }
}
