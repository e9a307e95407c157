//! Yes/no confirmation

use super::{CommonConfig, ConfirmConfig, Prompt, PromptState, Step, Value};
use crate::input::{Key, KeyEvent};
use crate::theme::{Role, Theme};

pub struct ConfirmPrompt {
    config: ConfirmConfig,
    state: PromptState,
}

impl ConfirmPrompt {
    pub fn new(config: ConfirmConfig) -> Self {
        Self {
            config,
            state: PromptState::default(),
        }
    }

    fn current(&self) -> bool {
        self.state.value.as_bool().unwrap_or(self.config.initial)
    }

    fn set(&mut self, answer: bool) {
        self.state.value = Value::Bool(answer);
    }
}

impl Prompt for ConfirmPrompt {
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
        self.state = PromptState {
            value: Value::Bool(self.config.initial),
            ..PromptState::default()
        };
    }

    fn render(&self, theme: &Theme) -> Vec<String> {
        let (yes, no) = if self.current() {
            (
                theme.paint(Role::Highlight, &format!("{} Yes", theme.pointer)),
                theme.paint(Role::Secondary, "  No"),
            )
        } else {
            (
                theme.paint(Role::Secondary, "  Yes"),
                theme.paint(Role::Highlight, &format!("{} No", theme.pointer)),
            )
        };
        vec![format!(
            "{} {} {} {} {}",
            theme.paint(Role::Primary, &theme.prefix),
            theme.paint(Role::Text, &self.config.common.message),
            theme.paint(Role::Secondary, "›"),
            yes,
            no
        )]
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Step {
        match key.key {
            Key::Enter => return Step::Submit,
            Key::Left | Key::Right | Key::Tab | Key::BackTab | Key::Space => {
                let flipped = !self.current();
                self.set(flipped);
            }
            Key::Char(c) if key.printable().is_some() => match c.to_ascii_lowercase() {
                'y' => self.set(true),
                'n' => self.set(false),
                ' ' => self.set(!self.current()),
                _ => {}
            },
            _ => {}
        }
        Step::Continue
    }

    fn value(&self) -> Value {
        Value::Bool(self.current())
    }

    fn help(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("y/n", "answer yes or no"),
            ("←/→ tab", "toggle"),
            ("enter", "submit"),
        ]
    }
}
