//! Select and multiselect: filtering, pagination, grouping and mouse
//! hit-testing over a list of options

use super::{CommonConfig, Prompt, PromptState, SelectConfig, SelectOption, Step, Value};
use crate::error::{PromptError, Result};
use crate::input::{Key, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use crate::theme::{Role, Theme};
use std::collections::HashSet;

/// Group used for options without one
pub const DEFAULT_GROUP: &str = "Other";

/// One line of the option list, below the header
#[derive(Debug, Clone, PartialEq, Eq)]
enum Row {
    Group(String),
    Option(usize),
    Description(usize),
}

pub struct SelectPrompt {
    config: SelectConfig,
    /// Indices into `config.options` matching the query, in option order
    filtered: Vec<usize>,
    /// Checked option values (multiselect)
    chosen: HashSet<String>,
    state: PromptState,
}

impl SelectPrompt {
    /// Fails with [`PromptError::InvalidConfig`] when there is nothing to
    /// choose: no options, duplicate values, or every option disabled.
    pub fn new(mut config: SelectConfig) -> Result<Self> {
        let message = config.common.message.clone();
        if config.options.is_empty() {
            return Err(PromptError::invalid(&message, "no options given"));
        }
        let mut seen = HashSet::new();
        for option in &config.options {
            if !seen.insert(option.value.as_str()) {
                return Err(PromptError::invalid(
                    &message,
                    format!("duplicate option value '{}'", option.value),
                ));
            }
        }
        if config.options.iter().all(|o| o.disabled) {
            return Err(PromptError::invalid(&message, "every option is disabled"));
        }
        config.common.pagination.page_size = config.common.pagination.page_size.max(1);

        Ok(Self {
            config,
            filtered: Vec::new(),
            chosen: HashSet::new(),
            state: PromptState::default(),
        })
    }

    pub fn is_multiple(&self) -> bool {
        self.config.multiple
    }

    /// Options matching the current search query, in option order
    pub fn filtered(&self) -> Vec<&SelectOption> {
        self.filtered.iter().map(|&i| &self.config.options[i]).collect()
    }

    pub fn highlighted(&self) -> Option<&SelectOption> {
        self.option_at(self.state.selected_index)
    }

    /// Replace the search query, refiltering the options
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.state.search_query = query.into();
        self.state.cursor_position = self.state.search_query.chars().count();
        self.refilter();
    }

    /// Checked values in option order
    pub fn selected_values(&self) -> Vec<String> {
        self.config
            .options
            .iter()
            .filter(|o| self.chosen.contains(&o.value))
            .map(|o| o.value.clone())
            .collect()
    }

    fn page_size(&self) -> usize {
        self.config.common.pagination.page_size
    }

    fn page_count(&self) -> usize {
        self.filtered.len().div_ceil(self.page_size()).max(1)
    }

    fn option_at(&self, pos: usize) -> Option<&SelectOption> {
        self.filtered.get(pos).map(|&i| &self.config.options[i])
    }

    fn is_disabled(&self, pos: usize) -> bool {
        self.option_at(pos).map_or(true, |o| o.disabled)
    }

    fn group_of(option: &SelectOption) -> &str {
        option.group.as_deref().unwrap_or(DEFAULT_GROUP)
    }

    fn matches(option: &SelectOption, query: &str) -> bool {
        query.is_empty()
            || option.label.to_lowercase().contains(query)
            || option
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(query))
    }

    /// Rebuild `filtered` from the query, keeping the highlighted option when
    /// it still matches
    fn refilter(&mut self) {
        let previous = self.filtered.get(self.state.selected_index).copied();
        let query = self.state.search_query.to_lowercase();

        let options = &self.config.options;
        let filtered: Vec<usize> = (0..options.len())
            .filter(|&i| Self::matches(&options[i], &query))
            .collect();

        let target = previous
            .and_then(|p| filtered.iter().position(|&i| i == p))
            .unwrap_or(0);
        self.filtered = filtered;
        self.land_near(target);
    }

    /// Positions into `filtered` in the order they appear on screen.
    ///
    /// Pages are cut from `filtered` as is; with grouping, each page is then
    /// bucketed by group in the order the groups first show up on that page.
    fn display_order(&self) -> Vec<usize> {
        let len = self.filtered.len();
        if !self.config.group_by {
            return (0..len).collect();
        }
        let mut order = Vec::with_capacity(len);
        for start in (0..len).step_by(self.page_size()) {
            let end = (start + self.page_size()).min(len);
            let mut groups: Vec<&str> = Vec::new();
            for pos in start..end {
                let group = Self::group_of(&self.config.options[self.filtered[pos]]);
                if !groups.contains(&group) {
                    groups.push(group);
                }
            }
            for group in groups {
                order.extend((start..end).filter(|&pos| {
                    Self::group_of(&self.config.options[self.filtered[pos]]) == group
                }));
            }
        }
        order
    }

    /// Highlight the first enabled option at or after `target` on screen,
    /// else the nearest one before it
    fn land_near(&mut self, target: usize) {
        let len = self.filtered.len();
        if len == 0 {
            self.state.selected_index = 0;
            self.sync();
            return;
        }
        let target = target.min(len - 1);
        let order = self.display_order();
        let at = order.iter().position(|&pos| pos == target).unwrap_or(0);
        self.state.selected_index = order[at..]
            .iter()
            .chain(order[..at].iter().rev())
            .copied()
            .find(|&pos| !self.is_disabled(pos))
            .unwrap_or(target);
        self.sync();
    }

    /// Move the highlight one enabled option up or down the screen, wrapping
    /// around
    fn step(&mut self, forward: bool) {
        let order = self.display_order();
        let len = order.len();
        let Some(mut at) = order
            .iter()
            .position(|&pos| pos == self.state.selected_index)
        else {
            return;
        };
        for _ in 0..len {
            at = if forward { (at + 1) % len } else { (at + len - 1) % len };
            if !self.is_disabled(order[at]) {
                self.state.selected_index = order[at];
                break;
            }
        }
        self.sync();
    }

    fn toggle(&mut self, pos: usize) {
        let Some(option) = self.option_at(pos).filter(|o| !o.disabled) else {
            return;
        };
        let value = option.value.clone();
        if !self.chosen.remove(&value) {
            self.chosen.insert(value);
        }
        self.sync();
    }

    /// Check every enabled visible option, or uncheck them if all are checked
    fn toggle_all(&mut self) {
        let visible: Vec<String> = self
            .filtered()
            .into_iter()
            .filter(|o| !o.disabled)
            .map(|o| o.value.clone())
            .collect();
        if visible.iter().all(|v| self.chosen.contains(v)) {
            for value in &visible {
                self.chosen.remove(value);
            }
        } else {
            self.chosen.extend(visible);
        }
        self.sync();
    }

    /// Derive the index-based parts of the state from `filtered` and `chosen`
    fn sync(&mut self) {
        let selected: Vec<usize> = (0..self.filtered.len())
            .filter(|&pos| {
                self.option_at(pos)
                    .is_some_and(|o| self.chosen.contains(&o.value))
            })
            .collect();
        self.state.selected_indices = selected;
        self.state.page = self.state.selected_index / self.page_size();
        self.state.value = self.current_value();
    }

    fn current_value(&self) -> Value {
        if self.config.multiple {
            Value::List(self.selected_values())
        } else {
            match self.highlighted() {
                Some(option) if !option.disabled => Value::Text(option.value.clone()),
                _ => Value::Text(String::new()),
            }
        }
    }

    fn commit(&mut self) -> Step {
        if !self.config.multiple && self.highlighted().map_or(true, |o| o.disabled) {
            self.state.error = Some("No matching option".to_string());
            return Step::Continue;
        }
        Step::Submit
    }

    /// Rows of the current page: options, the highlighted option's
    /// description, and group headers when grouping
    fn rows(&self) -> Vec<Row> {
        let start = self.state.page * self.page_size();
        let end = (start + self.page_size()).min(self.filtered.len());
        let order = self.display_order();
        let mut rows = Vec::new();
        let mut last_group: Option<&str> = None;

        for &pos in order.get(start..end).unwrap_or_default() {
            let option = &self.config.options[self.filtered[pos]];
            if self.config.group_by {
                let group = Self::group_of(option);
                if last_group != Some(group) {
                    rows.push(Row::Group(group.to_string()));
                    last_group = Some(group);
                }
            }
            rows.push(Row::Option(pos));
            if pos == self.state.selected_index && option.description.is_some() {
                rows.push(Row::Description(pos));
            }
        }
        rows
    }

    fn render_header(&self, theme: &Theme) -> String {
        let mut header = format!(
            "{} {}",
            theme.paint(Role::Primary, &theme.prefix),
            theme.paint(Role::Text, &self.config.common.message)
        );
        if self.config.searchable {
            let query = &self.state.search_query;
            let shown = if query.is_empty() {
                theme.paint(Role::Secondary, "type to filter")
            } else {
                query.clone()
            };
            header.push_str(&format!(
                " {} {}{}",
                theme.paint(Role::Secondary, "›"),
                shown,
                (theme.cursor)(" ")
            ));
        }
        header
    }

    fn render_option(&self, pos: usize, theme: &Theme) -> String {
        let option = &self.config.options[self.filtered[pos]];
        let highlighted = pos == self.state.selected_index;

        let pointer = if highlighted {
            theme.paint(Role::Highlight, &theme.pointer)
        } else {
            " ".repeat(console::measure_text_width(&theme.pointer))
        };
        let mut line = format!("{} ", pointer);

        if self.config.multiple {
            let checkbox = if self.chosen.contains(&option.value) {
                theme.paint(Role::Success, &theme.checkbox_on)
            } else {
                theme.paint(Role::Secondary, &theme.checkbox_off)
            };
            line.push_str(&checkbox);
            line.push(' ');
        }
        if self.config.common.pagination.show_numbers {
            line.push_str(&theme.paint(Role::Secondary, &format!("{}.", pos + 1)));
            line.push(' ');
        }

        let role = if option.disabled {
            Role::Disabled
        } else if highlighted {
            Role::Highlight
        } else {
            Role::Text
        };
        line.push_str(&theme.paint(role, &option.label));
        line
    }

    fn render_footer(&self, theme: &Theme) -> Option<String> {
        let mut parts = Vec::new();
        if self.page_count() > 1 {
            parts.push(format!("Page {}/{}", self.state.page + 1, self.page_count()));
        }
        if self.config.multiple {
            parts.push(format!("{} selected", self.chosen.len()));
        }
        if parts.is_empty() {
            return None;
        }
        Some(format!("  {}", theme.paint(Role::Secondary, &parts.join(" · "))))
    }

    fn handle_digit(&mut self, digit: u32) -> Step {
        let Some(pos) = (digit as usize).checked_sub(1) else {
            return Step::Continue;
        };
        if pos >= self.filtered.len() || self.is_disabled(pos) {
            return Step::Continue;
        }
        self.state.selected_index = pos;
        self.sync();
        if self.config.multiple {
            self.toggle(pos);
            Step::Continue
        } else {
            self.commit()
        }
    }
}

impl Prompt for SelectPrompt {
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
        self.state = PromptState::default();
        self.chosen.clear();
        self.filtered.clear();

        let requested: Vec<String> = match &self.config.default_value {
            Some(Value::Text(v)) => vec![v.clone()],
            Some(Value::List(values)) => values.clone(),
            _ => Vec::new(),
        };
        let defaults: Vec<String> = requested
            .into_iter()
            .filter(|value| {
                let known = self.config.options.iter().any(|o| o.value == *value);
                if !known {
                    tracing::debug!(value = %value, "default value is not an option, ignoring");
                }
                known
            })
            .collect();

        self.refilter();

        if self.config.multiple {
            self.chosen = defaults.into_iter().collect();
            self.sync();
        } else if let Some(first) = defaults.first() {
            let position = self
                .filtered
                .iter()
                .position(|&i| self.config.options[i].value == *first);
            if let Some(pos) = position {
                self.land_near(pos);
            }
        }
    }

    fn render(&self, theme: &Theme) -> Vec<String> {
        let mut lines = vec![self.render_header(theme)];

        if self.filtered.is_empty() {
            lines.push(format!("  {}", theme.paint(Role::Secondary, "No matches")));
        }
        for row in self.rows() {
            lines.push(match row {
                Row::Group(name) => format!("  {}", theme.paint(Role::Primary, &name)),
                Row::Option(pos) => self.render_option(pos, theme),
                Row::Description(pos) => {
                    let description = self.option_at(pos).and_then(|o| o.description.as_deref());
                    format!(
                        "      {}",
                        theme.paint(Role::Secondary, description.unwrap_or_default())
                    )
                }
            });
        }
        if let Some(footer) = self.render_footer(theme) {
            lines.push(footer);
        }
        lines
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Step {
        if self.config.multiple && key.is_ctrl('a') {
            self.toggle_all();
            return Step::Continue;
        }
        if self.config.searchable && key.is_ctrl('u') {
            self.set_search_query("");
            return Step::Continue;
        }

        match key.key {
            Key::Enter => return self.commit(),
            Key::Up => self.step(false),
            Key::Down => self.step(true),
            Key::PageUp => {
                let target = self.state.selected_index.saturating_sub(self.page_size());
                self.land_near(target);
            }
            Key::PageDown => {
                let target = self.state.selected_index + self.page_size();
                self.land_near(target);
            }
            Key::Home => self.land_near(0),
            Key::End => {
                let last = self.display_order().last().copied().unwrap_or(0);
                self.land_near(last);
            }
            Key::Space | Key::Char(' ') => {
                if !self.config.multiple {
                    return self.commit();
                }
                self.toggle(self.state.selected_index);
            }
            Key::Backspace if self.config.searchable => {
                let mut query = self.state.search_query.clone();
                if query.pop().is_some() {
                    self.set_search_query(query);
                }
            }
            _ => match key.printable() {
                Some(c) if self.config.searchable => {
                    let mut query = self.state.search_query.clone();
                    query.push(c);
                    self.set_search_query(query);
                }
                Some(c) if self.config.common.pagination.show_numbers => {
                    if let Some(digit) = c.to_digit(10) {
                        return self.handle_digit(digit);
                    }
                }
                _ => {}
            },
        }
        Step::Continue
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent, line: Option<usize>) -> Step {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.step(false),
            MouseEventKind::ScrollDown => self.step(true),
            MouseEventKind::Press if mouse.button == MouseButton::Left => {
                // Line 0 is the header
                let row = line
                    .and_then(|l| l.checked_sub(1))
                    .and_then(|r| self.rows().into_iter().nth(r));
                let pos = match row {
                    Some(Row::Option(pos)) | Some(Row::Description(pos)) => pos,
                    _ => return Step::Continue,
                };
                if self.is_disabled(pos) {
                    return Step::Continue;
                }
                self.state.selected_index = pos;
                self.sync();
                if !self.config.multiple {
                    return self.commit();
                }
                self.toggle(pos);
            }
            _ => {}
        }
        Step::Continue
    }

    fn value(&self) -> Value {
        self.current_value()
    }

    fn help(&self) -> Vec<(&'static str, &'static str)> {
        let mut help = vec![("↑/↓", "move"), ("pgup/pgdn", "change page")];
        if self.config.multiple {
            help.push(("space", "toggle option"));
            help.push(("ctrl+a", "toggle all"));
            help.push(("enter", "submit selection"));
        } else {
            help.push(("enter/space", "choose"));
        }
        if self.config.searchable {
            help.push(("type", "filter options"));
        } else if self.config.common.pagination.show_numbers {
            help.push(("1-9", "pick by number"));
        }
        help
    }

    /// Labels rather than values
    fn summary(&self) -> String {
        if self.config.multiple {
            self.config
                .options
                .iter()
                .filter(|o| self.chosen.contains(&o.value))
                .map(|o| o.label.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            self.highlighted()
                .map(|o| o.label.clone())
                .unwrap_or_default()
        }
    }

    fn required_message(&self) -> &'static str {
        if self.config.multiple {
            "Please select at least one option"
        } else {
            "This field is required"
        }
    }

    fn takes_text(&self) -> bool {
        self.config.searchable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use crate::prompt::{multiselect, select, PromptBuilder};

    fn ready(config: SelectConfig) -> SelectPrompt {
        let mut prompt = SelectPrompt::new(config).unwrap();
        prompt.initialize_state();
        prompt
    }

    fn press(prompt: &mut SelectPrompt, keys: &[Key]) -> Step {
        let mut step = Step::Continue;
        for key in keys {
            step = prompt.handle_key(&(*key).into());
        }
        step
    }

    fn labels(prompt: &SelectPrompt) -> Vec<&str> {
        prompt.filtered().iter().map(|o| o.label.as_str()).collect()
    }

    fn click_line(prompt: &mut SelectPrompt, line: usize) -> Step {
        let mouse = MouseEvent::new(MouseEventKind::Press, MouseButton::Left, 4, line as u32 + 1);
        prompt.handle_mouse(&mouse, Some(line))
    }

    fn assert_invariant(prompt: &SelectPrompt) {
        let len = prompt.filtered().len();
        let index = prompt.state().selected_index;
        assert!(if len == 0 { index == 0 } else { index < len });
    }

    #[test]
    fn test_down_down_enter_picks_third() {
        let mut prompt = ready(select("Pick").options(["A", "B", "C"]));
        let step = press(&mut prompt, &[Key::Down, Key::Down, Key::Enter]);
        assert_eq!(step, Step::Submit);
        assert_eq!(prompt.value(), Value::from("C"));
    }

    #[test]
    fn test_search_then_enter() {
        let mut prompt = ready(select("Pick").options(["A", "B", "C"]).searchable(true));
        let step = press(&mut prompt, &[Key::Char('b'), Key::Enter]);
        assert_eq!(step, Step::Submit);
        assert_eq!(prompt.value(), Value::from("B"));
    }

    #[test]
    fn test_navigation_wraps_and_skips_disabled() {
        let mut prompt = ready(
            select("Pick")
                .option("a")
                .option(SelectOption::from("b").disabled(true))
                .option("c"),
        );
        press(&mut prompt, &[Key::Down]);
        assert_eq!(prompt.value(), Value::from("c"));
        press(&mut prompt, &[Key::Down]);
        assert_eq!(prompt.value(), Value::from("a"));
        press(&mut prompt, &[Key::Up]);
        assert_eq!(prompt.value(), Value::from("c"));
    }

    #[test]
    fn test_first_option_disabled_starts_on_next() {
        let prompt = ready(
            select("Pick")
                .option(SelectOption::from("a").disabled(true))
                .option("b"),
        );
        assert_eq!(prompt.value(), Value::from("b"));
    }

    #[test]
    fn test_selection_invariant_holds_through_filtering() {
        let mut prompt = ready(
            select("Pick")
                .options(["alpha", "bravo", "charlie"])
                .searchable(true),
        );
        press(&mut prompt, &[Key::End]);
        assert_eq!(prompt.state().selected_index, 2);

        prompt.set_search_query("zzz");
        assert!(labels(&prompt).is_empty());
        assert_invariant(&prompt);
        assert_eq!(press(&mut prompt, &[Key::Enter]), Step::Continue);
        assert!(prompt.state().error.is_some());

        prompt.set_search_query("a");
        assert_invariant(&prompt);
        prompt.set_search_query("br");
        assert_eq!(labels(&prompt), vec!["bravo"]);
        assert_invariant(&prompt);
        press(&mut prompt, &[Key::Down, Key::Up, Key::PageDown, Key::End]);
        assert_invariant(&prompt);
    }

    #[test]
    fn test_refilter_keeps_highlight_when_still_visible() {
        let mut prompt = ready(
            select("Pick")
                .options(["alpha", "bravo", "charlie"])
                .searchable(true),
        );
        press(&mut prompt, &[Key::Down, Key::Down]);
        prompt.set_search_query("a");
        assert_eq!(prompt.highlighted().map(|o| o.value.as_str()), Some("charlie"));
    }

    #[test]
    fn test_search_matches_description_case_insensitively() {
        let mut prompt = ready(
            select("Pick")
                .option(SelectOption::new("api", "API").description("REST service"))
                .option(SelectOption::new("cli", "CLI").description("Command line")),
        );
        prompt.set_search_query("rest");
        assert_eq!(labels(&prompt), vec!["API"]);
    }

    #[test]
    fn test_toggle_twice_is_identity() {
        let mut prompt = ready(multiselect("Pick").options(["A", "B", "C"]));
        press(&mut prompt, &[Key::Down, Key::Space]);
        let before = prompt.state().clone();

        press(&mut prompt, &[Key::Space, Key::Space]);
        assert_eq!(prompt.state(), &before);
        assert_eq!(prompt.value(), Value::List(vec!["B".to_string()]));
    }

    #[test]
    fn test_selection_survives_filtering_by_value() {
        let mut prompt = ready(
            multiselect("Pick")
                .options(["alpha", "bravo", "charlie"])
                .searchable(true),
        );
        press(&mut prompt, &[Key::Space, Key::Down, Key::Down, Key::Space]);
        assert_eq!(prompt.state().selected_indices, vec![0, 2]);

        prompt.set_search_query("r");
        assert_eq!(labels(&prompt), vec!["bravo", "charlie"]);
        assert_eq!(prompt.state().selected_indices, vec![1]);

        prompt.set_search_query("");
        assert_eq!(prompt.state().selected_indices, vec![0, 2]);
        assert_eq!(
            prompt.value(),
            Value::List(vec!["alpha".to_string(), "charlie".to_string()])
        );
    }

    #[test]
    fn test_ctrl_a_toggles_all_enabled_visible() {
        let mut prompt = ready(
            multiselect("Pick")
                .option("a")
                .option(SelectOption::from("b").disabled(true))
                .option("c"),
        );
        let ctrl_a = KeyEvent::new(Key::Char('a'), Modifiers::CTRL);

        prompt.handle_key(&ctrl_a);
        assert_eq!(prompt.selected_values(), vec!["a", "c"]);
        prompt.handle_key(&ctrl_a);
        assert!(prompt.selected_values().is_empty());
    }

    #[test]
    fn test_multiselect_defaults_are_checked() {
        let prompt = ready(
            multiselect("Languages")
                .options(["typescript", "python", "javascript"])
                .default_value(vec!["python".to_string(), "nope".to_string()]),
        );
        assert_eq!(prompt.value(), Value::List(vec!["python".to_string()]));
    }

    #[test]
    fn test_single_default_is_highlighted() {
        let prompt = ready(select("Pick").options(["a", "b", "c"]).default_value("b"));
        assert_eq!(prompt.state().selected_index, 1);
    }

    #[test]
    fn test_pagination_follows_highlight() {
        let mut prompt = ready(
            select("Pick")
                .options(["1", "2", "3", "4", "5"])
                .page_size(2),
        );
        press(&mut prompt, &[Key::Down, Key::Down]);
        assert_eq!(prompt.state().page, 1);

        let lines = prompt.render(&Theme::plain());
        assert_eq!(
            lines,
            vec![
                "? Pick".to_string(),
                "❯ 3".to_string(),
                "  4".to_string(),
                "  Page 2/3".to_string(),
            ]
        );

        press(&mut prompt, &[Key::PageDown]);
        assert_eq!(prompt.value(), Value::from("5"));
        press(&mut prompt, &[Key::Home]);
        assert_eq!(prompt.state().page, 0);
    }

    #[test]
    fn test_digit_shortcuts() {
        let mut prompt = ready(select("Pick").options(["a", "b", "c"]).show_numbers(true));
        assert_eq!(press(&mut prompt, &[Key::Char('3')]), Step::Submit);
        assert_eq!(prompt.value(), Value::from("c"));
        assert!(prompt.render(&Theme::plain())[1].contains("1. a"));

        let mut multi = ready(multiselect("Pick").options(["a", "b", "c"]).show_numbers(true));
        press(&mut multi, &[Key::Char('2'), Key::Char('9')]);
        assert_eq!(multi.selected_values(), vec!["b"]);
    }

    #[test]
    fn test_grouped_rows_and_hit_testing() {
        let mut prompt = ready(
            select("Template")
                .option(
                    SelectOption::new("quickstart", "Quickstart")
                        .group("Starter")
                        .description("Smallest project"),
                )
                .option(SelectOption::new("api", "API").group("Backend"))
                .option(SelectOption::new("minimal", "Minimal").group("Starter"))
                .group_by(true),
        );

        let lines = prompt.render(&Theme::plain());
        assert_eq!(
            lines,
            vec![
                "? Template".to_string(),
                "  Starter".to_string(),
                "❯ Quickstart".to_string(),
                "      Smallest project".to_string(),
                "  Minimal".to_string(),
                "  Backend".to_string(),
                "  API".to_string(),
            ]
        );

        // Header lines do nothing
        assert_eq!(click_line(&mut prompt, 0), Step::Continue);
        assert_eq!(click_line(&mut prompt, 5), Step::Continue);
        assert_eq!(prompt.state().selected_index, 0);

        assert_eq!(click_line(&mut prompt, 6), Step::Submit);
        assert_eq!(prompt.value(), Value::from("api"));
    }

    #[test]
    fn test_ungrouped_options_fall_into_other() {
        let prompt = ready(
            select("Pick")
                .option(SelectOption::from("a"))
                .option(SelectOption::from("b").group("Named"))
                .group_by(true),
        );
        let lines = prompt.render(&Theme::plain());
        assert_eq!(lines[1], "  Other");
        assert_eq!(lines[3], "  Named");
    }

    fn grouped(page_size: usize) -> SelectConfig {
        select("Pick")
            .option(SelectOption::from("a").group("G1"))
            .option(SelectOption::from("b").group("G2"))
            .option(SelectOption::from("c").group("G1"))
            .page_size(page_size)
            .group_by(true)
    }

    #[test]
    fn test_grouping_buckets_only_the_visible_page() {
        let mut prompt = ready(grouped(2));
        assert_eq!(labels(&prompt), vec!["a", "b", "c"]);
        assert_eq!(
            prompt.render(&Theme::plain()),
            vec![
                "? Pick".to_string(),
                "  G1".to_string(),
                "❯ a".to_string(),
                "  G2".to_string(),
                "  b".to_string(),
                "  Page 1/2".to_string(),
            ]
        );

        press(&mut prompt, &[Key::Down]);
        assert_eq!(prompt.value(), Value::from("b"));
        press(&mut prompt, &[Key::Down]);
        assert_eq!(prompt.value(), Value::from("c"));
        assert_eq!(prompt.state().page, 1);
        assert_eq!(prompt.render(&Theme::plain())[1], "  G1");

        press(&mut prompt, &[Key::Up]);
        assert_eq!(prompt.value(), Value::from("b"));
    }

    #[test]
    fn test_navigation_follows_grouped_screen_order() {
        let mut prompt = ready(grouped(7));
        // On screen: G1 a, c then G2 b
        press(&mut prompt, &[Key::Down]);
        assert_eq!(prompt.value(), Value::from("c"));
        press(&mut prompt, &[Key::Down]);
        assert_eq!(prompt.value(), Value::from("b"));
        press(&mut prompt, &[Key::Down]);
        assert_eq!(prompt.value(), Value::from("a"));

        press(&mut prompt, &[Key::End]);
        assert_eq!(prompt.value(), Value::from("b"));
        press(&mut prompt, &[Key::Home]);
        assert_eq!(prompt.value(), Value::from("a"));

        // Line 3 is c, listed under G1 before the G2 header
        assert_eq!(click_line(&mut prompt, 3), Step::Submit);
        assert_eq!(prompt.value(), Value::from("c"));
    }

    #[test]
    fn test_click_toggles_in_multiselect() {
        let mut prompt = ready(multiselect("Pick").options(["a", "b", "c"]));
        assert_eq!(click_line(&mut prompt, 2), Step::Continue);
        assert_eq!(prompt.selected_values(), vec!["b"]);
        assert_eq!(prompt.state().selected_index, 1);
        click_line(&mut prompt, 2);
        assert!(prompt.selected_values().is_empty());
    }

    #[test]
    fn test_wheel_moves_highlight() {
        let mut prompt = ready(select("Pick").options(["a", "b"]));
        let wheel = MouseEvent::new(MouseEventKind::ScrollDown, MouseButton::None, 1, 1);
        prompt.handle_mouse(&wheel, None);
        assert_eq!(prompt.value(), Value::from("b"));
    }

    #[test]
    fn test_rejects_unusable_option_lists() {
        assert!(matches!(
            SelectPrompt::new(select("Empty")),
            Err(PromptError::InvalidConfig { .. })
        ));
        assert!(matches!(
            SelectPrompt::new(select("Dupes").options(["a", "a"])),
            Err(PromptError::InvalidConfig { .. })
        ));
        assert!(matches!(
            SelectPrompt::new(select("Off").option(SelectOption::from("a").disabled(true))),
            Err(PromptError::InvalidConfig { .. })
        ));
    }
}
