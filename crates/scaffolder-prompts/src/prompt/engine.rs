//! Prompt run loop and renderer

use super::{Prompt, PromptResult, Step, Validator, Value};
use crate::error::{PromptError, Result};
use crate::input::{InputEvent, Key};
use crate::session::terminal::{ansi, Terminal};
use crate::session::Session;
use crate::theme::{Role, Theme};
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Once;
use tokio::sync::mpsc;

/// Writes prompt frames, coalescing renders requested while a write is in
/// flight into a single follow-up frame.
#[derive(Debug, Default)]
pub struct Renderer {
    /// Frames start at the top-left of the alternate screen
    anchored: bool,
    in_flight: AtomicBool,
    pending: AtomicBool,
    /// Lines in the last frame written
    height: AtomicUsize,
}

impl Renderer {
    pub fn new(anchored: bool) -> Self {
        Self {
            anchored,
            ..Default::default()
        }
    }

    /// Compose and write a frame.
    ///
    /// If a write is already in flight the request is only recorded; the
    /// in-flight call then composes one more frame from the latest state
    /// after its write completes. Write failures are logged and dropped.
    pub async fn render_screen<F>(&self, terminal: &dyn Terminal, compose: F)
    where
        F: Fn() -> Vec<String> + Send,
    {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.pending.store(true, Ordering::SeqCst);
            return;
        }

        loop {
            let lines = compose();
            let frame = self.frame(&lines);
            match terminal.write(&frame).await {
                Ok(()) => self.height.store(lines.len(), Ordering::SeqCst),
                Err(e) => tracing::warn!("failed to write prompt frame: {}", e),
            }
            if !self.pending.swap(false, Ordering::SeqCst) {
                break;
            }
        }

        self.in_flight.store(false, Ordering::SeqCst);
    }

    /// Move past the last frame so later output doesn't overwrite it
    pub async fn finish(&self, terminal: &dyn Terminal) {
        if self.anchored {
            return;
        }
        if let Err(e) = terminal.write("\r\n").await {
            tracing::warn!("failed to write prompt frame: {}", e);
        }
    }

    fn frame(&self, lines: &[String]) -> String {
        let mut out = String::new();
        if self.anchored {
            out.push_str(ansi::CLEAR_FROM_HOME);
        } else {
            let previous = self.height.load(Ordering::SeqCst);
            if previous > 0 {
                out.push('\r');
                if previous > 1 {
                    out.push_str(&ansi::cursor_up(previous - 1));
                }
                out.push_str(ansi::CLEAR_TO_END);
            }
        }
        out.push_str(&lines.join("\r\n"));
        out
    }
}

thread_local! {
    static IN_VALIDATOR: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Wrap the process panic hook, once, so panics raised inside [`validate`]
/// on this thread skip it. The hook is process-global: panics anywhere else
/// still reach whatever hook was installed before the first validation.
fn quiet_validator_panics() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !IN_VALIDATOR.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Run a validator, turning both errors and panics into a message.
///
/// Caught panics don't print or run the embedder's panic hook.
pub fn validate(validator: &Validator, value: &Value) -> std::result::Result<(), String> {
    quiet_validator_panics();
    IN_VALIDATOR.with(|flag| flag.set(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| validator(value)));
    IN_VALIDATOR.with(|flag| flag.set(false));

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Validation failed".to_string()
    }
}

/// The line a finished prompt leaves behind
pub fn summary_line(prompt: &dyn Prompt, theme: &Theme) -> String {
    let message = &prompt.common().message;
    if prompt.state().cancelled {
        return format!(
            "{} {}",
            theme.paint(Role::Error, &theme.cancel_prefix),
            theme.paint(Role::Secondary, message)
        );
    }
    format!(
        "{} {} {} {}",
        theme.paint(Role::Success, &theme.done_prefix),
        theme.paint(Role::Text, message),
        theme.paint(Role::Secondary, "·"),
        theme.paint(Role::Highlight, &prompt.summary())
    )
}

/// Full frame for the prompt's current state: the variant's lines plus the
/// error line and help block, cut to `width` columns
pub fn compose(prompt: &dyn Prompt, theme: &Theme, width: Option<usize>) -> Vec<String> {
    let state = prompt.state();
    let mut lines = if state.done {
        vec![summary_line(prompt, theme)]
    } else {
        let mut lines = prompt.render(theme);
        if let Some(error) = &state.error {
            lines.push(theme.paint(Role::Error, &format!("  {}", error)));
        }
        if state.show_help {
            let mut bindings = prompt.help();
            bindings.push(("esc", "cancel"));
            bindings.push(("f1", "toggle help"));
            for (keys, action) in bindings {
                lines.push(format!(
                    "  {} {}",
                    theme.paint(Role::Highlight, &format!("{:<12}", keys)),
                    theme.paint(Role::Secondary, action)
                ));
            }
        }
        lines
    };

    if let Some(width) = width.filter(|w| *w > 1) {
        for line in &mut lines {
            if console::measure_text_width(line) > width {
                *line = console::truncate_str(line, width, "…").into_owned();
            }
        }
    }
    lines
}

/// Ask a single prompt on its own: starts the session, runs the prompt and
/// stops the session again, also when the prompt fails.
pub async fn prompt(session: &Session, prompt: &mut dyn Prompt) -> Result<PromptResult> {
    session.start()?;
    let result = prompt_in_flow(session, prompt).await;
    let stopped = session.stop();
    let result = result?;
    stopped?;
    Ok(result)
}

/// Run a prompt on an already started session. Resolves once, on submit or
/// cancel; fails with [`PromptError::InputClosed`] if input ends first.
pub async fn prompt_in_flow(session: &Session, prompt: &mut dyn Prompt) -> Result<PromptResult> {
    prompt.initialize_state();
    let theme = session.theme().apply(&prompt.common().theme);
    let renderer = Renderer::new(session.is_anchored());

    let (tx, mut rx) = mpsc::unbounded_channel();
    session.set_current_prompt(Some(tx));
    if session.hub().is_closed() {
        session.set_current_prompt(None);
        return Err(PromptError::InputClosed);
    }
    tracing::debug!(message = %prompt.common().message, "prompt active");

    let outcome = run(session, prompt, &theme, &renderer, &mut rx).await;
    session.set_current_prompt(None);
    let cancelled = outcome?;

    let state = prompt.state_mut();
    state.done = true;
    state.cancelled = cancelled;
    draw(session, prompt, &theme, &renderer).await;
    renderer.finish(session.terminal().as_ref()).await;

    tracing::debug!(cancelled, "prompt finished");
    Ok(PromptResult {
        name: prompt.common().name.clone(),
        value: prompt.value(),
        cancelled,
    })
}

/// Event loop. Returns whether the prompt was cancelled.
async fn run(
    session: &Session,
    prompt: &mut dyn Prompt,
    theme: &Theme,
    renderer: &Renderer,
    events: &mut mpsc::UnboundedReceiver<InputEvent>,
) -> Result<bool> {
    draw(session, prompt, theme, renderer).await;

    loop {
        let event = events.recv().await.ok_or(PromptError::InputClosed)?;
        let mut step = handle_event(session, prompt, &event);

        // Apply whatever else is queued before drawing again
        while step == Step::Continue {
            match events.try_recv() {
                Ok(event) => step = handle_event(session, prompt, &event),
                Err(_) => break,
            }
        }

        match step {
            Step::Submit => return Ok(false),
            Step::Cancel => return Ok(true),
            Step::Continue => draw(session, prompt, theme, renderer).await,
        }
    }
}

async fn draw(session: &Session, prompt: &dyn Prompt, theme: &Theme, renderer: &Renderer) {
    let width = prompt
        .common()
        .max_width
        .or_else(|| session.terminal().width());
    renderer
        .render_screen(session.terminal().as_ref(), || {
            compose(prompt, theme, width)
        })
        .await;
}

fn handle_event(session: &Session, prompt: &mut dyn Prompt, event: &InputEvent) -> Step {
    let step = match event {
        InputEvent::Key(key) => {
            if key.key == Key::Escape || key.is_ctrl('c') {
                return Step::Cancel;
            }
            if key.key == Key::F(1) || (key.printable() == Some('?') && !prompt.takes_text()) {
                let state = prompt.state_mut();
                state.show_help = !state.show_help;
                return Step::Continue;
            }
            prompt.state_mut().error = None;
            prompt.handle_key(key)
        }
        InputEvent::Mouse(mouse) => {
            // Frame line 0 sits on terminal row 1 only when anchored
            let line = if session.is_anchored() {
                (mouse.y as usize).checked_sub(1)
            } else {
                None
            };
            prompt.handle_mouse(mouse, line)
        }
    };

    if step == Step::Submit {
        if let Err(message) = check_submission(prompt) {
            prompt.state_mut().error = Some(message);
            return Step::Continue;
        }
    }
    step
}

fn check_submission(prompt: &dyn Prompt) -> std::result::Result<(), String> {
    let common = prompt.common();
    let value = prompt.value();
    if common.required && value.is_empty() {
        return Err(prompt.required_message().to_string());
    }
    match &common.validate {
        Some(validator) => validate(validator, &value),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{confirm, text, PromptBuilder};
    use crate::prompt::confirm::ConfirmPrompt;
    use crate::prompt::text::TextPrompt;
    use crate::session::terminal::MemoryTerminal;
    use crate::testing::{self, key, Headless};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_renders_during_write_coalesce_into_one_follow_up() {
        let terminal = MemoryTerminal::new().with_write_delay(Duration::from_millis(20));
        let renderer = Renderer::new(true);
        let calls = AtomicUsize::new(0);
        let compose = || vec![format!("frame {}", calls.fetch_add(1, Ordering::SeqCst))];

        tokio::join!(
            renderer.render_screen(&terminal, compose),
            renderer.render_screen(&terminal, compose),
            renderer.render_screen(&terminal, compose),
            renderer.render_screen(&terminal, compose),
        );

        let frames = terminal.frames();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].ends_with("frame 0"));
        assert!(frames[1].ends_with("frame 1"));

        renderer.render_screen(&terminal, compose).await;
        assert_eq!(terminal.frames().len(), 3);
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let terminal = MemoryTerminal::new();
        let renderer = Renderer::new(true);

        terminal.fail_writes(true);
        renderer.render_screen(&terminal, || vec!["a".to_string()]).await;
        assert!(terminal.frames().is_empty());

        terminal.fail_writes(false);
        renderer.render_screen(&terminal, || vec!["b".to_string()]).await;
        assert_eq!(terminal.frames(), vec![format!("{}b", ansi::CLEAR_FROM_HOME)]);
    }

    #[tokio::test]
    async fn test_inline_frames_erase_previous_frame() {
        let terminal = MemoryTerminal::new();
        let renderer = Renderer::new(false);
        let lines = || vec!["one".to_string(), "two".to_string(), "three".to_string()];

        renderer.render_screen(&terminal, lines).await;
        renderer.render_screen(&terminal, lines).await;

        let frames = terminal.frames();
        assert_eq!(frames[0], "one\r\ntwo\r\nthree");
        assert_eq!(
            frames[1],
            format!("\r{}{}one\r\ntwo\r\nthree", ansi::cursor_up(2), ansi::CLEAR_TO_END)
        );
    }

    #[test]
    fn test_validate_captures_errors_and_panics() {
        let rejecting: Validator = Arc::new(|_: &Value| anyhow::bail!("too short"));
        assert_eq!(validate(&rejecting, &Value::from("a")), Err("too short".to_string()));

        let panicking: Validator = Arc::new(|_: &Value| panic!("validator blew up"));
        assert_eq!(
            validate(&panicking, &Value::from("a")),
            Err("validator blew up".to_string())
        );

        let accepting: Validator = Arc::new(|_: &Value| Ok(()));
        assert_eq!(validate(&accepting, &Value::from("a")), Ok(()));
    }

    #[test]
    fn test_validator_panics_skip_the_panic_hook_only_while_validating() {
        let panicking: Validator = Arc::new(|_: &Value| panic!("quiet"));
        assert!(validate(&panicking, &Value::from("a")).is_err());

        assert!(QUIET_HOOK.is_completed());
        assert!(!IN_VALIDATOR.with(Cell::get));
    }

    #[test]
    fn test_compose_truncates_to_width() {
        let mut prompt = TextPrompt::new(text("A rather long question to ask"));
        prompt.initialize_state();
        let lines = compose(&prompt, &Theme::plain(), Some(10));
        assert!(lines
            .iter()
            .all(|line| console::measure_text_width(line) <= 10));
        assert!(lines[0].ends_with('…'));
    }

    #[test]
    fn test_compose_appends_error_and_help() {
        let mut prompt = ConfirmPrompt::new(confirm("Continue?"));
        prompt.initialize_state();
        prompt.state_mut().error = Some("nope".to_string());
        prompt.state_mut().show_help = true;

        let lines = compose(&prompt, &Theme::plain(), None);
        assert_eq!(lines[1], "  nope");
        assert!(lines.iter().any(|line| line.contains("toggle help")));
    }

    #[tokio::test]
    async fn test_confirm_initial_true_enter_submits_true() {
        let Headless { session, terminal, .. } = testing::headless();
        let mut prompt = ConfirmPrompt::new(confirm("Proceed?").initial(true));

        let (result, _) = tokio::join!(
            super::prompt(&session, &mut prompt),
            testing::send(&session, 1, vec![key(Key::Enter)])
        );

        let result = result.unwrap();
        assert_eq!(result.value, Value::Bool(true));
        assert!(!result.cancelled);
        assert!(!session.is_started());
        assert!(terminal.output().contains("✔ Proceed? · yes"));
    }

    #[tokio::test]
    async fn test_escape_cancels_with_partial_value() {
        let Headless { session, .. } = testing::headless();
        let mut prompt = TextPrompt::new(text("Name").name("name"));

        let mut events = testing::chars("ab");
        events.push(key(Key::Escape));
        let (result, _) = tokio::join!(
            super::prompt(&session, &mut prompt),
            testing::send(&session, 1, events)
        );

        let result = result.unwrap();
        assert!(result.cancelled);
        assert_eq!(result.name.as_deref(), Some("name"));
        assert_eq!(result.value, Value::from("ab"));
    }

    #[tokio::test]
    async fn test_required_and_validator_block_submit() {
        let Headless { session, terminal, .. } = testing::headless();
        let mut prompt = TextPrompt::new(
            text("Name")
                .required(true)
                .validate(|value| match value.as_str() {
                    Some(s) if s.len() < 2 => anyhow::bail!("Too short"),
                    _ => Ok(()),
                }),
        );

        let mut events = vec![key(Key::Enter)];
        events.extend(testing::chars("a"));
        events.push(key(Key::Enter));
        events.extend(testing::chars("b"));
        events.push(key(Key::Enter));
        let (result, _) = tokio::join!(
            super::prompt(&session, &mut prompt),
            testing::send_each(&session, 1, events)
        );

        assert_eq!(result.unwrap().value, Value::from("ab"));
        let output = terminal.output();
        assert!(output.contains("This field is required"));
        assert!(output.contains("Too short"));
    }

    #[tokio::test]
    async fn test_help_toggles_with_f1() {
        let Headless { session, terminal, .. } = testing::headless();
        let mut prompt = ConfirmPrompt::new(confirm("Proceed?"));

        let (result, _) = tokio::join!(
            super::prompt(&session, &mut prompt),
            testing::send_each(&session, 1, vec![key(Key::F(1)), key(Key::Enter)])
        );

        assert_eq!(result.unwrap().value, Value::Bool(false));
        assert!(terminal.output().contains("toggle help"));
    }

    #[tokio::test]
    async fn test_closed_input_fails_the_prompt() {
        let Headless { session, .. } = testing::headless();
        let mut prompt = ConfirmPrompt::new(confirm("Proceed?"));

        let (result, _) = tokio::join!(super::prompt(&session, &mut prompt), async {
            testing::wait_for_prompt(&session, 1).await;
            session.hub().close();
        });

        assert!(matches!(result, Err(PromptError::InputClosed)));
    }
}
