//! Headless session helpers shared by the unit tests

use crate::config::SessionConfig;
use crate::input::{
    InputEvent, InputHub, Key, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crate::session::shutdown::ManualShutdown;
use crate::session::terminal::MemoryTerminal;
use crate::session::Session;
use crate::theme::Theme;
use std::sync::Arc;

pub struct Headless {
    pub session: Session,
    pub terminal: Arc<MemoryTerminal>,
    pub shutdown: Arc<ManualShutdown>,
}

pub fn headless() -> Headless {
    headless_with(SessionConfig::default())
}

pub fn headless_with(config: SessionConfig) -> Headless {
    let terminal = Arc::new(MemoryTerminal::new());
    let shutdown = ManualShutdown::new();
    let session = Session::with_theme(
        terminal.clone(),
        InputHub::new(),
        config,
        shutdown.clone(),
        Theme::plain(),
    );
    Headless {
        session,
        terminal,
        shutdown,
    }
}

pub fn key(key: Key) -> InputEvent {
    InputEvent::Key(key.into())
}

pub fn ctrl(c: char) -> InputEvent {
    InputEvent::Key(KeyEvent::new(Key::Char(c), Modifiers::CTRL))
}

pub fn chars(s: &str) -> Vec<InputEvent> {
    s.chars().map(|c| key(Key::Char(c))).collect()
}

/// Left click at 1-based terminal row `y`
pub fn click(y: u32) -> InputEvent {
    InputEvent::Mouse(MouseEvent::new(MouseEventKind::Press, MouseButton::Left, 3, y))
}

/// Yield until the `generation`-th prompt is registered
pub async fn wait_for_prompt(session: &Session, generation: u64) {
    while session.active_generation() < generation || !session.has_active_prompt() {
        tokio::task::yield_now().await;
    }
}

/// Deliver `events` in one burst once the prompt is listening
pub async fn send(session: &Session, generation: u64, events: Vec<InputEvent>) {
    wait_for_prompt(session, generation).await;
    for event in &events {
        session.hub().publish(event);
    }
}

/// Deliver `events` one at a time, letting the prompt redraw after each
pub async fn send_each(session: &Session, generation: u64, events: Vec<InputEvent>) {
    wait_for_prompt(session, generation).await;
    for event in &events {
        session.hub().publish(event);
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }
}
