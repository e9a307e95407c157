//! Terminal session lifecycle and event routing
//!
//! A [`Session`] is created once per CLI invocation. While started it owns the
//! terminal: raw mode, mouse reporting, the alternate screen and the cursor.
//! Decoded input is routed to the single active prompt, if any.

pub mod shutdown;
pub mod terminal;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::input::{self, InputEvent, InputHub, Subscription};
use crate::theme::Theme;
use shutdown::ShutdownRegistrar;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use terminal::{ansi, StdoutTerminal, Terminal};
use tokio::sync::mpsc;

/// Where the session delivers events for the active prompt
pub type EventSink = mpsc::UnboundedSender<InputEvent>;

type ActiveSlot = Arc<Mutex<Option<EventSink>>>;

#[derive(Default)]
struct Lifecycle {
    started: bool,
    mouse: bool,
    alternate_screen: bool,
    subscriptions: Vec<Subscription>,
}

struct Inner {
    terminal: Arc<dyn Terminal>,
    hub: InputHub,
    config: SessionConfig,
    theme: Theme,
    shutdown: Arc<dyn ShutdownRegistrar>,
    lifecycle: Mutex<Lifecycle>,
    active: ActiveSlot,
    generation: AtomicU64,
    cleanup_registered: AtomicBool,
}

/// Explicitly constructed terminal session. Clones share the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn new(
        terminal: Arc<dyn Terminal>,
        hub: InputHub,
        config: SessionConfig,
        shutdown: Arc<dyn ShutdownRegistrar>,
    ) -> Self {
        Self::with_theme(terminal, hub, config, shutdown, Theme::default())
    }

    pub fn with_theme(
        terminal: Arc<dyn Terminal>,
        hub: InputHub,
        config: SessionConfig,
        shutdown: Arc<dyn ShutdownRegistrar>,
        theme: Theme,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                terminal,
                hub,
                config,
                theme,
                shutdown,
                lifecycle: Mutex::new(Lifecycle::default()),
                active: Arc::new(Mutex::new(None)),
                generation: AtomicU64::new(0),
                cleanup_registered: AtomicBool::new(false),
            }),
        }
    }

    /// Session on the process's stdin/stdout. Spawns the stdin reader thread
    /// and the decode pump, so it must be called inside a tokio runtime.
    pub fn stdio(
        config: SessionConfig,
        shutdown: Arc<dyn ShutdownRegistrar>,
        theme: Theme,
    ) -> Result<Self> {
        let hub = InputHub::new();
        let chunks = input::spawn_stdin_reader()?;
        input::spawn_pump(chunks, hub.clone(), config.escape_timeout);
        Ok(Self::with_theme(
            Arc::new(StdoutTerminal::new()),
            hub,
            config,
            shutdown,
            theme,
        ))
    }

    pub fn terminal(&self) -> &Arc<dyn Terminal> {
        &self.inner.terminal
    }

    pub fn hub(&self) -> &InputHub {
        &self.inner.hub
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn theme(&self) -> &Theme {
        &self.inner.theme
    }

    pub fn shutdown(&self) -> &Arc<dyn ShutdownRegistrar> {
        &self.inner.shutdown
    }

    pub fn is_started(&self) -> bool {
        self.lifecycle().started
    }

    /// Whether frames are drawn from the top-left of the alternate screen
    pub fn is_anchored(&self) -> bool {
        let lifecycle = self.lifecycle();
        lifecycle.started && lifecycle.alternate_screen
    }

    /// Take over the terminal. Does nothing if already started.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle();
        if lifecycle.started {
            return Ok(());
        }
        self.register_cleanup();

        let terminal = &self.inner.terminal;
        let config = &self.inner.config;

        terminal.set_raw_mode(true)?;
        lifecycle.started = true;

        // Clicks only map to prompt lines when frames are anchored at the top
        lifecycle.mouse = config.mouse && config.alternate_screen;
        if lifecycle.mouse {
            terminal.write_sync(ansi::ENABLE_MOUSE)?;
        }

        let active = Arc::clone(&self.inner.active);
        lifecycle
            .subscriptions
            .push(self.inner.hub.subscribe(move |event| dispatch(&active, event)));
        let active = Arc::clone(&self.inner.active);
        lifecycle.subscriptions.push(self.inner.hub.on_close(move || {
            // Dropping the sink wakes the waiting prompt with "input closed"
            lock(&active).take();
        }));

        lifecycle.alternate_screen = config.alternate_screen;
        if lifecycle.alternate_screen {
            terminal.write_sync(ansi::ENTER_ALT_SCREEN)?;
        }
        terminal.write_sync(ansi::HIDE_CURSOR)?;

        tracing::debug!(
            mouse = lifecycle.mouse,
            alternate_screen = lifecycle.alternate_screen,
            "session started"
        );
        Ok(())
    }

    /// Give the terminal back, undoing `start` in reverse order. Does nothing
    /// if not started. Every step is attempted; the first failure is returned.
    pub fn stop(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle();
        if !lifecycle.started {
            return Ok(());
        }
        lifecycle.started = false;

        let terminal = &self.inner.terminal;
        let mut first_error: Option<std::io::Error> = None;
        let mut attempt = |result: std::io::Result<()>| {
            if let Err(e) = result {
                tracing::warn!("failed to restore terminal: {}", e);
                first_error.get_or_insert(e);
            }
        };

        attempt(terminal.write_sync(ansi::SHOW_CURSOR));
        if lifecycle.alternate_screen {
            attempt(terminal.write_sync(ansi::LEAVE_ALT_SCREEN));
        }
        if lifecycle.mouse {
            attempt(terminal.write_sync(ansi::DISABLE_MOUSE));
        }
        attempt(terminal.set_raw_mode(false));

        lifecycle.subscriptions.clear();
        lifecycle.mouse = false;
        lifecycle.alternate_screen = false;
        self.set_current_prompt(None);

        tracing::debug!("session stopped");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Replace the active prompt. With no active prompt, events are dropped.
    pub fn set_current_prompt(&self, sink: Option<EventSink>) {
        let registering = sink.is_some();
        *lock(&self.inner.active) = sink;
        if registering {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn has_active_prompt(&self) -> bool {
        lock(&self.inner.active).is_some()
    }

    /// Number of prompts registered so far
    pub fn active_generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    fn register_cleanup(&self) {
        if self.inner.cleanup_registered.swap(true, Ordering::SeqCst) {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .shutdown
            .add_shutdown_handler(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    if let Err(e) = (Session { inner }).stop() {
                        tracing::warn!("terminal restore during shutdown failed: {}", e);
                    }
                }
            }));
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        lock(&self.inner.lifecycle)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn dispatch(active: &ActiveSlot, event: &InputEvent) {
    match lock(active).as_ref() {
        Some(sink) => {
            if sink.send(event.clone()).is_err() {
                tracing::trace!("active prompt is gone, dropping event");
            }
        }
        None => tracing::trace!(?event, "no active prompt, dropping event"),
    }
}
