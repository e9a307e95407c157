//! Process-wide shutdown registrar
//!
//! Cleanup handlers registered here run before the process exits, whether the
//! exit comes from a cancelled prompt or from an external signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Conventional exit code for an interrupted process (128 + SIGINT)
pub const EXIT_INTERRUPTED: i32 = 130;

pub type ShutdownHandler = Box<dyn Fn() + Send + Sync>;

pub trait ShutdownRegistrar: Send + Sync {
    fn add_shutdown_handler(&self, handler: ShutdownHandler);

    /// Run the registered handlers, then end the process with `exit_code`.
    /// Implementations used in tests may return instead of exiting.
    fn trigger_shutdown(&self, reason: &str, exit_code: i32);
}

#[derive(Default)]
struct HandlerList {
    handlers: Mutex<Vec<ShutdownHandler>>,
    ran: AtomicBool,
}

impl HandlerList {
    fn add(&self, handler: ShutdownHandler) {
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(handler);
    }

    /// Runs every handler once per process
    fn run_once(&self) {
        if self.ran.swap(true, Ordering::SeqCst) {
            return;
        }
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for handler in handlers.iter() {
            handler();
        }
    }

    fn len(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Registrar for the real process: installs a Ctrl+C / SIGTERM handler and
/// exits with the requested code.
#[cfg(feature = "process")]
pub struct ProcessShutdown {
    handlers: HandlerList,
}

#[cfg(feature = "process")]
impl ProcessShutdown {
    /// Create the registrar and hook it up to SIGINT/SIGTERM
    pub fn install() -> Arc<Self> {
        let shutdown = Arc::new(Self {
            handlers: HandlerList::default(),
        });

        let signalled = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || {
            signalled.trigger_shutdown("received termination signal", EXIT_INTERRUPTED);
        }) {
            tracing::warn!("could not install signal handler: {}", e);
        }

        shutdown
    }
}

#[cfg(feature = "process")]
impl ShutdownRegistrar for ProcessShutdown {
    fn add_shutdown_handler(&self, handler: ShutdownHandler) {
        self.handlers.add(handler);
    }

    fn trigger_shutdown(&self, reason: &str, exit_code: i32) {
        tracing::info!(exit_code, "shutting down: {}", reason);
        self.handlers.run_once();
        std::process::exit(exit_code);
    }
}

/// Registrar that records shutdown requests instead of exiting.
///
/// Handlers still run on the first trigger, so terminal restoration can be
/// asserted in headless runs.
#[derive(Default)]
pub struct ManualShutdown {
    handlers: HandlerList,
    triggers: Mutex<Vec<(String, i32)>>,
}

impl ManualShutdown {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every `(reason, exit_code)` passed to `trigger_shutdown`
    pub fn triggers(&self) -> Vec<(String, i32)> {
        self.triggers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl ShutdownRegistrar for ManualShutdown {
    fn add_shutdown_handler(&self, handler: ShutdownHandler) {
        self.handlers.add(handler);
    }

    fn trigger_shutdown(&self, reason: &str, exit_code: i32) {
        self.triggers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((reason.to_string(), exit_code));
        self.handlers.run_once();
    }
}
