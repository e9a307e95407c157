//! Output sink and terminal mode control

use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Control sequences written by the session and renderer
pub mod ansi {
    pub const ENTER_ALT_SCREEN: &str = "\x1b[?1049h";
    pub const LEAVE_ALT_SCREEN: &str = "\x1b[?1049l";
    pub const HIDE_CURSOR: &str = "\x1b[?25l";
    pub const SHOW_CURSOR: &str = "\x1b[?25h";
    /// Button events, drag motion, SGR encoding
    pub const ENABLE_MOUSE: &str = "\x1b[?1000h\x1b[?1002h\x1b[?1006h";
    pub const DISABLE_MOUSE: &str = "\x1b[?1006l\x1b[?1002l\x1b[?1000l";
    /// Cursor home, clear to end of screen
    pub const CLEAR_FROM_HOME: &str = "\x1b[H\x1b[J";
    pub const CLEAR_TO_END: &str = "\x1b[J";

    pub fn cursor_up(lines: usize) -> String {
        format!("\x1b[{}A", lines)
    }
}

/// The terminal as seen by the session: an output sink plus raw-mode control.
///
/// Frame writes are async so a render can be in flight while more input
/// arrives. Lifecycle sequences use the synchronous path, which is also what
/// the signal handler calls.
#[async_trait]
pub trait Terminal: Send + Sync {
    async fn write(&self, data: &str) -> io::Result<()>;

    fn write_sync(&self, data: &str) -> io::Result<()>;

    fn set_raw_mode(&self, enabled: bool) -> io::Result<()>;

    /// Width in columns, if known
    fn width(&self) -> Option<usize> {
        None
    }
}

/// The process's real stdout
pub struct StdoutTerminal {
    term: console::Term,
}

impl StdoutTerminal {
    pub fn new() -> Self {
        Self {
            term: console::Term::stdout(),
        }
    }
}

impl Default for StdoutTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Terminal for StdoutTerminal {
    async fn write(&self, data: &str) -> io::Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(data.as_bytes()).await?;
        stdout.flush().await
    }

    fn write_sync(&self, data: &str) -> io::Result<()> {
        self.term.write_str(data)?;
        self.term.flush()
    }

    fn set_raw_mode(&self, enabled: bool) -> io::Result<()> {
        if enabled {
            crossterm::terminal::enable_raw_mode()
        } else {
            crossterm::terminal::disable_raw_mode()
        }
    }

    fn width(&self) -> Option<usize> {
        if !self.term.is_term() {
            return None;
        }
        let (_rows, cols) = self.term.size();
        Some(cols as usize)
    }
}

/// One recorded interaction with a [`MemoryTerminal`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOp {
    Write(String),
    WriteSync(String),
    RawMode(bool),
}

/// In-memory terminal that records everything written to it.
///
/// Used for headless runs and tests; an optional write delay keeps frame
/// writes in flight long enough to observe render coalescing.
#[derive(Debug, Default)]
pub struct MemoryTerminal {
    ops: Mutex<Vec<TerminalOp>>,
    write_delay: Option<Duration>,
    fail_writes: AtomicBool,
    width: Option<usize>,
}

impl MemoryTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Make subsequent frame writes fail with a broken pipe
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn ops(&self) -> Vec<TerminalOp> {
        self.lock().clone()
    }

    /// Frame writes only
    pub fn frames(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|op| match op {
                TerminalOp::Write(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    /// Everything written, in order
    pub fn output(&self) -> String {
        self.lock()
            .iter()
            .filter_map(|op| match op {
                TerminalOp::Write(data) | TerminalOp::WriteSync(data) => Some(data.as_str()),
                TerminalOp::RawMode(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TerminalOp>> {
        self.ops.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Terminal for MemoryTerminal {
    async fn write(&self, data: &str) -> io::Result<()> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"));
        }
        self.lock().push(TerminalOp::Write(data.to_string()));
        Ok(())
    }

    fn write_sync(&self, data: &str) -> io::Result<()> {
        self.lock().push(TerminalOp::WriteSync(data.to_string()));
        Ok(())
    }

    fn set_raw_mode(&self, enabled: bool) -> io::Result<()> {
        self.lock().push(TerminalOp::RawMode(enabled));
        Ok(())
    }

    fn width(&self) -> Option<usize> {
        self.width
    }
}
