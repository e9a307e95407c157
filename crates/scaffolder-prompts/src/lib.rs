//! Scaffolder Prompts - Interactive terminal prompts for scaffolding CLIs
//!
//! This library asks the questions a scaffolding CLI needs answered (project
//! name, template, languages, ...) with select, multiselect, text, password and
//! confirm prompts, rendered directly on a raw-mode terminal.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Input** - Byte stream decoder (keys, SGR mouse) and the event hub
//! - **Layer 2: Session** - Raw mode / alternate screen lifecycle, active-prompt routing,
//!   shutdown cleanup
//! - **Layer 3: Prompts** - The `Prompt` framework, its renderer and the prompt variants
//! - **Layer 4: Orchestration** - `Orchestrator::ask` / `Orchestrator::flow` and YAML
//!   question manifests
//!
//! # Feature Flags
//!
//! - `process` (default): `ProcessShutdown`, which hooks SIGINT/SIGTERM and exits the process
//!
//! # Example Usage
//!
//! ```ignore
//! use scaffolder_prompts::prompt::{confirm, select, PromptBuilder};
//! use scaffolder_prompts::{Orchestrator, ProcessShutdown, Session, SessionConfig, Theme};
//!
//! let session = Session::stdio(
//!     SessionConfig::default(),
//!     ProcessShutdown::install(),
//!     Theme::default(),
//! )?;
//! let orchestrator = Orchestrator::new(session);
//!
//! let answers = orchestrator
//!     .flow(vec![
//!         select("Template").name("template").options(["basic", "api"]).into(),
//!         confirm("Initialize git?").name("git").initial(true).into(),
//!     ])
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod flow;
pub mod input;
pub mod prompt;
pub mod questions;
pub mod session;
pub mod theme;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use config::SessionConfig;
pub use error::{PromptError, Result};
pub use flow::{build_prompt, Orchestrator};
pub use prompt::{Answers, Prompt, PromptConfig, PromptResult, Value};
pub use questions::QuestionManifest;
pub use session::shutdown::{ManualShutdown, ShutdownRegistrar, EXIT_INTERRUPTED};
#[cfg(feature = "process")]
pub use session::shutdown::ProcessShutdown;
pub use session::terminal::{MemoryTerminal, StdoutTerminal, Terminal};
pub use session::Session;
pub use theme::{Role, Theme, ThemeOverrides};
