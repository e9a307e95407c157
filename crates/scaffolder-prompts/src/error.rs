//! Error types for the prompt subsystem

use thiserror::Error;

/// Errors surfaced to the embedder.
///
/// Validation failures and decode anomalies never show up here: they are
/// recovered inside the prompt and rendered inline.
#[derive(Debug, Error)]
pub enum PromptError {
    /// A question manifest named a prompt kind this crate doesn't know
    #[error(
        "unsupported prompt type '{0}' (expected select, multiselect, text, password or confirm)"
    )]
    UnsupportedKind(String),

    /// A prompt config that can't be turned into a working prompt
    #[error("invalid prompt config for '{message}': {reason}")]
    InvalidConfig { message: String, reason: String },

    /// The user cancelled and the shutdown registrar returned control
    #[error("prompt cancelled")]
    Cancelled,

    /// The input source closed while a prompt was waiting
    #[error("input closed before the prompt was answered")]
    InputClosed,

    #[error("failed to parse question manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PromptError {
    pub(crate) fn invalid(message: &str, reason: impl Into<String>) -> Self {
        PromptError::InvalidConfig {
            message: message.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PromptError>;
