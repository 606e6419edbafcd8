//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use pprovider::{AbortReason, ProviderError};
use ptooling::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    Provider,
    /// The model rejected the request as oversized; never retried.
    InputTooLarge,
    RetriesExhausted,
    Tooling,
    Transport,
    Store,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Provider, message)
    }

    pub fn input_too_large(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InputTooLarge, message)
    }

    pub fn retries_exhausted(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::RetriesExhausted, message)
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Tooling, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Transport, message)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Store, message)
    }

    /// Terminal error for an abandoned turn, carrying the provider failure text.
    pub fn aborted(reason: AbortReason, error: &ProviderError) -> Self {
        match reason {
            AbortReason::InputTooLarge => Self::input_too_large(error.to_string()),
            AbortReason::AttemptsExhausted { attempts } => Self::retries_exhausted(format!(
                "gave up after {attempts} attempts: {error}"
            )),
        }
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        ChatError::provider(value.to_string())
    }
}

impl From<ToolError> for ChatError {
    fn from(value: ToolError) -> Self {
        ChatError::tooling(value.to_string())
    }
}
