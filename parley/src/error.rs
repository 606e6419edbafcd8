//! Facade-level errors for inbound event handling and process configuration.

use std::error::Error;
use std::fmt::{Display, Formatter};

use pchat::ChatError;
use psession::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerErrorKind {
    InvalidEvent,
    Chat,
    Session,
    Files,
    Config,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    pub kind: HandlerErrorKind,
    pub message: String,
}

impl HandlerError {
    pub fn new(kind: HandlerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::InvalidEvent, message)
    }

    pub fn chat(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::Chat, message)
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::Session, message)
    }

    pub fn files(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::Files, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::Config, message)
    }
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for HandlerError {}

impl From<ChatError> for HandlerError {
    fn from(error: ChatError) -> Self {
        Self::chat(error.to_string())
    }
}

impl From<SessionError> for HandlerError {
    fn from(error: SessionError) -> Self {
        Self::session(error.to_string())
    }
}
