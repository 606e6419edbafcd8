//! Shared provider error kinds and error value helpers.
//!
//! ```rust
//! use pprovider::ProviderError;
//!
//! let oversized = ProviderError::input_too_large("prompt is too long");
//! assert!(oversized.is_input_too_large());
//!
//! let timeout = ProviderError::timeout("temporary timeout");
//! assert!(!timeout.is_input_too_large());
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Authentication,
    RateLimited,
    InvalidRequest,
    InputTooLarge,
    Timeout,
    Transport,
    Unavailable,
    Stream,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message)
    }

    pub fn input_too_large(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InputTooLarge, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message)
    }

    pub fn stream(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Stream, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message)
    }

    /// True when the service rejected the payload for exceeding model limits.
    ///
    /// Some services only report this through a validation message, so the
    /// rendered text is inspected as well as the kind.
    pub fn is_input_too_large(&self) -> bool {
        if self.kind == ProviderErrorKind::InputTooLarge {
            return true;
        }

        let rendered = self.to_string().to_lowercase();
        rendered.contains("validationexception") && rendered.contains("input is too long")
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_too_large_detected_from_kind() {
        let error = ProviderError::input_too_large("payload exceeds limit");
        assert!(error.is_input_too_large());
    }

    #[test]
    fn input_too_large_detected_from_validation_message() {
        let error = ProviderError::invalid_request(
            "An error occurred (ValidationException) when calling the ConverseStream operation: Input is too long for requested model.",
        );
        assert!(error.is_input_too_large());
    }

    #[test]
    fn other_validation_messages_are_not_oversized() {
        let error = ProviderError::invalid_request("ValidationException: malformed tool schema");
        assert!(!error.is_input_too_large());

        let error = ProviderError::transport("input is too long to log");
        assert!(!error.is_input_too_large());
    }

    #[test]
    fn display_includes_kind_and_message() {
        let error = ProviderError::rate_limited("slow down");
        assert_eq!(error.to_string(), "RateLimited: slow down");
    }
}
