//! Error types for practice-core.

use thiserror::Error;

/// Result type alias using EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the pure engine pieces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed scheduler input. Fatal to the call, not to the session.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A command arrived in a state that does not accept it.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("no action to undo")]
    EmptyUndo,
}

impl EngineError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn invalid_transition(message: impl Into<String>) -> Self {
        Self::InvalidTransition(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_argument() {
        let error = EngineError::invalid_argument("quality 7 is outside 0..=5");
        assert_eq!(error.to_string(), "invalid argument: quality 7 is outside 0..=5");
    }

    #[test]
    fn test_error_display_empty_undo() {
        assert_eq!(EngineError::EmptyUndo.to_string(), "no action to undo");
    }
}
