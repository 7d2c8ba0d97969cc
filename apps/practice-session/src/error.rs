//! Error handling for practice sessions

use practice_core::EngineError;
use thiserror::Error;

/// Failures reported by a [`crate::collaborators::WordPersistence`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("word not found: {0}")]
    NotFound(String),

    #[error("timed out after {0} ms")]
    Timeout(u64),
}

impl PersistenceError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Session error types
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("session closed")]
    Closed,

    #[error("session cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SessionError {
    /// Message suitable for the `error_message` field of the session state.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Engine(EngineError::EmptyUndo) => "No action to undo".to_string(),
            SessionError::Engine(EngineError::InvalidArgument(message)) => {
                format!("Could not grade this word: {}", message)
            }
            SessionError::Engine(EngineError::InvalidTransition(message)) => {
                format!("Not available right now: {}", message)
            }
            SessionError::Persistence(error) => format!("Could not save progress: {}", error),
            other => other.to_string(),
        }
    }
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
