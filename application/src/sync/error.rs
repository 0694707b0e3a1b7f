//! Error types for the sync engine

use parley_domain::{ConnectionState, SessionId};
use thiserror::Error;

/// Errors from directory operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("Delete confirmation is for session {confirmed}, not {requested}")]
    ConfirmationMismatch {
        requested: SessionId,
        confirmed: SessionId,
    },

    #[error("Title must not be empty")]
    EmptyTitle,
}

/// Errors surfaced by the engine and its handle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Cannot send while connection is {0}")]
    SendRejected(ConnectionState),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Engine stopped")]
    EngineStopped,

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl EngineError {
    /// Check if the error means the engine loop is gone
    pub fn is_stopped(&self) -> bool {
        matches!(self, EngineError::EngineStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_rejected_display() {
        let error = EngineError::SendRejected(ConnectionState::Closed);
        assert_eq!(error.to_string(), "Cannot send while connection is CLOSED");
    }

    #[test]
    fn test_directory_error_is_transparent() {
        let id = SessionId::new("s1").unwrap();
        let error: EngineError = DirectoryError::UnknownSession(id).into();
        assert_eq!(error.to_string(), "Unknown session: s1");
        assert!(!error.is_stopped());
        assert!(EngineError::EngineStopped.is_stopped());
    }
}
