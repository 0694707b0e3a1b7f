//! Domain error types

use crate::connection::state::ConnectionState;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Illegal connection transition: {from} -> {to}")]
    IllegalTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("Reveal state cannot regress from {from} to {to}")]
    RevealRegression {
        from: crate::session::message::RevealState,
        to: crate::session::message::RevealState,
    },
}

impl DomainError {
    /// Check if this error came from the connection state machine
    pub fn is_transition_error(&self) -> bool {
        matches!(self, DomainError::IllegalTransition { .. })
    }
}
