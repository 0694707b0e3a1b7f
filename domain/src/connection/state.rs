//! Lifecycle of the persistent chat connection.
//!
//! ```text
//!            ┌──────────── retry ────────────┐
//!            ▼                               │
//!       CONNECTING ──► OPEN ──► CLOSING ──► CLOSED
//!            │           │                   ▲
//!            │           └──── dropped ──────┤
//!            └──────── handshake failed ─────┘
//! ```
//!
//! Every other transition is illegal and rejected by [`ConnectionState::transition`].

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the persistent connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Open)
                | (Connecting, Closed)
                | (Open, Closing)
                | (Open, Closed)
                | (Closing, Closed)
                | (Closed, Connecting)
        )
    }

    /// Validate and return the next state.
    pub fn transition(self, next: ConnectionState) -> Result<ConnectionState, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Only an open connection accepts outgoing frames.
    pub fn accepts_sends(self) -> bool {
        self == ConnectionState::Open
    }

    /// Human-readable status label.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Open => "Online",
            ConnectionState::Closing => "Closing...",
            ConnectionState::Closed => "Offline",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Open => "OPEN",
            ConnectionState::Closing => "CLOSING",
            ConnectionState::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}
