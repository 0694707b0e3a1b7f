//! History API port
//!
//! The pull side of the system: a REST-style store listing conversations and
//! their stored messages.

use async_trait::async_trait;
use parley_domain::{Session, SessionId, StoredMessage};
use thiserror::Error;

/// Errors that can occur when talking to the history API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Not authenticated")]
    Unauthorized,
}

/// Conversation directory and history store
#[async_trait]
pub trait HistoryApi: Send + Sync {
    /// `GET /sessions/`: every persisted conversation, in server order.
    async fn list_sessions(&self) -> Result<Vec<Session>, HistoryError>;

    /// `GET /sessions/{id}/messages/`: full stored history of one conversation.
    async fn fetch_messages(&self, id: &SessionId) -> Result<Vec<StoredMessage>, HistoryError>;

    /// `DELETE /sessions/{id}/`
    async fn delete_session(&self, id: &SessionId) -> Result<(), HistoryError>;

    /// `PATCH /sessions/{id}/rename/` with `{title}`
    async fn rename_session(&self, id: &SessionId, title: &str) -> Result<(), HistoryError>;
}
