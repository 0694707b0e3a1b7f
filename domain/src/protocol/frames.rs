//! JSON frames exchanged over the persistent chat connection.
//!
//! - Client → server: `{ "message": string, "session_id": string | null }`
//! - Server → client: `{ "type": "error", "message": string }` (control) or
//!   `{ "message": string, "session_id": string }` (content, optionally tagged
//!   `"type": "chat_message"`)

use crate::session::entities::SessionId;
use serde::{Deserialize, Serialize};

/// A user message bound for the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingFrame {
    pub message: String,
    /// `None` while the conversation is still a draft.
    pub session_id: Option<SessionId>,
}

impl OutgoingFrame {
    pub fn new(message: impl Into<String>, session_id: Option<SessionId>) -> Self {
        Self {
            message: message.into(),
            session_id,
        }
    }
}

/// A classified server frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingFrame {
    /// Server-reported problem; informational only.
    Control { message: String },
    /// Assistant reply, possibly carrying the conversation's identity.
    Content {
        message: String,
        session_id: Option<SessionId>,
    },
}

impl IncomingFrame {
    pub fn is_control(&self) -> bool {
        matches!(self, IncomingFrame::Control { .. })
    }
}
