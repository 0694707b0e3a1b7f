//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording what happened to a
//! conversation to a machine-readable transcript (JSONL). Diagnostics stay on
//! `tracing`; this port only sees [`ConversationEvent`]s.

use parley_domain::SessionId;
use serde_json::{Map, Value, json};

/// Something that happened to a conversation, as recorded in the transcript.
///
/// Adapters add the timestamp when writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    /// A message left the client. `session_id` is `None` for a draft.
    MessageSent {
        session_id: Option<SessionId>,
        content: String,
    },
    /// An echo was appended to the active timeline.
    MessageReceived {
        session_id: Option<SessionId>,
        content: String,
    },
    /// A draft took the identity the server assigned it.
    IdentityAdopted { session_id: SessionId },
    /// An echo named a session other than the active one.
    IdentityDiscarded {
        session_id: SessionId,
        active: SessionId,
    },
    SessionSelected { session_id: SessionId },
    SessionRenamed { session_id: SessionId, title: String },
    SessionDeleted { session_id: SessionId, title: String },
    /// A control frame from the server.
    ServerError { message: String },
}

impl ConversationEvent {
    /// Transcript `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ConversationEvent::MessageSent { .. } => "message_sent",
            ConversationEvent::MessageReceived { .. } => "message_received",
            ConversationEvent::IdentityAdopted { .. } => "identity_adopted",
            ConversationEvent::IdentityDiscarded { .. } => "identity_discarded",
            ConversationEvent::SessionSelected { .. } => "session_selected",
            ConversationEvent::SessionRenamed { .. } => "session_renamed",
            ConversationEvent::SessionDeleted { .. } => "session_deleted",
            ConversationEvent::ServerError { .. } => "server_error",
        }
    }

    /// Session the event concerns, if any.
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            ConversationEvent::MessageSent { session_id, .. }
            | ConversationEvent::MessageReceived { session_id, .. } => session_id.as_ref(),
            ConversationEvent::IdentityAdopted { session_id }
            | ConversationEvent::IdentityDiscarded { session_id, .. }
            | ConversationEvent::SessionSelected { session_id }
            | ConversationEvent::SessionRenamed { session_id, .. }
            | ConversationEvent::SessionDeleted { session_id, .. } => Some(session_id),
            ConversationEvent::ServerError { .. } => None,
        }
    }

    /// Event-specific fields. Drafts carry `"session_id": null` so every
    /// message line has the same shape.
    pub fn payload(&self) -> Map<String, Value> {
        let fields = match self {
            ConversationEvent::MessageSent { content, .. }
            | ConversationEvent::MessageReceived { content, .. } => json!({ "content": content }),
            ConversationEvent::IdentityDiscarded { active, .. } => {
                json!({ "active": active.as_str() })
            }
            ConversationEvent::SessionRenamed { title, .. }
            | ConversationEvent::SessionDeleted { title, .. } => json!({ "title": title }),
            ConversationEvent::ServerError { message } => json!({ "message": message }),
            ConversationEvent::IdentityAdopted { .. }
            | ConversationEvent::SessionSelected { .. } => json!({}),
        };
        let mut map = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if !matches!(self, ConversationEvent::ServerError { .. }) {
            let id = self.session_id().map(|id| Value::from(id.as_str()));
            map.insert("session_id".to_string(), id.unwrap_or(Value::Null));
        }
        map
    }
}

/// Port for logging conversation events to a structured log.
///
/// The `log` method is synchronous and non-fallible so it never disrupts the
/// engine loop; logging failures are dropped by the adapter.
pub trait ConversationLogger: Send + Sync {
    /// Record a conversation event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
