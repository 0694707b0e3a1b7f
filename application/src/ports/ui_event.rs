//! UI event types emitted by the engine for presentation layer rendering
//!
//! These events form the output port from the application layer to the
//! presentation layer. Views subscribe to the channel and render whatever they
//! care about; nothing in the engine depends on how (or whether) they do.

use parley_domain::{ConnectionState, Message, MessageId, Origin, RevealState, Session, SessionId};

/// Events emitted by the engine for the presentation layer to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    // === Lifecycle ===
    /// Engine started for this user
    Welcome { username: Option<String> },
    /// Engine stopped; no further events follow
    Stopped,

    // === Connection ===
    /// Persistent connection changed state
    ConnectionChanged(ConnectionState),

    // === Directory ===
    /// Directory contents replaced or edited locally
    DirectoryUpdated(Vec<Session>),

    // === Active conversation ===
    /// The authoritative identity changed (`None` = draft)
    ActiveSessionChanged(Option<SessionId>),
    /// The whole timeline was replaced (reset, or history loaded)
    TimelineReplaced {
        session_id: Option<SessionId>,
        messages: Vec<MessageView>,
    },
    /// History for a session could not be loaded
    HistoryUnavailable { session_id: SessionId, reason: String },
    /// A message was appended to the timeline
    MessageAppended(MessageView),
    /// More of an assistant message became visible
    RevealProgress {
        id: MessageId,
        chunk: String,
        state: RevealState,
    },

    // === Errors & Control ===
    /// Server-reported error frame; blocking notice for the user
    ServerError { message: String },
    /// A send was refused because the connection is not open
    SendRejected {
        content: String,
        state: ConnectionState,
    },
    /// The transport failed after the message was echoed locally
    SendFailed { content: String, reason: String },
    /// A user command could not be applied
    CommandError { message: String },
}

/// Render-ready snapshot of a timeline message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub origin: Origin,
    /// Disclosed prefix only; empty for a pending assistant message.
    pub visible: String,
    pub reveal_state: RevealState,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id(),
            origin: message.origin(),
            visible: message.visible().to_string(),
            reveal_state: message.reveal_state(),
        }
    }
}
