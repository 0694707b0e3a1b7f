//! Inputs consumed by the engine loop.

use crate::ports::history_api::HistoryError;
use crate::sync::directory::{DeleteConfirmation, RefreshTicket};
use parley_domain::{MessageId, Session, SessionId, StoredMessage};

/// A user-issued command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit a chat message in the active conversation.
    Send(String),
    /// Switch to a persisted conversation.
    Select(SessionId),
    /// Start a fresh draft.
    NewDraft,
    /// Rename a conversation.
    Rename { id: SessionId, title: String },
    /// Delete a conversation, given the user's confirmation.
    Delete {
        id: SessionId,
        confirmation: DeleteConfirmation,
    },
    /// Re-fetch the directory.
    Refresh,
    /// Tear the engine down.
    Shutdown,
}

/// Remote directory mutation, for completion reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    Rename,
    Delete,
}

impl RemoteOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteOp::Rename => "rename",
            RemoteOp::Delete => "delete",
        }
    }
}

/// Everything the engine loop reacts to, apart from transport events.
#[derive(Debug)]
pub enum EngineInput {
    Command(Command),
    /// History fetch finished for `target`.
    HistoryLoaded {
        target: SessionId,
        result: Result<Vec<StoredMessage>, HistoryError>,
    },
    /// Directory fetch finished.
    DirectoryRefreshed {
        ticket: RefreshTicket,
        result: Result<Vec<Session>, HistoryError>,
    },
    /// A remote rename/delete finished. Local state was already updated.
    RemoteMutationFinished {
        op: RemoteOp,
        id: SessionId,
        result: Result<(), HistoryError>,
    },
    /// The deferred post-adoption refresh is due.
    TitleRefreshDue,
    /// Reveal step for a message.
    RevealTick(MessageId),
}
