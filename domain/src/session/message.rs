//! Messages within a conversation timeline.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

/// How much of a message has been disclosed.
///
/// Ordered: `Pending < InProgress < Complete`. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealState {
    Pending,
    InProgress,
    Complete,
}

impl fmt::Display for RevealState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RevealState::Pending => "pending",
            RevealState::InProgress => "in-progress",
            RevealState::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Local identifier of a message in a timeline.
///
/// Assigned by the timeline from a counter that never resets, so an id is
/// never reused after the timeline is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    content: String,
    origin: Origin,
    reveal_state: RevealState,
    /// Byte length of the disclosed prefix (always on a char boundary).
    revealed: usize,
}

impl Message {
    /// A user-authored message; never animated.
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self::complete(id, content, Origin::User)
    }

    /// A freshly arrived assistant message awaiting reveal.
    pub fn assistant_pending(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            origin: Origin::Assistant,
            reveal_state: RevealState::Pending,
            revealed: 0,
        }
    }

    /// A fully disclosed message (history, or user input).
    pub fn complete(id: MessageId, content: impl Into<String>, origin: Origin) -> Self {
        let content = content.into();
        let revealed = content.len();
        Self {
            id,
            content,
            origin,
            reveal_state: RevealState::Complete,
            revealed,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn reveal_state(&self) -> RevealState {
        self.reveal_state
    }

    /// The currently disclosed prefix of the content.
    pub fn visible(&self) -> &str {
        &self.content[..self.revealed]
    }

    /// Disclose the content up to byte offset `end` and move to `InProgress`
    /// (or `Complete` once everything is visible).
    ///
    /// Offsets past the end are clamped; offsets that would shrink the visible
    /// prefix or split a character are ignored.
    pub fn reveal_to(&mut self, end: usize) -> Result<RevealState, DomainError> {
        let end = end.min(self.content.len());
        if end > self.revealed && self.content.is_char_boundary(end) {
            self.revealed = end;
        }
        let next = if self.revealed == self.content.len() {
            RevealState::Complete
        } else {
            RevealState::InProgress
        };
        self.advance(next)?;
        Ok(self.reveal_state)
    }

    /// Disclose everything at once.
    pub fn finish_reveal(&mut self) {
        self.revealed = self.content.len();
        self.reveal_state = RevealState::Complete;
    }

    fn advance(&mut self, next: RevealState) -> Result<(), DomainError> {
        if next < self.reveal_state {
            return Err(DomainError::RevealRegression {
                from: self.reveal_state,
                to: next,
            });
        }
        self.reveal_state = next;
        Ok(())
    }
}

/// A message as returned by the history API: `{content, is_user}` plus
/// optional server metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub content: String,
    pub is_user: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl StoredMessage {
    pub fn origin(&self) -> Origin {
        if self.is_user {
            Origin::User
        } else {
            Origin::Assistant
        }
    }
}
