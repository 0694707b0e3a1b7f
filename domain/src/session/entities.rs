//! Session domain entities

use crate::core::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Title given to a conversation until the server generates one.
pub const DRAFT_TITLE: &str = "New Chat";

/// Opaque, server-assigned identifier of a persisted conversation.
///
/// The server emits numeric ids in some payloads and strings in others, so
/// deserialization accepts either form. It always serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidSessionId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionId::new(s.trim())
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        let raw = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        SessionId::new(raw).map_err(serde::de::Error::custom)
    }
}

/// A conversation as listed in the directory (Entity)
///
/// `id == None` denotes an unsaved draft; everything the server lists has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Option<SessionId>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_time: Option<String>,
}

impl Session {
    pub fn new(id: SessionId, title: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            title: title.into(),
            created_at: None,
            formatted_time: None,
        }
    }

    pub fn draft() -> Self {
        Self {
            id: None,
            title: DRAFT_TITLE.to_string(),
            created_at: None,
            formatted_time: None,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    /// Title to show, falling back to `Conversation {id}` when the server
    /// has not produced one.
    pub fn display_title(&self) -> String {
        if !self.title.trim().is_empty() {
            return self.title.clone();
        }
        match &self.id {
            Some(id) => format!("Conversation {}", id),
            None => DRAFT_TITLE.to_string(),
        }
    }
}
