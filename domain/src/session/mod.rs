//! Conversation session domain.
//!
//! - [`entities::Session`]: a persisted conversation (or unsaved draft)
//! - [`entities::SessionId`]: server-assigned identity
//! - [`message::Message`]: a single message within a timeline
//! - [`reveal::RevealSequence`]: incremental disclosure of assistant text

pub mod entities;
pub mod message;
pub mod reveal;
