//! Domain layer for parley
//!
//! This crate contains the entities, value objects and pure state rules of the
//! chat client. It has no dependencies on infrastructure or presentation
//! concerns.
//!
//! # Core Concepts
//!
//! - **Session**: a persisted conversation, or a *draft* that has not been
//!   assigned an identity by the server yet
//! - **Message**: one entry of a timeline, with a monotonic [`RevealState`]
//! - **ConnectionState**: lifecycle of the persistent connection
//! - **Frames**: JSON payloads exchanged over that connection

pub mod connection;
pub mod core;
pub mod protocol;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use connection::state::ConnectionState;
pub use core::error::DomainError;
pub use protocol::frames::{IncomingFrame, OutgoingFrame};
pub use session::{
    entities::{DRAFT_TITLE, Session, SessionId},
    message::{Message, MessageId, Origin, RevealState, StoredMessage},
    reveal::RevealSequence,
};
