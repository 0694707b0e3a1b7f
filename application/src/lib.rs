//! Application layer for parley
//!
//! This crate contains the port definitions and the synchronization engine.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod sync;

// Re-export commonly used types
pub use config::EngineConfig;
pub use ports::{
    auth::{AuthError, AuthPort, AuthStatus},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    history_api::{HistoryApi, HistoryError},
    transport::{ChatTransport, TransportError, TransportEvent},
    ui_event::{MessageView, UiEvent},
};
pub use sync::{
    ActiveTimeline, DeleteConfirmation, DirectoryError, EngineError, EngineHandle,
    ReconciliationEngine, RevealAnimator, SessionDirectory,
};
