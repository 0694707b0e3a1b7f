//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod auth;
pub mod conversation_logger;
pub mod history_api;
pub mod transport;
pub mod ui_event;
