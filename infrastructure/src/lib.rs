//! Infrastructure layer for parley
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the WebSocket chat connection, the REST history and
//! auth clients, configuration file loading, and the conversation transcript.

pub mod config;
pub mod http;
pub mod logging;
pub mod transport;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigLoader, FileConfig, Severity};
pub use http::{ApiClient, ApiError, HttpAuthClient, HttpHistoryClient};
pub use logging::JsonlConversationLogger;
pub use transport::{ConnectionError, ConnectionManager, ConnectionSettings};

/// Cookie store shared by the HTTP clients and the chat connection.
pub use reqwest::cookie::Jar as CookieJar;
