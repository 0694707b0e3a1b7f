//! Persistent chat connection over WebSocket.

pub mod connection;
pub mod error;
pub mod protocol;

pub use connection::{ConnectionManager, ConnectionSettings};
pub use error::ConnectionError;
pub use protocol::{FrameError, classify_frame, parse_frame};
