//! Error types for the WebSocket adapter

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that can occur while establishing the chat connection
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Invalid connection URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Server unreachable: {0}")]
    Unreachable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(tungstenite::Error),
}

impl ConnectionError {
    /// Classify a tungstenite error, separating plain connection failures
    /// (server down, connection reset) from protocol-level errors.
    pub fn from_tungstenite(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::Io(io_err)
                if matches!(
                    io_err.kind(),
                    std::io::ErrorKind::ConnectionRefused
                        | std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::ConnectionAborted
                ) =>
            {
                ConnectionError::Unreachable(io_err.to_string())
            }
            other => ConnectionError::WebSocket(other),
        }
    }
}
