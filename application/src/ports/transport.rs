//! Chat transport port
//!
//! Defines the interface to the persistent, bidirectional connection that
//! carries user messages out and assistant echoes back.

use parley_domain::{ConnectionState, IncomingFrame, OutgoingFrame};
use thiserror::Error;

/// Errors that can occur when handing a frame to the transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection is not open (state: {0})")]
    NotOpen(ConnectionState),

    #[error("Transport closed")]
    Closed,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Something the transport observed, delivered to the engine in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection moved to a new state.
    StateChanged(ConnectionState),
    /// A well-formed frame arrived. Malformed frames never reach the engine.
    Frame(IncomingFrame),
}

/// Persistent chat connection
///
/// Implementations own reconnection: after any close they keep retrying until
/// [`close`](Self::close) is called.
pub trait ChatTransport: Send + Sync {
    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Queue a frame for transmission.
    ///
    /// Fails with [`TransportError::NotOpen`] unless the state is `Open`; the
    /// frame is not buffered for later.
    fn send(&self, frame: &OutgoingFrame) -> Result<(), TransportError>;

    /// Mark the connection for close and stop reconnecting.
    fn close(&self);
}
