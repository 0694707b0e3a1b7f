//! Connection domain.
//!
//! - [`state::ConnectionState`]: lifecycle of the persistent chat connection

pub mod state;
