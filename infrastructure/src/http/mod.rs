//! REST adapters sharing one cookie-authenticated client.

pub mod auth_client;
pub mod client;
pub mod error;
pub mod history_client;

pub use auth_client::HttpAuthClient;
pub use client::ApiClient;
pub use error::ApiError;
pub use history_client::HttpHistoryClient;
