//! Error types for the HTTP adapters

use parley_application::ports::auth::AuthError;
use parley_application::ports::history_api::HistoryError;
use thiserror::Error;

/// Errors from the REST API, before they are mapped onto a port error
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401 and 403 both mean the session cookie is missing or expired.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

impl From<ApiError> for HistoryError {
    fn from(err: ApiError) -> Self {
        if err.is_unauthorized() {
            return HistoryError::Unauthorized;
        }
        match err {
            ApiError::Status { status, body } => HistoryError::Http { status, body },
            ApiError::Decode(msg) => HistoryError::Decode(msg),
            other => HistoryError::Request(other.to_string()),
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        AuthError::Request(err.to_string())
    }
}
