//! Authentication port
//!
//! Login state lives in the shared cookie store; the engine only consumes the
//! resulting [`AuthStatus`], which is passed in at construction.

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by the authentication collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("Request failed: {0}")]
    Request(String),
}

/// Who (if anyone) is logged in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub username: Option<String>,
}

impl AuthStatus {
    pub fn signed_in(username: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            username: Some(username.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Authentication collaborator
#[async_trait]
pub trait AuthPort: Send + Sync {
    /// Ask the server to set the CSRF cookie used by non-GET requests.
    async fn prime_csrf(&self) -> Result<(), AuthError>;

    /// Current login state according to the server.
    async fn check(&self) -> Result<AuthStatus, AuthError>;

    /// Log in and return the refreshed status.
    async fn login(&self, username: &str, password: &str) -> Result<AuthStatus, AuthError>;

    /// End the server-side session.
    async fn logout(&self) -> Result<(), AuthError>;
}
