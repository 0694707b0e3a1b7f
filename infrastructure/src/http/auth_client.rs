//! REST adapter for login state.

use crate::http::client::ApiClient;
use crate::http::error::ApiError;
use async_trait::async_trait;
use parley_application::ports::auth::{AuthError, AuthPort, AuthStatus};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthCheckResponse {
    is_authenticated: bool,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// [`AuthPort`] over the server's cookie-session endpoints
pub struct HttpAuthClient {
    api: Arc<ApiClient>,
}

impl HttpAuthClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthPort for HttpAuthClient {
    async fn prime_csrf(&self) -> Result<(), AuthError> {
        self.api.execute(Method::GET, "csrf/", None).await?;
        debug!("CSRF cookie present: {}", self.api.csrf_token().is_some());
        Ok(())
    }

    async fn check(&self) -> Result<AuthStatus, AuthError> {
        let response: AuthCheckResponse = self.api.get_json("auth-check/").await?;
        Ok(AuthStatus {
            authenticated: response.is_authenticated,
            username: response.username.filter(|_| response.is_authenticated),
        })
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthStatus, AuthError> {
        let result = self
            .api
            .execute(
                Method::POST,
                "login/",
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        let response = match result {
            Ok(response) => response,
            Err(ApiError::Status { status: 401, body }) => {
                let message = serde_json::from_str::<LoginResponse>(&body)
                    .ok()
                    .and_then(|r| r.message)
                    .unwrap_or_else(|| "Invalid credentials".to_string());
                return Err(AuthError::InvalidCredentials(message));
            }
            Err(e) => return Err(e.into()),
        };
        let body: LoginResponse = response.json().await.unwrap_or_default();
        let name = body.username.unwrap_or_else(|| username.to_string());
        info!("Logged in as {}", name);
        Ok(AuthStatus::signed_in(name))
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.api.execute(Method::POST, "logout/", None).await?;
        info!("Logged out");
        Ok(())
    }
}
