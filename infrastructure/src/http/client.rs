//! Shared REST client.
//!
//! One [`ApiClient`] is shared by the history and auth adapters. Its cookie
//! jar is the single source of login state: the server sets the session and
//! CSRF cookies on it, and the WebSocket handshake reads from the same jar.
//!
//! Every non-GET request echoes the `csrftoken` cookie in the `X-CSRFToken`
//! header; GET requests never carry it.

use crate::http::error::ApiError;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Cookie set by the server for CSRF protection
pub const CSRF_COOKIE: &str = "csrftoken";
/// Header echoing the CSRF cookie on unsafe requests
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Cookie-authenticated client for the REST API
pub struct ApiClient {
    http: reqwest::Client,
    /// API root, always ending in `/`.
    base: Url,
    jar: Arc<Jar>,
}

impl ApiClient {
    /// Create a client rooted at `base_url` (e.g. `http://127.0.0.1:8000/api`).
    pub fn new(base_url: &str, jar: Arc<Jar>) -> Result<Self, ApiError> {
        let mut base =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()?;
        Ok(Self { http, base, jar })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The cookie jar, for sharing with the chat connection.
    pub fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    /// Current value of the CSRF cookie, if the server has set one.
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let cookies = header.to_str().ok()?;
        cookies
            .split(';')
            .map(str::trim)
            .find_map(|pair| pair.strip_prefix(CSRF_COOKIE)?.strip_prefix('='))
            .map(str::to_string)
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Issue a request and fail on any non-2xx status.
    pub(crate) async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Response, ApiError> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);
        let mut request = self.http.request(method.clone(), url);
        if method != Method::GET
            && let Some(token) = self.csrf_token()
        {
            request = request.header(CSRF_HEADER, token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            trace!("{} response body: {}", status, body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// `GET path` and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, None).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
