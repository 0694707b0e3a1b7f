//! REST adapter for the conversation directory and history.

use crate::http::client::ApiClient;
use async_trait::async_trait;
use parley_application::ports::history_api::{HistoryApi, HistoryError};
use parley_domain::{Session, SessionId, StoredMessage};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

/// [`HistoryApi`] over the server's `/sessions/` endpoints
pub struct HttpHistoryClient {
    api: Arc<ApiClient>,
}

impl HttpHistoryClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl HistoryApi for HttpHistoryClient {
    async fn list_sessions(&self) -> Result<Vec<Session>, HistoryError> {
        Ok(self.api.get_json("sessions/").await?)
    }

    async fn fetch_messages(&self, id: &SessionId) -> Result<Vec<StoredMessage>, HistoryError> {
        Ok(self
            .api
            .get_json(&format!("sessions/{}/messages/", id))
            .await?)
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), HistoryError> {
        self.api
            .execute(Method::DELETE, &format!("sessions/{}/", id), None)
            .await?;
        Ok(())
    }

    async fn rename_session(&self, id: &SessionId, title: &str) -> Result<(), HistoryError> {
        self.api
            .execute(
                Method::PATCH,
                &format!("sessions/{}/rename/", id),
                Some(json!({ "title": title })),
            )
            .await?;
        Ok(())
    }
}
