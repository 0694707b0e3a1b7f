//! Server endpoints from TOML (`[server]` section)

use serde::{Deserialize, Serialize};

/// Raw server configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// REST API root
    pub api_base_url: String,
    /// Persistent chat connection endpoint
    pub ws_url: String,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api".to_string(),
            ws_url: "ws://127.0.0.1:8000/ws/chat/".to_string(),
        }
    }
}
