//! Connection configuration from TOML (`[connection]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw connection configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConnectionConfig {
    /// Fixed delay between reconnect attempts, in milliseconds
    pub reconnect_interval_ms: u64,
}

impl Default for FileConnectionConfig {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: 3000,
        }
    }
}

impl FileConnectionConfig {
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}
