//! Directory settings from TOML (`[directory]` section)

use serde::{Deserialize, Serialize};

/// Raw directory configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDirectoryConfig {
    /// Delay before refreshing the directory once a draft gets its identity,
    /// in milliseconds
    pub title_refresh_delay_ms: u64,
}

impl Default for FileDirectoryConfig {
    fn default() -> Self {
        Self {
            title_refresh_delay_ms: 2000,
        }
    }
}
