//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and mapped onto application types.

mod connection;
mod directory;
mod logging;
mod reveal;
mod server;

pub use connection::FileConnectionConfig;
pub use directory::FileDirectoryConfig;
pub use logging::FileLoggingConfig;
pub use reveal::FileRevealConfig;
pub use server::FileServerConfig;

use parley_application::EngineConfig;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How bad a configuration issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The client cannot work with this value.
    Error,
    /// The client works, but probably not as intended.
    Warning,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted key of the offending value, e.g. `server.ws_url`.
    pub field: &'static str,
    pub message: String,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Server endpoints
    pub server: FileServerConfig,
    /// Reconnect policy
    pub connection: FileConnectionConfig,
    /// Reveal animation
    pub reveal: FileRevealConfig,
    /// Directory refresh timing
    pub directory: FileDirectoryConfig,
    /// Conversation transcript
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        match Url::parse(&self.server.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => issues.push(ConfigIssue {
                severity: Severity::Error,
                field: "server.api_base_url",
                message: format!(
                    "server.api_base_url: '{}' is not an http(s) URL",
                    self.server.api_base_url
                ),
            }),
        }
        match Url::parse(&self.server.ws_url) {
            Ok(url) if matches!(url.scheme(), "ws" | "wss") => {}
            _ => issues.push(ConfigIssue {
                severity: Severity::Error,
                field: "server.ws_url",
                message: format!(
                    "server.ws_url: '{}' is not a ws(s) URL",
                    self.server.ws_url
                ),
            }),
        }

        if self.connection.reconnect_interval_ms == 0 {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                field: "connection.reconnect_interval_ms",
                message: "connection.reconnect_interval_ms is 0; reconnects will spin".to_string(),
            });
        }
        if self.reveal.tick_interval_ms == 0 {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                field: "reveal.tick_interval_ms",
                message: "reveal.tick_interval_ms is 0; replies will appear at once".to_string(),
            });
        }
        if self.reveal.chars_per_tick == 0 {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                field: "reveal.chars_per_tick",
                message: "reveal.chars_per_tick is 0; using 1".to_string(),
            });
        }

        issues
    }

    /// Engine timings described by this file.
    pub fn engine_config(&self) -> EngineConfig {
        // interval() panics on a zero period
        let tick = Duration::from_millis(self.reveal.tick_interval_ms.max(1));
        EngineConfig::default()
            .with_title_refresh_delay(Duration::from_millis(
                self.directory.title_refresh_delay_ms,
            ))
            .with_reveal_tick(tick)
            .with_chars_per_tick(self.reveal.chars_per_tick)
    }
}
