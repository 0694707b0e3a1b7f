//! Reveal animation settings from TOML (`[reveal]` section)

use serde::{Deserialize, Serialize};

/// Raw reveal configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRevealConfig {
    /// Interval between reveal steps, in milliseconds
    pub tick_interval_ms: u64,
    /// Characters disclosed per step
    pub chars_per_tick: usize,
}

impl Default for FileRevealConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 15,
            chars_per_tick: 1,
        }
    }
}
