//! Engine timing parameters.
//!
//! [`EngineConfig`] groups the static timings that the reconciliation engine
//! uses for deferred work. These are application-layer concerns; the file
//! config in the infrastructure layer maps onto them.

use std::time::Duration;

/// Timing parameters for the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Delay between adopting a new identity and refreshing the directory, so
    /// the server has time to generate a title.
    pub title_refresh_delay: Duration,
    /// Interval between two reveal steps of an assistant message.
    pub reveal_tick: Duration,
    /// Characters disclosed per reveal step.
    pub chars_per_tick: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title_refresh_delay: Duration::from_millis(2000),
            reveal_tick: Duration::from_millis(15),
            chars_per_tick: 1,
        }
    }
}

impl EngineConfig {
    // ==================== Builder Methods ====================

    pub fn with_title_refresh_delay(mut self, delay: Duration) -> Self {
        self.title_refresh_delay = delay;
        self
    }

    pub fn with_reveal_tick(mut self, tick: Duration) -> Self {
        self.reveal_tick = tick;
        self
    }

    pub fn with_chars_per_tick(mut self, chars: usize) -> Self {
        self.chars_per_tick = chars.max(1);
        self
    }
}
