//! WebSocket server configuration.

use hearth_core::config::Validatable;
use hearth_core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// WebSocket server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsConfig {
    /// Close a socket after this many seconds without a client frame (0 disables)
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Maximum inbound message size in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl WsConfig {
    /// Returns the idle timeout, or `None` when disabled.
    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

impl Validatable for WsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_size == 0 {
            return Err(ConfigError::invalid_value(
                "api.websocket.max_message_size",
                "Must be positive",
            ));
        }
        Ok(())
    }
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_max_message_size() -> usize {
    64 * 1024 // 64KB
}
