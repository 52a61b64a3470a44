//! Notification service configuration.

use hearth_core::config::Validatable;
use hearth_core::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Upper bound on how many notifications a single read may return.
pub const MAX_RECENT_LIMIT: usize = 20;

/// Configuration for the notification core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// How many notifications the read API returns, at most [`MAX_RECENT_LIMIT`]
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    /// Capacity of each live connection's push queue
    #[serde(default = "default_connection_queue_size")]
    pub connection_queue_size: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
            connection_queue_size: default_connection_queue_size(),
        }
    }
}

fn default_recent_limit() -> usize {
    20
}

fn default_connection_queue_size() -> usize {
    64
}

impl NotifyConfig {
    /// The configured read limit, clamped to [`MAX_RECENT_LIMIT`].
    #[must_use]
    pub fn effective_recent_limit(&self) -> usize {
        self.recent_limit.clamp(1, MAX_RECENT_LIMIT)
    }
}

impl Validatable for NotifyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_limit == 0 || self.recent_limit > MAX_RECENT_LIMIT {
            return Err(ConfigError::invalid_value(
                "notifications.recent_limit",
                format!("Must be between 1 and {MAX_RECENT_LIMIT}"),
            ));
        }
        if self.connection_queue_size == 0 {
            return Err(ConfigError::invalid_value(
                "notifications.connection_queue_size",
                "Queue must hold at least one push",
            ));
        }
        Ok(())
    }
}
