//! Durable notification storage.
//!
//! The store is the source of truth for history and unread counts. Live
//! pushes are best-effort on top of it.

mod memory;
mod sqlite;

pub use memory::MemoryNotificationStore;
pub use sqlite::SqliteNotificationStore;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use hearth_core::config::Validatable;
use hearth_core::error::{ConfigError, StorageError};
use hearth_core::types::{NewNotification, Notification, NotificationId, UserId};
use hearth_telemetry::metrics::HearthMetrics;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Persistence contract for notifications.
///
/// Every query is scoped by recipient. Unknown users simply have no rows, so
/// they produce empty lists and zero counts rather than errors.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Short backend name used in logs and metrics.
    fn backend(&self) -> &'static str;

    /// Inserts an unread notification stamped with the current time.
    async fn create(&self, input: NewNotification) -> Result<Notification, StorageError>;

    /// Returns up to `limit` notifications for `user`, newest first.
    async fn list_recent(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, StorageError>;

    /// Counts unread notifications for `user`.
    async fn count_unread(&self, user: UserId) -> Result<u64, StorageError>;

    /// Marks every unread notification of `user` as read in one atomic step.
    ///
    /// Returns the number of notifications that changed; a repeated call
    /// returns 0.
    async fn mark_all_read(&self, user: UserId) -> Result<u64, StorageError>;

    /// Marks a single notification owned by `user` as read.
    ///
    /// Returns `false` when the notification does not exist, belongs to a
    /// different user, or was already read.
    async fn mark_read(&self, user: UserId, id: NotificationId) -> Result<bool, StorageError>;
}

/// Records how long a store operation took.
pub(crate) fn observe(backend: &str, operation: &str, started: Instant) {
    HearthMetrics::store_latency(backend, operation, started.elapsed().as_secs_f64());
}

/// Available store backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store; contents are lost on restart
    #[default]
    Memory,
    /// `SQLite` database through `sqlx`
    Sqlite,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend to use
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database URL for the `SQLite` backend
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Connection pool size for the `SQLite` backend
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite:hearth.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Validatable for StoreConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StoreBackend::Sqlite {
            if self.database_url.trim().is_empty() {
                return Err(ConfigError::missing_field_in_section(
                    "database_url",
                    "store",
                ));
            }
            if !self.database_url.starts_with("sqlite:") {
                return Err(ConfigError::invalid_value(
                    "store.database_url",
                    "SQLite URLs must start with 'sqlite:'",
                ));
            }
        }
        if self.max_connections == 0 {
            return Err(ConfigError::invalid_value(
                "store.max_connections",
                "Pool size must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Opens the configured store backend.
pub async fn connect_store(
    config: &StoreConfig,
) -> Result<Arc<dyn NotificationStore>, StorageError> {
    info!(backend = %config.backend, "Opening notification store");
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryNotificationStore::new())),
        StoreBackend::Sqlite => {
            let store =
                SqliteNotificationStore::connect(&config.database_url, config.max_connections)
                    .await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_memory() {
        let config = StoreConfig::default();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sqlite_url_validation() {
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            database_url: "postgres://localhost/hearth".to_string(),
            max_connections: 1,
        };
        assert!(config.validate().is_err());

        let config = StoreConfig {
            database_url: String::new(),
            ..config
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_zero_pool_rejected() {
        let config = StoreConfig {
            max_connections: 0,
            ..StoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_connect_memory_store() {
        let store = connect_store(&StoreConfig::default()).await.unwrap();
        assert_eq!(store.backend(), "memory");
        assert_eq!(store.count_unread(UserId::new_unchecked(1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connect_sqlite_store() {
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            database_url: "sqlite::memory:".to_string(),
            max_connections: 4,
        };
        let store = connect_store(&config).await.unwrap();
        assert_eq!(store.backend(), "sqlite");
    }
}
