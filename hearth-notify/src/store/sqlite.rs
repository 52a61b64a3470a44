//! `SQLite` notification store.

use std::str::FromStr;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::error::StorageError;
use hearth_core::types::{NewNotification, Notification, NotificationId, NotificationKind, UserId};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use super::{NotificationStore, observe};

const BACKEND: &str = "sqlite";

const SELECT_COLUMNS: &str =
    "SELECT id, recipient_id, message, link, kind, is_read, created_at, updated_at FROM notifications";

/// Notification store persisted in `SQLite`.
///
/// Timestamps are stored as integer microseconds since the Unix epoch so
/// ordering is exact and cheap.
#[derive(Debug, Clone)]
pub struct SqliteNotificationStore {
    pool: SqlitePool,
}

impl SqliteNotificationStore {
    /// Connects to `database_url` and creates the schema if needed.
    ///
    /// In-memory databases are pinned to a single pooled connection because
    /// every `SQLite` connection would otherwise see its own empty database.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let in_memory = database_url.contains(":memory:");
        let max_connections = if in_memory { 1 } else { max_connections };

        let mut options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            // Closing the only connection would drop the database with it
            options = options.idle_timeout(None).max_lifetime(None);
        }

        let pool = options
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Connection {
                url: database_url.to_string(),
                reason: e.to_string(),
            })?;

        let store = Self { pool };
        store.migrate().await?;
        info!(url = %database_url, max_connections, "SQLite notification store ready");
        Ok(store)
    }

    /// Creates the notifications table and its lookup index.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipient_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                link TEXT,
                kind TEXT NOT NULL DEFAULT 'info',
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Migration {
            reason: e.to_string(),
        })?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_notifications_recipient \
             ON notifications(recipient_id, is_read, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Migration {
            reason: format!("Index creation failed: {e}"),
        })?;

        Ok(())
    }

    fn row_to_notification(row: &SqliteRow) -> Result<Notification, StorageError> {
        let corrupt = |column: &str, e: &dyn std::fmt::Display| StorageError::CorruptRow {
            reason: format!("{column}: {e}"),
        };

        let id: i64 = row.try_get("id").map_err(|e| corrupt("id", &e))?;
        let recipient: i64 = row
            .try_get("recipient_id")
            .map_err(|e| corrupt("recipient_id", &e))?;
        let message: String = row.try_get("message").map_err(|e| corrupt("message", &e))?;
        let link: Option<String> = row.try_get("link").map_err(|e| corrupt("link", &e))?;
        let kind: String = row.try_get("kind").map_err(|e| corrupt("kind", &e))?;
        let is_read: bool = row.try_get("is_read").map_err(|e| corrupt("is_read", &e))?;
        let created_at: i64 = row
            .try_get("created_at")
            .map_err(|e| corrupt("created_at", &e))?;
        let updated_at: i64 = row
            .try_get("updated_at")
            .map_err(|e| corrupt("updated_at", &e))?;

        let recipient = UserId::new(recipient).map_err(|e| corrupt("recipient_id", &e))?;
        let kind = NotificationKind::from_str(&kind).map_err(|e| corrupt("kind", &e))?;

        Ok(Notification::restore(
            NotificationId::new_unchecked(id),
            recipient,
            message,
            link,
            kind,
            is_read,
            from_micros(created_at, "created_at")?,
            from_micros(updated_at, "updated_at")?,
        ))
    }
}

fn from_micros(micros: i64, column: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| StorageError::CorruptRow {
        reason: format!("{column}: timestamp {micros} out of range"),
    })
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl NotificationStore for SqliteNotificationStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn create(&self, input: NewNotification) -> Result<Notification, StorageError> {
        let started = Instant::now();
        let now = Utc::now();
        let micros = now.timestamp_micros();

        let result = sqlx::query(
            "INSERT INTO notifications \
             (recipient_id, message, link, kind, is_read, created_at, updated_at) \
             VALUES (?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(input.recipient.as_i64())
        .bind(&input.message)
        .bind(input.link.as_deref())
        .bind(input.kind.as_str())
        .bind(micros)
        .bind(micros)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::query("create", e))?;

        let id = NotificationId::new_unchecked(result.last_insert_rowid());
        // Round-trip through micros so the returned record matches what a
        // later read would produce
        let now = from_micros(micros, "created_at")?;
        observe(BACKEND, "create", started);
        debug!(%id, recipient = %input.recipient, "Notification inserted");
        Ok(Notification::new(id, input, now))
    }

    async fn list_recent(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, StorageError> {
        let started = Instant::now();
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE recipient_id = ? ORDER BY created_at DESC, id DESC LIMIT ?"
        ))
        .bind(user.as_i64())
        .bind(limit_param(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::query("list_recent", e))?;

        let notifications = rows
            .iter()
            .map(Self::row_to_notification)
            .collect::<Result<Vec<_>, _>>()?;
        observe(BACKEND, "list_recent", started);
        Ok(notifications)
    }

    async fn count_unread(&self, user: UserId) -> Result<u64, StorageError> {
        let started = Instant::now();
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND is_read = 0",
        )
        .bind(user.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::query("count_unread", e))?;
        observe(BACKEND, "count_unread", started);
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn mark_all_read(&self, user: UserId) -> Result<u64, StorageError> {
        let started = Instant::now();
        // One conditional statement; rows inserted while it runs are either
        // fully included or untouched
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1, updated_at = ? \
             WHERE recipient_id = ? AND is_read = 0",
        )
        .bind(Utc::now().timestamp_micros())
        .bind(user.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::query("mark_all_read", e))?;
        observe(BACKEND, "mark_all_read", started);
        Ok(result.rows_affected())
    }

    async fn mark_read(&self, user: UserId, id: NotificationId) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1, updated_at = ? \
             WHERE id = ? AND recipient_id = ? AND is_read = 0",
        )
        .bind(Utc::now().timestamp_micros())
        .bind(id.as_i64())
        .bind(user.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::query("mark_read", e))?;
        Ok(result.rows_affected() == 1)
    }
}
