//! In-process notification store.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use hearth_core::error::StorageError;
use hearth_core::types::{NewNotification, Notification, NotificationId, UserId};
use parking_lot::RwLock;

use super::{NotificationStore, observe};

const BACKEND: &str = "memory";

/// Notification store backed by a locked vector.
///
/// Rows are appended in creation order. Bulk updates run under a single
/// write lock, so readers see either none or all of a `mark_all_read`.
#[derive(Debug)]
pub struct MemoryNotificationStore {
    rows: RwLock<Vec<Notification>>,
    next_id: AtomicI64,
}

impl Default for MemoryNotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNotificationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Total number of stored notifications across all users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns true if nothing has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn create(&self, input: NewNotification) -> Result<Notification, StorageError> {
        let started = Instant::now();
        let mut rows = self.rows.write();
        // Allocated under the write lock so ids follow insertion order
        let id = NotificationId::new_unchecked(self.next_id.fetch_add(1, Ordering::Relaxed));
        let notification = Notification::new(id, input, Utc::now());
        rows.push(notification.clone());
        drop(rows);
        observe(BACKEND, "create", started);
        Ok(notification)
    }

    async fn list_recent(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, StorageError> {
        let started = Instant::now();
        let mut recent: Vec<Notification> = self
            .rows
            .read()
            .iter()
            .filter(|n| n.recipient() == user)
            .cloned()
            .collect();
        recent.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        recent.truncate(limit);
        observe(BACKEND, "list_recent", started);
        Ok(recent)
    }

    async fn count_unread(&self, user: UserId) -> Result<u64, StorageError> {
        let count = self
            .rows
            .read()
            .iter()
            .filter(|n| n.recipient() == user && !n.is_read())
            .count();
        Ok(count as u64)
    }

    async fn mark_all_read(&self, user: UserId) -> Result<u64, StorageError> {
        let started = Instant::now();
        let now = Utc::now();
        let mut updated = 0;
        for notification in self.rows.write().iter_mut() {
            if notification.recipient() == user && notification.mark_read(now) {
                updated += 1;
            }
        }
        observe(BACKEND, "mark_all_read", started);
        Ok(updated)
    }

    async fn mark_read(&self, user: UserId, id: NotificationId) -> Result<bool, StorageError> {
        let now = Utc::now();
        let changed = self
            .rows
            .write()
            .iter_mut()
            .find(|n| n.id() == id && n.recipient() == user)
            .is_some_and(|n| n.mark_read(now));
        Ok(changed)
    }
}
