//! Trigger entry point: store, count, publish.

use std::sync::Arc;

use hearth_core::error::StorageError;
use hearth_core::types::{NewNotification, Notification, NotificationKind, UserId};
use hearth_telemetry::metrics::HearthMetrics;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::dispatch::{Dispatcher, Push};
use crate::events::DomainEvent;
use crate::store::NotificationStore;

/// Errors returned by [`NotificationService`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    /// The notification could not be stored.
    #[error("notification not stored: {0}")]
    Storage(#[from] StorageError),
}

/// Creates notifications and pushes them to the recipient's live connections.
///
/// Runs on the caller's task. Publishing never waits on a connection, so a
/// slow client cannot hold up the domain write that triggered it.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    dispatcher: Arc<Dispatcher>,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("store", &self.store.backend())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl NotificationService {
    /// Creates a service over an injected store and dispatcher.
    #[must_use]
    pub fn new(store: Arc<dyn NotificationStore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Stores the notification for `event` and pushes it live.
    ///
    /// A storage failure on create is returned. Once the record exists the
    /// call succeeds: if the unread count cannot be recomputed the live push
    /// is skipped rather than sent with a guessed count.
    #[instrument(skip_all, fields(event = event.name(), recipient = %event.recipient()))]
    pub async fn notify(&self, event: &DomainEvent) -> Result<Notification, NotifyError> {
        self.deliver(event.render()).await
    }

    /// Like [`notify`](Self::notify) but never fails; for write paths whose
    /// own work has already committed.
    pub async fn notify_best_effort(&self, event: &DomainEvent) -> Option<Notification> {
        match self.notify(event).await {
            Ok(notification) => Some(notification),
            Err(e) => {
                warn!(event = event.name(), error = %e, "Notification dropped");
                None
            }
        }
    }

    /// Sends an ad-hoc notification to `recipient` through the same store
    /// and push path as domain events.
    #[instrument(skip_all, fields(%recipient, %kind))]
    pub async fn notify_user(
        &self,
        recipient: UserId,
        message: impl Into<String>,
        link: Option<String>,
        kind: NotificationKind,
    ) -> Result<Notification, NotifyError> {
        let mut input = NewNotification::new(recipient, message).with_kind(kind);
        input.link = link;
        self.deliver(input).await
    }

    async fn deliver(&self, input: NewNotification) -> Result<Notification, NotifyError> {
        let notification = self.store.create(input).await?;
        HearthMetrics::notification_created(notification.kind().as_str());
        debug!(id = %notification.id(), "Notification stored");

        let unread_count = match self.store.count_unread(notification.recipient()).await {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    id = %notification.id(),
                    error = %e,
                    "Unread count unavailable, skipping live push"
                );
                return Ok(notification);
            }
        };

        let group = Dispatcher::group_for(notification.recipient());
        let report = self
            .dispatcher
            .publish(&group, &Push::new_notification(&notification, unread_count));
        info!(
            id = %notification.id(),
            %group,
            unread_count,
            delivered = report.delivered,
            "Notification sent"
        );

        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ConnectionId;
    use crate::events::{InquiryRecord, ListingRecord};
    use crate::store::MemoryNotificationStore;
    use async_trait::async_trait;
    use hearth_core::types::NotificationId;
    use tokio::sync::mpsc;

    fn user(id: i64) -> UserId {
        UserId::new_unchecked(id)
    }

    fn sunny_flat_inquiry() -> InquiryRecord {
        InquiryRecord {
            id: 1,
            listing: ListingRecord {
                owner: user(1),
                owner_name: "A".to_string(),
                title: "Sunny Flat".to_string(),
                slug: "sunny-flat".to_string(),
            },
            inquirer: user(2),
            inquirer_name: "B".to_string(),
            reply: None,
        }
    }

    fn service() -> (NotificationService, Arc<MemoryNotificationStore>, Arc<Dispatcher>) {
        let store = Arc::new(MemoryNotificationStore::new());
        let dispatcher = Arc::new(Dispatcher::new());
        let service = NotificationService::new(store.clone(), dispatcher.clone());
        (service, store, dispatcher)
    }

    /// Store whose writes or counts can be made to fail.
    struct FlakyStore {
        inner: MemoryNotificationStore,
        fail_create: bool,
        fail_count: bool,
    }

    #[async_trait]
    impl NotificationStore for FlakyStore {
        fn backend(&self) -> &'static str {
            "flaky"
        }

        async fn create(&self, input: NewNotification) -> Result<Notification, StorageError> {
            if self.fail_create {
                return Err(StorageError::query("create", "disk full"));
            }
            self.inner.create(input).await
        }

        async fn list_recent(
            &self,
            user: UserId,
            limit: usize,
        ) -> Result<Vec<Notification>, StorageError> {
            self.inner.list_recent(user, limit).await
        }

        async fn count_unread(&self, user: UserId) -> Result<u64, StorageError> {
            if self.fail_count {
                return Err(StorageError::query("count_unread", "locked"));
            }
            self.inner.count_unread(user).await
        }

        async fn mark_all_read(&self, user: UserId) -> Result<u64, StorageError> {
            self.inner.mark_all_read(user).await
        }

        async fn mark_read(
            &self,
            user: UserId,
            id: NotificationId,
        ) -> Result<bool, StorageError> {
            self.inner.mark_read(user, id).await
        }
    }

    #[tokio::test]
    async fn test_sunny_flat_inquiry_scenario() {
        let (service, store, dispatcher) = service();
        let (tx, mut rx) = mpsc::channel(8);
        dispatcher.join(&group_a(), ConnectionId::generate(), tx);

        let event = sunny_flat_inquiry().created_event().unwrap();
        let notification = service.notify(&event).await.unwrap();

        assert_eq!(notification.recipient(), user(1));
        assert!(notification.message().contains('B'));
        assert!(notification.message().contains("Sunny Flat"));
        assert_eq!(store.count_unread(user(1)).await.unwrap(), 1);
        assert_eq!(store.count_unread(user(2)).await.unwrap(), 0);

        let push = rx.recv().await.unwrap();
        assert_eq!(push, Push::new_notification(&notification, 1));
        assert!(rx.try_recv().is_err(), "exactly one publish");
    }

    fn group_a() -> crate::dispatch::GroupName {
        Dispatcher::group_for(user(1))
    }

    #[tokio::test]
    async fn test_reply_notifies_inquirer_once() {
        let (service, store, _dispatcher) = service();
        let before = sunny_flat_inquiry();
        let mut after = before.clone();
        after.reply = Some("Sure, come by Saturday".to_string());

        for (old, new) in [(&before, &after), (&after, &after)] {
            if let Some(event) = InquiryRecord::reply_transition(old, new) {
                service.notify(&event).await.unwrap();
            }
        }

        let inbox = store.list_recent(user(2), 20).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].recipient(), user(2));
    }

    #[tokio::test]
    async fn test_unread_count_in_push_is_recomputed() {
        let (service, _store, dispatcher) = service();
        let (tx, mut rx) = mpsc::channel(8);
        dispatcher.join(&group_a(), ConnectionId::generate(), tx);

        for _ in 0..3 {
            service
                .notify_user(user(1), "ping", None, NotificationKind::Info)
                .await
                .unwrap();
        }
        let counts: Vec<u64> = [
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
        ]
        .iter()
        .map(Push::unread_count)
        .collect();
        assert_eq!(counts, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_notify_without_connections_still_stores() {
        let (service, store, _dispatcher) = service();
        let n = service
            .notify_user(user(5), "hello", Some("/inquiries/3/".to_string()), NotificationKind::Warning)
            .await
            .unwrap();
        assert_eq!(n.kind(), NotificationKind::Warning);
        assert_eq!(store.count_unread(user(5)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_propagates() {
        let store = Arc::new(FlakyStore {
            inner: MemoryNotificationStore::new(),
            fail_create: true,
            fail_count: false,
        });
        let dispatcher = Arc::new(Dispatcher::new());
        let service = NotificationService::new(store, dispatcher);
        let event = sunny_flat_inquiry().created_event().unwrap();

        assert!(matches!(
            service.notify(&event).await,
            Err(NotifyError::Storage(StorageError::Query { .. }))
        ));
        assert_eq!(service.notify_best_effort(&event).await, None);
    }

    #[tokio::test]
    async fn test_count_failure_skips_push_but_keeps_record() {
        let store = Arc::new(FlakyStore {
            inner: MemoryNotificationStore::new(),
            fail_create: false,
            fail_count: true,
        });
        let dispatcher = Arc::new(Dispatcher::new());
        let (tx, mut rx) = mpsc::channel(8);
        dispatcher.join(&group_a(), ConnectionId::generate(), tx);
        let service = NotificationService::new(store.clone(), dispatcher);

        let event = sunny_flat_inquiry().created_event().unwrap();
        let notification = service.notify(&event).await.unwrap();

        assert_eq!(store.inner.len(), 1);
        assert_eq!(notification.recipient(), user(1));
        assert!(rx.try_recv().is_err());
    }
}
