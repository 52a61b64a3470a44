//! The group dispatcher.

use std::collections::HashMap;

use dashmap::DashMap;
use hearth_core::types::UserId;
use hearth_telemetry::metrics::HearthMetrics;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, instrument, warn};

use super::group::{ConnectionId, GroupName};
use super::payload::{DeliveryReport, Push};

type Members = HashMap<ConnectionId, mpsc::Sender<Push>>;

/// Routes pushes to the connections currently joined to a group.
///
/// Holds no durable state. A recipient with no open connection at publish
/// time simply misses the live push.
///
/// `publish` enqueues while holding the group's shard read guard and
/// `join`/`leave` take the write guard, so once `leave` returns the member
/// will not be handed any later payload.
#[derive(Debug, Default)]
pub struct Dispatcher {
    groups: DashMap<GroupName, Members>,
    memberships: DashMap<ConnectionId, GroupName>,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the group that carries live pushes for `user`.
    #[must_use]
    pub fn group_for(user: UserId) -> GroupName {
        GroupName::for_user(user)
    }

    /// Adds a connection to `group`.
    ///
    /// A connection belongs to at most one group; joining a second group
    /// moves it.
    #[instrument(skip_all, fields(%group, %id))]
    pub fn join(&self, group: &GroupName, id: ConnectionId, sender: mpsc::Sender<Push>) {
        if let Some(previous) = self.memberships.insert(id, group.clone()) {
            if &previous != group {
                self.remove_member(&previous, id);
                debug!(%previous, "Connection moved between groups");
            }
        }
        self.groups.entry(group.clone()).or_default().insert(id, sender);
        debug!("Connection joined group");
    }

    /// Removes a connection from `group`. Unknown handles are ignored.
    #[instrument(skip_all, fields(%group, %id))]
    pub fn leave(&self, group: &GroupName, id: ConnectionId) {
        let removed = self.remove_member(group, id);
        self.memberships.remove_if(&id, |_, joined| joined == group);
        if removed {
            debug!("Connection left group");
        }
    }

    fn remove_member(&self, group: &GroupName, id: ConnectionId) -> bool {
        let removed = self
            .groups
            .get_mut(group)
            .is_some_and(|mut members| members.remove(&id).is_some());
        self.groups.remove_if(group, |_, members| members.is_empty());
        removed
    }

    /// Enqueues `push` for every member of `group`.
    ///
    /// Never waits on a slow member and never fails: a full or closed queue
    /// is counted as dropped and delivery continues with the others.
    #[instrument(skip_all, fields(%group))]
    pub fn publish(&self, group: &GroupName, push: &Push) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut full = 0_u64;
        let mut closed = 0_u64;

        if let Some(members) = self.groups.get(group) {
            for (id, sender) in members.iter() {
                match sender.try_send(push.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(%id, "Connection queue full, dropping push");
                        full += 1;
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(%id, "Connection queue closed, dropping push");
                        closed += 1;
                    }
                }
            }
        }
        report.dropped = usize::try_from(full + closed).unwrap_or(usize::MAX);

        if report.delivered > 0 {
            HearthMetrics::push_delivered(report.delivered as u64);
        }
        if full > 0 {
            HearthMetrics::push_dropped("queue_full", full);
        }
        if closed > 0 {
            HearthMetrics::push_dropped("closed", closed);
        }
        debug!(
            delivered = report.delivered,
            dropped = report.dropped,
            "Push published"
        );
        report
    }

    /// Number of groups with at least one member.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of connections joined to `group`.
    #[must_use]
    pub fn member_count(&self, group: &GroupName) -> usize {
        self.groups.get(group).map_or(0, |members| members.len())
    }

    /// Returns the group a connection is currently joined to.
    #[must_use]
    pub fn group_of(&self, id: ConnectionId) -> Option<GroupName> {
        self.memberships.get(&id).map(|entry| entry.value().clone())
    }

    /// Drops every membership. Member queues close once their senders are
    /// gone, which ends the connection tasks reading them.
    pub fn clear(&self) {
        self.groups.clear();
        self.memberships.clear();
        debug!("Dispatcher cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::types::NotificationId;
    use std::sync::Arc;

    fn push(n: i64) -> Push {
        Push::NewNotification {
            id: NotificationId::new_unchecked(n),
            message: format!("m{n}"),
            link: "#".to_string(),
            unread_count: 1,
        }
    }

    fn group(user: i64) -> GroupName {
        Dispatcher::group_for(UserId::new_unchecked(user))
    }

    #[tokio::test]
    async fn test_publish_reaches_every_member_of_group_only() {
        let dispatcher = Dispatcher::new();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        let (tx_other, mut rx_other) = mpsc::channel(8);

        dispatcher.join(&group(1), ConnectionId::generate(), tx_a);
        dispatcher.join(&group(1), ConnectionId::generate(), tx_b);
        dispatcher.join(&group(2), ConnectionId::generate(), tx_other);

        let report = dispatcher.publish(&group(1), &push(1));
        assert_eq!(report, DeliveryReport { delivered: 2, dropped: 0 });
        assert_eq!(rx_a.recv().await, Some(push(1)));
        assert_eq!(rx_b.recv().await, Some(push(1)));
        assert!(rx_other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_to_empty_group() {
        let dispatcher = Dispatcher::new();
        let report = dispatcher.publish(&group(9), &push(1));
        assert_eq!(report.attempted(), 0);
    }

    #[tokio::test]
    async fn test_leave_is_idempotent_and_cleans_up() {
        let dispatcher = Dispatcher::new();
        let id = ConnectionId::generate();
        let (tx, _rx) = mpsc::channel(8);

        dispatcher.leave(&group(1), id);
        dispatcher.join(&group(1), id, tx);
        assert_eq!(dispatcher.member_count(&group(1)), 1);

        dispatcher.leave(&group(1), id);
        dispatcher.leave(&group(1), id);
        assert_eq!(dispatcher.member_count(&group(1)), 0);
        assert_eq!(dispatcher.group_count(), 0);
        assert_eq!(dispatcher.group_of(id), None);
    }

    #[tokio::test]
    async fn test_join_moves_between_groups() {
        let dispatcher = Dispatcher::new();
        let id = ConnectionId::generate();
        let (tx, _rx) = mpsc::channel(8);

        dispatcher.join(&group(1), id, tx.clone());
        dispatcher.join(&group(2), id, tx);

        assert_eq!(dispatcher.member_count(&group(1)), 0);
        assert_eq!(dispatcher.member_count(&group(2)), 1);
        assert_eq!(dispatcher.group_of(id), Some(group(2)));
    }

    #[tokio::test]
    async fn test_stale_member_does_not_block_others() {
        let dispatcher = Dispatcher::new();
        let (tx_closed, rx_closed) = mpsc::channel(8);
        let (tx_full, _rx_full) = mpsc::channel(1);
        let (tx_ok, mut rx_ok) = mpsc::channel(8);
        drop(rx_closed);
        tx_full.try_send(push(0)).unwrap();

        dispatcher.join(&group(1), ConnectionId::generate(), tx_closed);
        dispatcher.join(&group(1), ConnectionId::generate(), tx_full);
        dispatcher.join(&group(1), ConnectionId::generate(), tx_ok);

        let report = dispatcher.publish(&group(1), &push(1));
        assert_eq!(report, DeliveryReport { delivered: 1, dropped: 2 });
        assert_eq!(rx_ok.recv().await, Some(push(1)));
    }

    #[tokio::test]
    async fn test_publish_order_within_group() {
        let dispatcher = Dispatcher::new();
        let (tx, mut rx) = mpsc::channel(8);
        dispatcher.join(&group(1), ConnectionId::generate(), tx);

        for n in 1..=3 {
            dispatcher.publish(&group(1), &push(n));
        }
        for n in 1..=3 {
            assert_eq!(rx.recv().await, Some(push(n)));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_enqueue_after_leave_returns() {
        let dispatcher = Arc::new(Dispatcher::new());
        let id = ConnectionId::generate();
        let (tx, mut rx) = mpsc::channel(10_000);
        dispatcher.join(&group(1), id, tx);

        let publisher = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                for n in 0..2_000 {
                    dispatcher.publish(&group(1), &push(n));
                    tokio::task::yield_now().await;
                }
            })
        };

        tokio::task::yield_now().await;
        dispatcher.leave(&group(1), id);
        let mut seen_at_leave = 0;
        while rx.try_recv().is_ok() {
            seen_at_leave += 1;
        }

        publisher.await.unwrap();
        assert!(rx.try_recv().is_err(), "received after leave ({seen_at_leave} before)");
    }

    #[tokio::test]
    async fn test_clear_closes_member_queues() {
        let dispatcher = Dispatcher::new();
        let (tx, mut rx) = mpsc::channel(8);
        dispatcher.join(&group(1), ConnectionId::generate(), tx);

        dispatcher.clear();
        assert_eq!(dispatcher.group_count(), 0);
        assert_eq!(rx.recv().await, None);
    }
}
