//! Live connection lifecycle.
//!
//! Transport-agnostic: the WebSocket layer owns the socket and drives a
//! [`LiveConnection`] obtained from [`ConnectionManager::connect`].
//!
//! ```text
//! Connecting --(identity)--> Open --(close / drop)--> Closed
//!      \--------(no identity)-----------------------> Closed
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hearth_core::error::StorageError;
use hearth_core::types::UserId;
use hearth_telemetry::metrics::HearthMetrics;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dispatch::{ConnectionId, Dispatcher, GroupName, Push};
use crate::store::NotificationStore;

/// An authenticated user as resolved by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User ID
    pub user_id: UserId,
    /// Username, used in log lines
    pub username: String,
}

impl Identity {
    /// Creates an identity.
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

/// Lifecycle phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPhase {
    /// Handshake in progress, not yet a group member
    Connecting,
    /// Authenticated and joined to its group
    Open,
    /// Terminal
    Closed,
}

/// Fixed per-connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Connection ID
    pub id: ConnectionId,
    /// Authenticated user, once known
    pub user_id: Option<UserId>,
    /// Joined group, once open
    pub group: Option<GroupName>,
    /// Current phase
    pub phase: ConnectionPhase,
}

impl Connection {
    fn connecting() -> Self {
        Self {
            id: ConnectionId::generate(),
            user_id: None,
            group: None,
            phase: ConnectionPhase::Connecting,
        }
    }
}

/// Reasons a connection cannot be opened.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectError {
    /// The session carries no authenticated user.
    #[error("connection rejected: not authenticated")]
    Unauthenticated,

    /// The initial unread count could not be read.
    #[error("connection aborted: {0}")]
    Storage(#[from] StorageError),
}

/// Opens live connections and tracks how many are open.
#[derive(Clone)]
pub struct ConnectionManager {
    store: Arc<dyn NotificationStore>,
    dispatcher: Arc<Dispatcher>,
    queue_size: usize,
    active: Arc<AtomicUsize>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("queue_size", &self.queue_size)
            .field("active", &self.active_connections())
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Creates a manager; each connection gets a push queue of `queue_size`.
    #[must_use]
    pub fn new(
        store: Arc<dyn NotificationStore>,
        dispatcher: Arc<Dispatcher>,
        queue_size: usize,
    ) -> Self {
        Self {
            store,
            dispatcher,
            queue_size: queue_size.max(1),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Runs the handshake for a new connection.
    ///
    /// Without an identity the connection goes straight to `Closed` and never
    /// touches the dispatcher. Otherwise it joins its group, reads the unread
    /// count and is returned `Open`. The initial count is always the first
    /// push yielded, ahead of anything published while the count was read.
    pub async fn connect(
        &self,
        identity: Option<&Identity>,
    ) -> Result<LiveConnection, ConnectError> {
        let mut state = Connection::connecting();

        let Some(identity) = identity else {
            state.phase = ConnectionPhase::Closed;
            HearthMetrics::ws_rejected();
            info!(conn_id = %state.id, "Rejected unauthenticated connection");
            return Err(ConnectError::Unauthenticated);
        };

        let group = Dispatcher::group_for(identity.user_id);
        let (sender, receiver) = mpsc::channel(self.queue_size);
        self.dispatcher.join(&group, state.id, sender);

        state.user_id = Some(identity.user_id);
        state.group = Some(group.clone());
        state.phase = ConnectionPhase::Open;
        self.active.fetch_add(1, Ordering::Relaxed);
        HearthMetrics::ws_connection_opened();

        // From here on dropping `live` undoes the join
        let mut live = LiveConnection {
            user_id: identity.user_id,
            group,
            state,
            initial: None,
            receiver,
            dispatcher: self.dispatcher.clone(),
            active: self.active.clone(),
        };

        // Counted after the join, so nothing stored from here on is missed
        let unread_count = self.store.count_unread(identity.user_id).await?;
        live.initial = Some(Push::InitialCount { unread_count });

        info!(
            conn_id = %live.id(),
            user = %identity.username,
            group = %live.group(),
            unread_count,
            "Connection open"
        );
        Ok(live)
    }

    /// Number of connections currently open.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Returns the dispatcher connections join.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

/// An open connection and its push queue.
///
/// Closing (explicitly or by drop) leaves the group before returning, and
/// nothing is yielded from the queue afterwards.
#[derive(Debug)]
pub struct LiveConnection {
    user_id: UserId,
    group: GroupName,
    state: Connection,
    initial: Option<Push>,
    receiver: mpsc::Receiver<Push>,
    dispatcher: Arc<Dispatcher>,
    active: Arc<AtomicUsize>,
}

impl LiveConnection {
    /// Connection ID.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.state.id
    }

    /// Snapshot of the connection state.
    #[must_use]
    pub fn state(&self) -> &Connection {
        &self.state
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ConnectionPhase {
        self.state.phase
    }

    /// Authenticated user.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Group the connection joined.
    #[must_use]
    pub fn group(&self) -> &GroupName {
        &self.group
    }

    /// Waits for the next push. Returns `None` once the connection is closed
    /// or the dispatcher has dropped it.
    pub async fn recv(&mut self) -> Option<Push> {
        if self.state.phase == ConnectionPhase::Closed {
            return None;
        }
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }
        let push = self.receiver.recv().await?;
        (self.state.phase != ConnectionPhase::Closed).then_some(push)
    }

    /// Accepts an inbound client message. The protocol defines none, so it
    /// is only logged.
    pub fn handle_inbound(&self, text: &str) {
        debug!(conn_id = %self.state.id, len = text.len(), "Ignoring client message");
    }

    /// Closes the connection. Returns `true` if this call performed the
    /// transition; later calls are no-ops.
    pub fn close(&mut self) -> bool {
        if self.state.phase == ConnectionPhase::Closed {
            return false;
        }
        self.dispatcher.leave(&self.group, self.state.id);
        self.receiver.close();
        self.initial = None;
        self.state.phase = ConnectionPhase::Closed;
        self.active.fetch_sub(1, Ordering::Relaxed);
        HearthMetrics::ws_connection_closed();
        info!(conn_id = %self.state.id, "Connection closed");
        true
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        self.close();
    }
}
