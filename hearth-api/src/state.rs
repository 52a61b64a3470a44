//! Application state for the API server.

use std::sync::Arc;
use std::time::Instant;

use hearth_notify::{ConnectionManager, NotificationService, NotificationStore, NotifyConfig};

use crate::auth::SessionVerifier;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// API configuration
    pub config: ApiConfig,
    /// Notification core settings
    pub notify: NotifyConfig,
    /// Session token verifier
    pub verifier: Arc<SessionVerifier>,
    /// Trigger entry point
    pub service: NotificationService,
    /// Live connection handshakes
    pub connections: ConnectionManager,
    started_at: Instant,
}

impl AppState {
    /// Creates application state around an assembled service.
    ///
    /// The connection manager shares the service's store and dispatcher.
    #[must_use]
    pub fn new(config: ApiConfig, notify: NotifyConfig, service: NotificationService) -> Self {
        let verifier = Arc::new(SessionVerifier::new(&config.session));
        let connections = ConnectionManager::new(
            service.store().clone(),
            service.dispatcher().clone(),
            notify.connection_queue_size,
        );

        Self {
            config,
            notify,
            verifier,
            service,
            connections,
            started_at: Instant::now(),
        }
    }

    /// Returns the session verifier.
    #[must_use]
    pub fn verifier(&self) -> &Arc<SessionVerifier> {
        &self.verifier
    }

    /// Returns the notification store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        self.service.store()
    }

    /// Seconds since the state was built.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use hearth_core::types::UserId;
    use hearth_notify::store::MemoryNotificationStore;
    use hearth_notify::{Dispatcher, Identity};

    pub(crate) fn app_state() -> Arc<AppState> {
        app_state_with(ApiConfig::default(), NotifyConfig::default())
    }

    pub(crate) fn app_state_with(api: ApiConfig, notify: NotifyConfig) -> Arc<AppState> {
        let store = Arc::new(MemoryNotificationStore::new());
        let dispatcher = Arc::new(Dispatcher::new());
        let service = NotificationService::new(store, dispatcher);
        Arc::new(AppState::new(api, notify, service))
    }

    pub(crate) fn identity(id: i64, name: &str) -> Identity {
        Identity::new(UserId::new_unchecked(id), name)
    }

    pub(crate) fn token_for(state: &AppState, id: i64, name: &str) -> String {
        state.verifier.issue_token(&identity(id, name)).unwrap()
    }
}
