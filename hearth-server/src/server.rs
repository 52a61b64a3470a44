//! Main server implementation.
//!
//! Builds the store, dispatcher and service once, hands them to the API, and
//! tears them down in reverse on shutdown.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use hearth_api::{ApiServer, AppState};
use hearth_core::config::ConfigLoader;
use hearth_notify::{Dispatcher, NotificationService, connect_store};
use hearth_telemetry::logging::{LoggingError, init_logging};
use hearth_telemetry::metrics::init_metrics;

use crate::config::ServerConfig;
use crate::shutdown::{ShutdownController, setup_signal_handlers};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "HEARTH";

/// Lifecycle of the server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Not initialized, or fully shut down
    Stopped,
    /// Components built, not yet serving
    Starting,
    /// Serving requests
    Running,
    /// Draining connections
    ShuttingDown,
}

/// The assembled notification server.
pub struct HearthServer {
    config: ServerConfig,
    state: Arc<RwLock<ServerState>>,
    shutdown: ShutdownController,
    app: Option<Arc<AppState>>,
    _log_guards: Vec<WorkerGuard>,
}

impl HearthServer {
    /// Creates a server; nothing is started until [`initialize`](Self::initialize).
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(ServerState::Stopped)),
            shutdown: ShutdownController::new(),
            app: None,
            _log_guards: Vec::new(),
        }
    }

    /// Loads a configuration file and applies `HEARTH_*` overrides.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServerConfig, ServerError> {
        ConfigLoader::new()
            .with_env_prefix(ENV_PREFIX)
            .load_file(path)
            .map_err(|e| ServerError::ConfigError(e.to_string()))
    }

    /// Applies `HEARTH_*` overrides to the defaults, for runs without a file.
    pub fn default_config() -> Result<ServerConfig, ServerError> {
        ConfigLoader::new()
            .with_env_prefix(ENV_PREFIX)
            .finish(ServerConfig::default())
            .map_err(|e| ServerError::ConfigError(e.to_string()))
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    /// Returns the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// The trigger entry point, once initialized.
    ///
    /// Event sources in the same process call
    /// [`NotificationService::notify`] through this; it is the only way
    /// domain events reach the live channel.
    #[must_use]
    pub fn notifications(&self) -> Option<&NotificationService> {
        self.app.as_ref().map(|app| &app.service)
    }

    /// Initializes telemetry and builds every component.
    pub async fn initialize(&mut self) -> Result<(), ServerError> {
        {
            let mut state = self.state.write().await;
            if *state != ServerState::Stopped {
                return Err(ServerError::InvalidState(
                    "Server must be stopped to initialize".to_string(),
                ));
            }
            *state = ServerState::Starting;
        }

        self.init_logging()?;
        self.init_metrics();

        info!("Initializing Hearth server...");

        let store = connect_store(&self.config.store)
            .await
            .map_err(|e| ServerError::InitializationError(format!("Store: {e}")))?;
        let dispatcher = Arc::new(Dispatcher::new());
        let service = NotificationService::new(store, dispatcher);

        self.app = Some(Arc::new(AppState::new(
            self.config.api.clone(),
            self.config.notifications.clone(),
            service,
        )));

        info!(
            store = %self.config.store.backend,
            "Hearth server initialized successfully"
        );
        Ok(())
    }

    fn init_logging(&mut self) -> Result<(), ServerError> {
        match init_logging(&self.config.logging) {
            Ok(guards) => {
                self._log_guards = guards;
                info!("Logging initialized with level: {}", self.config.logging.level);
                Ok(())
            }
            // Embedding code or a test harness got there first
            Err(LoggingError::AlreadyInitialized(reason)) => {
                warn!("Logging already initialized: {}", reason);
                Ok(())
            }
            Err(e) => Err(ServerError::InitializationError(format!(
                "Failed to initialize logging: {e}"
            ))),
        }
    }

    fn init_metrics(&self) {
        if !self.config.metrics.enabled {
            info!("Metrics disabled");
            return;
        }
        if let Err(e) = init_metrics(&self.config.metrics) {
            warn!("Metrics initialization: {}", e);
        } else {
            info!("Metrics initialized");
        }
    }

    /// Serves until shutdown is initiated, then shuts down gracefully.
    pub async fn run(&self) -> Result<(), ServerError> {
        {
            let mut state = self.state.write().await;
            if *state != ServerState::Starting {
                return Err(ServerError::InvalidState(
                    "Server must be initialized before running".to_string(),
                ));
            }
            *state = ServerState::Running;
        }

        let app = self
            .app
            .clone()
            .ok_or_else(|| ServerError::InvalidState("Components not built".to_string()))?;
        let api_server = ApiServer::with_state(self.config.api.clone(), app.clone());

        let shutdown_ctrl = self.shutdown.clone();
        tokio::spawn(async move {
            setup_signal_handlers(shutdown_ctrl).await;
        });

        let shutdown = self.shutdown.clone();
        let shutdown_signal = async move {
            shutdown.wait_for_shutdown().await;
            // Dropping the senders ends every socket's push loop
            app.service.dispatcher().clear();
        };

        info!("Hearth server running on {}", self.config.api.bind_address());

        let serve = api_server.run_with_shutdown(shutdown_signal);
        tokio::pin!(serve);

        let timeout = self.config.shutdown.timeout();
        let deadline = async {
            self.shutdown.wait_for_shutdown().await;
            tokio::time::sleep(timeout).await;
        };

        let served = tokio::select! {
            result = &mut serve => result,
            () = deadline => {
                warn!("Graceful shutdown timed out after {:?}", timeout);
                Ok(())
            }
        };

        self.graceful_shutdown().await;

        served.map_err(|e| ServerError::RuntimeError(format!("API server error: {e}")))
    }

    async fn graceful_shutdown(&self) {
        *self.state.write().await = ServerState::ShuttingDown;
        info!("Performing graceful shutdown...");

        if let Some(app) = &self.app {
            app.service.dispatcher().clear();
            info!(
                remaining = app.connections.active_connections(),
                "Live connections released"
            );
        }

        *self.state.write().await = ServerState::Stopped;
        self.shutdown.mark_complete();
        info!("Graceful shutdown complete");
    }

    /// Initiates shutdown.
    pub fn shutdown(&self) {
        self.shutdown.initiate_shutdown();
    }
}

/// Server lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A component failed to start.
    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// Lifecycle method called out of order.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The server failed while running.
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::types::UserId;
    use hearth_notify::{ListingChange, ListingRecord, NotificationStore};
    use std::time::Duration;

    fn local_config() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.api.host = "127.0.0.1".to_string();
        config.api.port = 0;
        config.metrics.enabled = false;
        config
    }

    #[tokio::test]
    async fn test_server_new() {
        let server = HearthServer::new(ServerConfig::default());
        assert_eq!(server.state().await, ServerState::Stopped);
        assert!(server.notifications().is_none());
    }

    #[tokio::test]
    async fn test_run_requires_initialize() {
        let server = HearthServer::new(ServerConfig::default());
        assert!(matches!(
            server.run().await,
            Err(ServerError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_initialize_twice_rejected() {
        let mut server = HearthServer::new(local_config());
        server.initialize().await.unwrap();
        assert_eq!(server.state().await, ServerState::Starting);
        assert!(server.notifications().is_some());
        assert!(server.initialize().await.is_err());
    }

    #[tokio::test]
    async fn test_embedded_event_source_reaches_store() {
        let mut server = HearthServer::new(local_config());
        server.initialize().await.unwrap();

        let listing = ListingRecord {
            owner: UserId::new_unchecked(1),
            owner_name: "alice".to_string(),
            title: "Sunny Flat".to_string(),
            slug: "sunny-flat".to_string(),
        };
        let event = listing.published_event(ListingChange::Created).unwrap();
        let service = server.notifications().unwrap();
        let stored = service.notify(&event).await.unwrap();

        assert_eq!(stored.link(), Some("/properties/sunny-flat/"));
        assert_eq!(
            service
                .store()
                .count_unread(UserId::new_unchecked(1))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let mut server = HearthServer::new(local_config());
        server.initialize().await.unwrap();
        let controller = server.shutdown_controller().clone();

        let server = Arc::new(server);
        let runner = {
            let server = server.clone();
            tokio::spawn(async move { server.run().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        server.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(5), runner)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
        assert!(controller.wait_for_completion(Duration::from_millis(100)).await);
        assert_eq!(server.state().await, ServerState::Stopped);
    }

    #[test]
    fn test_missing_config_file() {
        assert!(matches!(
            HearthServer::load_config("/nonexistent/hearth.yaml"),
            Err(ServerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_server_error_display() {
        let err = ServerError::ConfigError("test error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }
}
