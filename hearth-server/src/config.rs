//! Server configuration module.
//!
//! Groups every section the process needs and applies `HEARTH_*`
//! environment overrides on top of the file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use hearth_api::ApiConfig;
use hearth_core::config::{Configurable, Validatable, env_var};
use hearth_core::error::ConfigError;
use hearth_notify::{NotifyConfig, StoreBackend, StoreConfig};
use hearth_telemetry::logging::LogConfig;
use hearth_telemetry::metrics::MetricsConfig;

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP and WebSocket surface
    #[serde(default)]
    pub api: ApiConfig,

    /// Notification store
    #[serde(default)]
    pub store: StoreConfig,

    /// Read limits and push queues
    #[serde(default)]
    pub notifications: NotifyConfig,

    /// Logging
    #[serde(default)]
    pub logging: LogConfig,

    /// Metrics
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Shutdown behaviour
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl Validatable for ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        self.store.validate()?;
        self.notifications.validate()?;

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::missing_field_in_section("level", "logging"));
        }
        if self.metrics.expose_endpoint
            && self
                .metrics
                .endpoint_address
                .parse::<std::net::SocketAddr>()
                .is_err()
        {
            return Err(ConfigError::invalid_value(
                "metrics.endpoint_address",
                "Not a socket address",
            ));
        }
        if self.shutdown.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "shutdown.timeout_secs",
                "Must be positive",
            ));
        }
        Ok(())
    }
}

impl Configurable for ServerConfig {
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        if let Some((_, host)) = env_var(prefix, "SERVER_HOST") {
            self.api.host = host;
        }
        if let Some((name, port)) = env_var(prefix, "SERVER_PORT") {
            self.api.port = port.parse().map_err(|e| ConfigError::InvalidEnvVar {
                name,
                reason: format!("{e}"),
            })?;
        }
        // A database URL only makes sense for the SQL backend
        if let Some((_, url)) = env_var(prefix, "DATABASE_URL") {
            self.store.backend = StoreBackend::Sqlite;
            self.store.database_url = url;
        }
        if let Some((_, secret)) = env_var(prefix, "SESSION_SECRET") {
            self.api.session.secret = secret;
        }
        if let Some((_, level)) = env_var(prefix, "LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some((name, secs)) = env_var(prefix, "SHUTDOWN_TIMEOUT") {
            self.shutdown.timeout_secs = secs.parse().map_err(|e| ConfigError::InvalidEnvVar {
                name,
                reason: format!("{e}"),
            })?;
        }
        Ok(())
    }

    fn env_var_names(prefix: &str) -> Vec<String> {
        [
            "SERVER_HOST",
            "SERVER_PORT",
            "DATABASE_URL",
            "SESSION_SECRET",
            "LOG_LEVEL",
            "SHUTDOWN_TIMEOUT",
        ]
        .iter()
        .map(|suffix| format!("{prefix}_{suffix}"))
        .collect()
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// Timeout for graceful shutdown in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl ShutdownConfig {
    /// Returns the shutdown timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::config::{ConfigFormat, ConfigLoader};

    const SAMPLE: &str = r#"
api:
  host: 127.0.0.1
  port: 8081
  session:
    secret: yaml-secret
store:
  backend: sqlite
  database_url: "sqlite::memory:"
notifications:
  recent_limit: 10
logging:
  level: debug
  format: pretty
shutdown:
  timeout_secs: 5
"#;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.port, 8000);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.shutdown.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_yaml() {
        let config: ServerConfig = ConfigLoader::new()
            .parse_str(SAMPLE, ConfigFormat::Yaml)
            .unwrap();
        assert_eq!(config.api.bind_address(), "127.0.0.1:8081");
        assert_eq!(config.api.session.secret, "yaml-secret");
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.notifications.recent_limit, 10);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.shutdown.timeout_secs, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: ServerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.api.port, 8000);
        assert_eq!(config.notifications.recent_limit, 20);
    }

    #[test]
    fn test_env_overrides() {
        let prefix = "HEARTH_CFGTEST_OK";
        // SAFETY: the variables use a prefix no other test reads.
        unsafe {
            std::env::set_var(format!("{prefix}_SERVER_PORT"), "9100");
            std::env::set_var(format!("{prefix}_DATABASE_URL"), "sqlite:/tmp/h.db");
            std::env::set_var(format!("{prefix}_SESSION_SECRET"), "from-env");
            std::env::set_var(format!("{prefix}_LOG_LEVEL"), "warn");
        }

        let config = ConfigLoader::new()
            .with_env_prefix(prefix)
            .finish(ServerConfig::default())
            .unwrap();
        assert_eq!(config.api.port, 9100);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.database_url, "sqlite:/tmp/h.db");
        assert_eq!(config.api.session.secret, "from-env");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_bad_env_port_rejected() {
        let prefix = "HEARTH_CFGTEST_BAD";
        // SAFETY: the variable uses a prefix no other test reads.
        unsafe {
            std::env::set_var(format!("{prefix}_SERVER_PORT"), "eighty");
        }

        let result = ConfigLoader::new()
            .with_env_prefix(prefix)
            .finish(ServerConfig::default());
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
    }

    #[test]
    fn test_invalid_sections_rejected() {
        let mut config = ServerConfig::default();
        config.notifications.recent_limit = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.shutdown.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.metrics.expose_endpoint = true;
        config.metrics.endpoint_address = "nowhere".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_var_names() {
        let names = ServerConfig::env_var_names("HEARTH");
        assert!(names.contains(&"HEARTH_SERVER_HOST".to_string()));
        assert!(names.contains(&"HEARTH_DATABASE_URL".to_string()));
    }
}
