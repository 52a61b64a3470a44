//! API configuration types.
//!
//! This module provides configuration for the API server including:
//! - Server binding address and port
//! - Session token and CSRF settings
//! - CORS settings
//! - WebSocket settings

use hearth_core::config::Validatable;
use hearth_core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ws::WsConfig;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Session token configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// WebSocket configuration
    #[serde(default)]
    pub websocket: WsConfig,

    /// Enable request logging
    #[serde(default = "default_true")]
    pub enable_request_logging: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session: SessionConfig::default(),
            cors: CorsConfig::default(),
            websocket: WsConfig::default(),
            enable_request_logging: true,
        }
    }
}

impl ApiConfig {
    /// Returns the server bind address.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Validatable for ApiConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::missing_field_in_section("host", "api"));
        }
        self.session.validate()?;
        self.websocket.validate()
    }
}

/// Session token and CSRF configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret for signing session tokens
    #[serde(default = "default_secret")]
    pub secret: String,

    /// Token lifetime in seconds
    #[serde(default = "default_token_expiration")]
    pub expiration_secs: u64,

    /// Issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Audience claim
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Cookie carrying the session token
    #[serde(default = "default_session_cookie")]
    pub cookie_name: String,

    /// Cookie carrying the CSRF token
    #[serde(default = "default_csrf_cookie")]
    pub csrf_cookie_name: String,

    /// Header that must echo the CSRF cookie on state-changing requests
    #[serde(default = "default_csrf_header")]
    pub csrf_header_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            expiration_secs: default_token_expiration(),
            issuer: default_issuer(),
            audience: default_audience(),
            cookie_name: default_session_cookie(),
            csrf_cookie_name: default_csrf_cookie(),
            csrf_header_name: default_csrf_header(),
        }
    }
}

impl SessionConfig {
    /// Returns the token lifetime.
    #[must_use]
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }
}

impl Validatable for SessionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::missing_field_in_section("secret", "api.session"));
        }
        if self.expiration_secs == 0 {
            return Err(ConfigError::invalid_value(
                "api.session.expiration_secs",
                "Token lifetime must be positive",
            ));
        }
        if self.csrf_header_name.parse::<axum::http::HeaderName>().is_err() {
            return Err(ConfigError::invalid_value(
                "api.session.csrf_header_name",
                "Not a valid HTTP header name",
            ));
        }
        Ok(())
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Enable CORS
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Allowed origins (empty means all origins)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Allow credentials
    #[serde(default)]
    pub allow_credentials: bool,

    /// Max age for preflight cache in seconds
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec![],
            allow_credentials: false,
            max_age_secs: default_max_age(),
        }
    }
}

// Default value functions

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_secret() -> String {
    // Overridden by HEARTH_SESSION_SECRET in real deployments
    "change-me-in-production".to_string()
}

fn default_token_expiration() -> u64 {
    14 * 24 * 3600 // two weeks
}

fn default_issuer() -> String {
    "hearth".to_string()
}

fn default_audience() -> String {
    "hearth-web".to_string()
}

fn default_session_cookie() -> String {
    "sessionid".to_string()
}

fn default_csrf_cookie() -> String {
    "csrftoken".to_string()
}

fn default_csrf_header() -> String {
    "X-CSRFToken".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_age() -> u64 {
    3600
}
