//! # Hearth API
//!
//! HTTP and WebSocket surface of the notification service:
//!
//! - `GET /notifications/api/` - recent notifications and unread count
//! - `POST /notifications/mark-as-read/` - mark everything read
//! - `POST /notifications/{id}/read/` - mark one notification read
//! - `GET /ws/notifications/` - live push channel
//! - `GET /health`, `GET /metrics`
//!
//! Identity comes from a signed session token (JWT) supplied as a bearer
//! header, a `sessionid` cookie, or, for the WebSocket, a `token` query
//! parameter. State-changing requests also need a matching CSRF token.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;
pub mod ws;

pub use auth::{Claims, SessionVerifier};
pub use config::{ApiConfig, CorsConfig, SessionConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::ApiServer;
pub use state::AppState;
pub use ws::WsConfig;
