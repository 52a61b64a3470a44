//! API middleware components.
//!
//! This module provides middleware for:
//! - Session authentication
//! - CSRF double-submit checks
//! - Request ID generation

pub mod auth;
mod csrf;
mod request_id;

pub use auth::{Auth, AuthenticatedUser, auth_middleware};
pub use csrf::csrf_middleware;
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
