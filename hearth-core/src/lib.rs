//! # Hearth Core
//!
//! Core types and shared infrastructure for the Hearth notification service.
//!
//! This crate provides:
//! - `NewType` identifiers for users and notifications
//! - The [`Notification`](types::Notification) record and its [`NotificationKind`](types::NotificationKind)
//! - Error types shared by the storage and configuration layers
//! - Configuration loading with YAML/TOML/JSON support and validation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

/// Identifier newtypes and the notification record
pub mod types;

/// Error types and handling
pub mod error;

/// Configuration management
pub mod config;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConfigFormat, ConfigLoader, Validatable};
    pub use crate::error::{ConfigError, HearthError, StorageError};
    pub use crate::types::*;
}
