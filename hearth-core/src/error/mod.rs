//! Error types shared across the Hearth workspace.
//!
//! # Error Hierarchy
//!
//! - `HearthError` - Top-level error type
//!   - `StorageError` - Notification store failures
//!   - `ConfigError` - Configuration loading and validation failures
//!   - `ValidationError` - Invalid identifiers or enum values

use thiserror::Error;

mod config;
mod storage;

pub use config::ConfigError;
pub use storage::StorageError;

use crate::types::ValidationError;

/// Top-level error type for the Hearth notification service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HearthError {
    /// Storage error.
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Validation error.
    #[error("[Validation] {0}")]
    Validation(#[from] ValidationError),
}

impl HearthError {
    /// Returns the error category as a string.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Validation(_) => "validation",
        }
    }

    /// Returns true if retrying the operation may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_recoverable(),
            Self::Config(_) | Self::Validation(_) => false,
        }
    }
}

/// Result type alias using [`HearthError`].
pub type Result<T> = std::result::Result<T, HearthError>;
