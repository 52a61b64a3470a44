//! Storage-related error types.

use thiserror::Error;

/// Errors raised by notification store backends.
///
/// # Examples
///
/// ```
/// use hearth_core::error::StorageError;
///
/// let error = StorageError::Query {
///     operation: "mark_all_read".to_string(),
///     reason: "database is locked".to_string(),
/// };
/// assert!(error.to_string().contains("mark_all_read"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend could not be reached or opened.
    #[error("[Storage] Connection failed for '{url}': {reason}")]
    Connection {
        /// Connection URL (credentials stripped by the caller)
        url: String,
        /// Reason for the failure
        reason: String,
    },

    /// Schema creation or migration failed.
    #[error("[Storage] Migration failed: {reason}")]
    Migration {
        /// Reason for the failure
        reason: String,
    },

    /// A query failed.
    #[error("[Storage] Query error during {operation}: {reason}")]
    Query {
        /// Store operation that failed
        operation: String,
        /// Reason for the failure
        reason: String,
    },

    /// A persisted row could not be decoded.
    #[error("[Storage] Corrupt row: {reason}")]
    CorruptRow {
        /// Reason for the failure
        reason: String,
    },

    /// The backend is temporarily unavailable.
    #[error("[Storage] Unavailable: {reason}")]
    Unavailable {
        /// Reason for the failure
        reason: String,
    },
}

impl StorageError {
    /// Creates a query error.
    #[must_use]
    pub fn query(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Query {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if retrying the operation may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Query { .. } | Self::Unavailable { .. })
    }
}
