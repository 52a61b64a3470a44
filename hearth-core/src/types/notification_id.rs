//! Notification ID type.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Store-assigned notification identifier.
///
/// Identifiers are positive and increase monotonically within one store, so
/// they double as a tie-breaker when two notifications share a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(i64);

impl NotificationId {
    /// Creates a new `NotificationId`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidNotificationId` if the value is not positive.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::InvalidNotificationId(value));
        }
        Ok(Self(value))
    }

    /// Creates a new `NotificationId` without validation.
    #[must_use]
    pub const fn new_unchecked(value: i64) -> Self {
        Self(value)
    }

    /// Returns the inner value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
