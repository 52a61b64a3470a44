//! Identifier newtypes and the notification record.
//!
//! # Types
//!
//! - [`UserId`] - Identity of a user as supplied by the identity provider
//! - [`NotificationId`] - Store-assigned notification identifier
//! - [`NotificationKind`] - Closed classification of a notification
//! - [`Notification`] - The durable notification record
//! - [`NewNotification`] - Input for creating a notification

mod kind;
mod notification;
mod notification_id;
mod user_id;

pub use kind::NotificationKind;
pub use notification::{NewNotification, Notification};
pub use notification_id::NotificationId;
pub use user_id::UserId;

/// Validation error for `NewType` construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// User ID is zero or negative
    #[error("user ID must be positive: {0}")]
    InvalidUserId(i64),

    /// User ID could not be parsed
    #[error("malformed user ID: {0:?}")]
    MalformedUserId(String),

    /// Notification ID is zero or negative
    #[error("notification ID must be positive: {0}")]
    InvalidNotificationId(i64),

    /// Notification kind is not one of the known kinds
    #[error("unknown notification kind: {0:?}")]
    UnknownKind(String),
}
