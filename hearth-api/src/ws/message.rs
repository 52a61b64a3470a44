//! Frames sent to WebSocket clients.

use hearth_core::types::NotificationId;
use hearth_notify::Push;
use serde::{Deserialize, Serialize};

/// Server-to-client message types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Unread count at the moment the socket opened
    InitialCount {
        /// Unread notifications
        notification_count: u64,
    },
    /// A notification created while the socket is open
    NewNotification {
        /// Message text
        message: String,
        /// Link, `#` when the notification has none
        link: String,
        /// Notification ID
        id: NotificationId,
        /// Unread notifications including this one
        notification_count: u64,
    },
}

impl From<Push> for ServerMessage {
    fn from(push: Push) -> Self {
        match push {
            Push::InitialCount { unread_count } => Self::InitialCount {
                notification_count: unread_count,
            },
            Push::NewNotification {
                id,
                message,
                link,
                unread_count,
            } => Self::NewNotification {
                message,
                link,
                id,
                notification_count: unread_count,
            },
        }
    }
}
