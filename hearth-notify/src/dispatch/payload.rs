//! Payloads carried to live connections.

use hearth_core::types::{Notification, NotificationId};
use serde::{Deserialize, Serialize};

/// A message queued for a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Push {
    /// Sent once when a connection opens.
    InitialCount {
        /// Unread notifications at the moment of opening
        unread_count: u64,
    },
    /// Sent for every notification created while the connection is open.
    NewNotification {
        /// Notification ID
        id: NotificationId,
        /// Message text
        message: String,
        /// Link, `#` when the notification has none
        link: String,
        /// Unread notifications right after this one was stored
        unread_count: u64,
    },
}

impl Push {
    /// Builds the push for a freshly stored notification.
    #[must_use]
    pub fn new_notification(notification: &Notification, unread_count: u64) -> Self {
        Self::NewNotification {
            id: notification.id(),
            message: notification.message().to_string(),
            link: notification.link_or_placeholder().to_string(),
            unread_count,
        }
    }

    /// Returns the unread count carried by any push.
    #[must_use]
    pub const fn unread_count(&self) -> u64 {
        match self {
            Self::InitialCount { unread_count } | Self::NewNotification { unread_count, .. } => {
                *unread_count
            }
        }
    }
}

/// Outcome of a publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Members whose queue accepted the payload
    pub delivered: usize,
    /// Members whose queue was full or already closed
    pub dropped: usize,
}

impl DeliveryReport {
    /// Total members addressed.
    #[must_use]
    pub const fn attempted(&self) -> usize {
        self.delivered + self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hearth_core::types::{NewNotification, UserId};

    #[test]
    fn test_new_notification_uses_placeholder_link() {
        let n = Notification::new(
            NotificationId::new_unchecked(9),
            NewNotification::new(UserId::new_unchecked(1), "hello"),
            Utc::now(),
        );
        let push = Push::new_notification(&n, 3);
        assert_eq!(
            push,
            Push::NewNotification {
                id: NotificationId::new_unchecked(9),
                message: "hello".to_string(),
                link: "#".to_string(),
                unread_count: 3,
            }
        );
        assert_eq!(push.unread_count(), 3);
    }

    #[test]
    fn test_push_serialization_tag() {
        let json = serde_json::to_value(Push::InitialCount { unread_count: 2 }).unwrap();
        assert_eq!(json["event"], "initial_count");
        assert_eq!(json["unread_count"], 2);
    }
}
