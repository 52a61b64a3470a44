//! The durable notification record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NotificationId, NotificationKind, UserId};

/// Link rendered for notifications that carry none.
pub const LINK_PLACEHOLDER: &str = "#";

/// Display format for `created_at` on the read API.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A notification addressed to a single recipient.
///
/// Everything except the read flag is fixed at creation. The read flag only
/// ever moves from unread to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    id: NotificationId,
    recipient: UserId,
    message: String,
    link: Option<String>,
    kind: NotificationKind,
    is_read: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Notification {
    /// Builds a fresh, unread notification from creation input.
    #[must_use]
    pub fn new(id: NotificationId, input: NewNotification, now: DateTime<Utc>) -> Self {
        Self {
            id,
            recipient: input.recipient,
            message: input.message,
            link: input.link,
            kind: input.kind,
            is_read: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a notification from persisted columns.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: NotificationId,
        recipient: UserId,
        message: String,
        link: Option<String>,
        kind: NotificationKind,
        is_read: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            recipient,
            message,
            link,
            kind,
            is_read,
            created_at,
            updated_at,
        }
    }

    /// Returns the notification ID.
    #[must_use]
    pub const fn id(&self) -> NotificationId {
        self.id
    }

    /// Returns the recipient.
    #[must_use]
    pub const fn recipient(&self) -> UserId {
        self.recipient
    }

    /// Returns the message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the link, if any.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    /// Returns the link, or [`LINK_PLACEHOLDER`] when there is none.
    #[must_use]
    pub fn link_or_placeholder(&self) -> &str {
        self.link.as_deref().unwrap_or(LINK_PLACEHOLDER)
    }

    /// Returns the notification kind.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        self.kind
    }

    /// Returns true if the recipient has read the notification.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.is_read
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `created_at` formatted as `YYYY-MM-DD HH:MM`.
    #[must_use]
    pub fn created_at_display(&self) -> String {
        self.created_at.format(CREATED_AT_FORMAT).to_string()
    }

    /// Marks the notification as read.
    ///
    /// Returns `true` if the flag changed. Already-read notifications are left
    /// untouched, including their `updated_at`.
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.updated_at = now;
        true
    }
}

/// Input for creating a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    /// Recipient of the notification
    pub recipient: UserId,
    /// Human-readable text
    pub message: String,
    /// Optional link to the page the notification is about
    #[serde(default)]
    pub link: Option<String>,
    /// Classification
    #[serde(default)]
    pub kind: NotificationKind,
}

impl NewNotification {
    /// Creates an `info` notification without a link.
    #[must_use]
    pub fn new(recipient: UserId, message: impl Into<String>) -> Self {
        Self {
            recipient,
            message: message.into(),
            link: None,
            kind: NotificationKind::default(),
        }
    }

    /// Sets the link.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Sets the kind.
    #[must_use]
    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = kind;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(now: DateTime<Utc>) -> Notification {
        Notification::new(
            NotificationId::new_unchecked(1),
            NewNotification::new(UserId::new_unchecked(3), "hello"),
            now,
        )
    }

    #[test]
    fn test_new_notification_is_unread() {
        let now = Utc::now();
        let n = sample(now);
        assert!(!n.is_read());
        assert_eq!(n.kind(), NotificationKind::Info);
        assert_eq!(n.created_at(), now);
        assert_eq!(n.updated_at(), now);
        assert_eq!(n.recipient(), UserId::new_unchecked(3));
    }

    #[test]
    fn test_mark_read_only_once() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let much_later = Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap();
        let mut n = sample(created);

        assert!(n.mark_read(later));
        assert!(n.is_read());
        assert_eq!(n.updated_at(), later);

        assert!(!n.mark_read(much_later));
        assert_eq!(n.updated_at(), later);
    }

    #[test]
    fn test_link_placeholder() {
        let now = Utc::now();
        let n = sample(now);
        assert_eq!(n.link(), None);
        assert_eq!(n.link_or_placeholder(), "#");

        let linked = Notification::new(
            NotificationId::new_unchecked(2),
            NewNotification::new(UserId::new_unchecked(3), "hi").with_link("/inquiries/user/"),
            now,
        );
        assert_eq!(linked.link_or_placeholder(), "/inquiries/user/");
    }

    #[test]
    fn test_created_at_display() {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 8, 5, 59).unwrap();
        assert_eq!(sample(created).created_at_display(), "2024-01-15 08:05");
    }
}
