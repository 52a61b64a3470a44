//! Domain events that produce notifications.
//!
//! Event sources call in explicitly with a typed [`DomainEvent`]; nothing is
//! hooked onto generic record saves. Each variant has one message template,
//! chosen by an exhaustive match.

use hearth_core::types::{NewNotification, NotificationKind, UserId};

/// Owner's inquiry inbox.
pub const REALTOR_INQUIRIES_LINK: &str = "/inquiries/realtor/";

/// Inquirer's list of sent inquiries.
pub const USER_INQUIRIES_LINK: &str = "/inquiries/user/";

/// A business occurrence that notifies someone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// A user sent an inquiry about a listing. Notifies the listing owner.
    InquiryCreated {
        /// Listing owner
        owner: UserId,
        /// Username of the inquirer
        inquirer_name: String,
        /// Listing title
        listing_title: String,
    },
    /// The owner replied to an inquiry. Notifies the inquirer.
    InquiryReplied {
        /// Original inquirer
        inquirer: UserId,
        /// Username of the listing owner
        owner_name: String,
        /// Listing title
        listing_title: String,
    },
    /// A new listing went live. Notifies its owner.
    ListingPublished {
        /// Listing owner
        owner: UserId,
        /// Listing title
        title: String,
        /// Canonical page of the listing
        url: String,
    },
}

impl DomainEvent {
    /// Short event name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InquiryCreated { .. } => "inquiry_created",
            Self::InquiryReplied { .. } => "inquiry_replied",
            Self::ListingPublished { .. } => "listing_published",
        }
    }

    /// The user this event notifies.
    #[must_use]
    pub const fn recipient(&self) -> UserId {
        match self {
            Self::InquiryCreated { owner, .. } | Self::ListingPublished { owner, .. } => *owner,
            Self::InquiryReplied { inquirer, .. } => *inquirer,
        }
    }

    /// Renders the notification this event produces.
    #[must_use]
    pub fn render(&self) -> NewNotification {
        match self {
            Self::InquiryCreated {
                owner,
                inquirer_name,
                listing_title,
            } => NewNotification::new(
                *owner,
                format!("{inquirer_name} sent an inquiry about '{listing_title}'"),
            )
            .with_link(REALTOR_INQUIRIES_LINK),
            Self::InquiryReplied {
                inquirer,
                owner_name,
                listing_title,
            } => NewNotification::new(
                *inquirer,
                format!("{owner_name} replied to your inquiry about '{listing_title}'"),
            )
            .with_link(USER_INQUIRIES_LINK),
            Self::ListingPublished { owner, title, url } => NewNotification::new(
                *owner,
                format!("Your listing '{title}' was published successfully"),
            )
            .with_link(url.clone())
            .with_kind(NotificationKind::Success),
        }
    }
}

/// The fields of a listing that notifications need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    /// Listing owner
    pub owner: UserId,
    /// Username of the owner
    pub owner_name: String,
    /// Listing title
    pub title: String,
    /// URL slug
    pub slug: String,
}

/// Whether a listing write created the record or modified an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingChange {
    /// First save of the listing
    Created,
    /// Any later save
    Updated,
}

impl ListingRecord {
    /// Canonical page of the listing.
    #[must_use]
    pub fn canonical_url(&self) -> String {
        format!("/properties/{}/", self.slug)
    }

    /// Event for a listing write. Only creation publishes.
    #[must_use]
    pub fn published_event(&self, change: ListingChange) -> Option<DomainEvent> {
        match change {
            ListingChange::Created => Some(DomainEvent::ListingPublished {
                owner: self.owner,
                title: self.title.clone(),
                url: self.canonical_url(),
            }),
            ListingChange::Updated => None,
        }
    }
}

/// The fields of an inquiry that notifications need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InquiryRecord {
    /// Inquiry ID
    pub id: i64,
    /// Listing the inquiry is about
    pub listing: ListingRecord,
    /// User who sent the inquiry
    pub inquirer: UserId,
    /// Username of the inquirer
    pub inquirer_name: String,
    /// Owner's reply, if any
    pub reply: Option<String>,
}

impl InquiryRecord {
    /// True once the owner has written a non-blank reply.
    #[must_use]
    pub fn has_reply(&self) -> bool {
        self.reply.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    /// Event for a newly created inquiry.
    ///
    /// Owners inquiring about their own listing are not notified.
    #[must_use]
    pub fn created_event(&self) -> Option<DomainEvent> {
        if self.inquirer == self.listing.owner {
            return None;
        }
        Some(DomainEvent::InquiryCreated {
            owner: self.listing.owner,
            inquirer_name: self.inquirer_name.clone(),
            listing_title: self.listing.title.clone(),
        })
    }

    /// Event for an inquiry update, comparing the stored record with the
    /// record about to be written.
    ///
    /// Fires only when the inquiry goes from having no reply to having one;
    /// edits of an existing reply and unrelated saves yield nothing.
    #[must_use]
    pub fn reply_transition(before: &Self, after: &Self) -> Option<DomainEvent> {
        if before.has_reply() || !after.has_reply() {
            return None;
        }
        Some(DomainEvent::InquiryReplied {
            inquirer: after.inquirer,
            owner_name: after.listing.owner_name.clone(),
            listing_title: after.listing.title.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> ListingRecord {
        ListingRecord {
            owner: UserId::new_unchecked(1),
            owner_name: "alice".to_string(),
            title: "Sunny Flat".to_string(),
            slug: "sunny-flat".to_string(),
        }
    }

    fn inquiry(reply: Option<&str>) -> InquiryRecord {
        InquiryRecord {
            id: 10,
            listing: listing(),
            inquirer: UserId::new_unchecked(2),
            inquirer_name: "bob".to_string(),
            reply: reply.map(str::to_string),
        }
    }

    #[test]
    fn test_inquiry_created_renders_for_owner() {
        let event = inquiry(None).created_event().unwrap();
        assert_eq!(event.recipient(), UserId::new_unchecked(1));

        let rendered = event.render();
        assert_eq!(rendered.recipient, UserId::new_unchecked(1));
        assert_eq!(rendered.message, "bob sent an inquiry about 'Sunny Flat'");
        assert_eq!(rendered.link.as_deref(), Some(REALTOR_INQUIRIES_LINK));
        assert_eq!(rendered.kind, NotificationKind::Info);
    }

    #[test]
    fn test_self_inquiry_produces_nothing() {
        let mut record = inquiry(None);
        record.inquirer = record.listing.owner;
        assert_eq!(record.created_event(), None);
    }

    #[test]
    fn test_reply_transition_fires_once() {
        let unreplied = inquiry(None);
        let replied = inquiry(Some("Viewing on Monday works."));

        let event = InquiryRecord::reply_transition(&unreplied, &replied).unwrap();
        assert_eq!(event.recipient(), UserId::new_unchecked(2));
        let rendered = event.render();
        assert_eq!(
            rendered.message,
            "alice replied to your inquiry about 'Sunny Flat'"
        );
        assert_eq!(rendered.link.as_deref(), Some(USER_INQUIRIES_LINK));

        // Later saves of an already-replied inquiry
        let edited = inquiry(Some("Viewing on Tuesday works."));
        assert_eq!(InquiryRecord::reply_transition(&replied, &edited), None);
        assert_eq!(InquiryRecord::reply_transition(&replied, &replied), None);
    }

    #[test]
    fn test_blank_reply_is_not_a_reply() {
        let blank = inquiry(Some("   "));
        assert!(!blank.has_reply());
        assert_eq!(InquiryRecord::reply_transition(&inquiry(None), &blank), None);
        assert_eq!(InquiryRecord::reply_transition(&inquiry(None), &inquiry(None)), None);
    }

    #[test]
    fn test_listing_published_only_on_create() {
        let record = listing();
        assert_eq!(record.published_event(ListingChange::Updated), None);

        let rendered = record
            .published_event(ListingChange::Created)
            .unwrap()
            .render();
        assert_eq!(
            rendered.message,
            "Your listing 'Sunny Flat' was published successfully"
        );
        assert_eq!(rendered.link.as_deref(), Some("/properties/sunny-flat/"));
        assert_eq!(rendered.kind, NotificationKind::Success);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(inquiry(None).created_event().unwrap().name(), "inquiry_created");
    }
}
