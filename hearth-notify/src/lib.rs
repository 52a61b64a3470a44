//! # Hearth Notify
//!
//! The notification fan-out core:
//!
//! - [`store`] - Durable notification records (memory and `SQLite` backends)
//! - [`events`] - Typed domain events and their message templates
//! - [`dispatch`] - Per-recipient group messaging for live pushes
//! - [`connection`] - Connection lifecycle: authenticate, join, push, leave
//! - [`service`] - Trigger entry point tying the store and dispatcher together
//!
//! Nothing here is global. The store and dispatcher are built once at
//! process start and handed to the service and the connection manager.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod connection;
pub mod dispatch;
pub mod events;
pub mod service;
pub mod store;

pub use config::NotifyConfig;
pub use connection::{
    Connection, ConnectionManager, ConnectionPhase, ConnectError, Identity, LiveConnection,
};
pub use dispatch::{ConnectionId, DeliveryReport, Dispatcher, GroupName, Push, group_for};
pub use events::{DomainEvent, InquiryRecord, ListingChange, ListingRecord};
pub use service::{NotificationService, NotifyError};
pub use store::{NotificationStore, StoreBackend, StoreConfig, connect_store};
