//! # Hearth Server
//!
//! Process assembly for the Hearth notification service.
//!
//! This crate provides:
//! - Configuration loading with `HEARTH_*` environment overrides
//! - Telemetry (logging and metrics) initialization
//! - Store, dispatcher and API wiring
//! - Graceful shutdown on SIGINT/SIGTERM
//!
//! # Embedding
//!
//! Notifications are triggered by the listing application's own write paths,
//! so the server is meant to run inside that process. Build a
//! [`HearthServer`], call [`initialize`](HearthServer::initialize), hand the
//! [`NotificationService`](hearth_notify::NotificationService) from
//! [`notifications`](HearthServer::notifications) to the code that creates
//! inquiries and listings, then [`run`](HearthServer::run) it. The
//! `hearth-server` binary runs the same assembly with no event source
//! attached; it serves history and live channels for notifications written by
//! an embedding process into the shared `SQLite` database, but its own live
//! pushes only fire for events raised in-process.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use server::{HearthServer, ServerError, ServerState};
pub use shutdown::ShutdownController;
