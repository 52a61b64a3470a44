//! WebSocket transport for live notifications.
//!
//! Browsers open `ws://host/ws/notifications/` with their session cookie (or
//! `?token=<jwt>`). Once open the server sends:
//!
//! ```json
//! {"type": "initial_count", "notification_count": 3}
//! {"type": "new_notification", "message": "...", "link": "/inquiries/realtor/", "id": 41, "notification_count": 4}
//! ```
//!
//! Client frames are accepted and ignored. Unauthenticated sockets are closed
//! right after the upgrade with code `4401`.

pub mod config;
pub mod handler;
pub mod message;

pub use config::WsConfig;
pub use handler::{CLOSE_UNAUTHORIZED, ws_handler};
pub use message::ServerMessage;
