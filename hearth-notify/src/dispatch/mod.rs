//! Group messaging for live pushes.
//!
//! Every recipient has one group, `user_<id>`. Each open connection of that
//! recipient joins the group with its own bounded queue; publishing enqueues
//! the payload on every member queue without waiting.

mod dispatcher;
mod group;
mod payload;

pub use dispatcher::Dispatcher;
pub use group::{ConnectionId, GroupName, group_for};
pub use payload::{DeliveryReport, Push};
