//! Typed endpoints over the registry.
//!
//! - [`Sender`] - unicast: one handler, its reply goes back to the publisher
//! - [`Notifier`] - multicast: every handler, settle-all completion
//!
//! Both are bound to a channel id at construction and are cheap to clone.

mod fan_out;
mod notifier;
mod sender;

pub use notifier::{create_notifier, Notifier};
pub use sender::{create_sender, Sender};
