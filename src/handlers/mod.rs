//! # Handler abstractions.
//!
//! - [`Handler`] - trait for struct-based async handlers
//! - [`Reply`] - pending result of a handler invocation
//! - [`IntoOutcome`] - outputs a multicast handler may settle with

mod handler;
mod outcome;

pub(crate) use handler::{erase_fn, erase_handler, erase_sync, DynHandler};
pub use handler::{Handler, Reply};
pub use outcome::IntoOutcome;
