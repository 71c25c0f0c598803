//! Registry core: channel tables and configuration.
//!
//! Internal modules:
//! - [`config`]: registry settings ([`RegistryConfig`], [`FanOut`]);
//! - [`registry`]: the channel tables and the subscribe/unsubscribe primitive.

mod config;
mod registry;

pub use config::{FanOut, RegistryConfig};
pub(crate) use registry::Delivery;
pub use registry::Registry;
