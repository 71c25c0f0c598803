//! # Registry configuration.
//!
//! Provides [`RegistryConfig`], centralized settings for a [`Registry`](crate::Registry).
//!
//! ## Sentinel values
//! - `capacity = 0` → tables start empty and grow lazily

/// How a notifier runs its handlers during `publish`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FanOut {
    /// All handler futures are polled concurrently on the publishing task.
    #[default]
    Inline,
    /// Each handler future runs on its own `tokio::spawn`ed task.
    ///
    /// `Notifier::publish` must then be called from within a Tokio runtime.
    Spawn,
}

/// Configuration for a channel registry.
///
/// ## Field semantics
/// - `capacity`: Initial number of channel slots per table (`0` = grow lazily)
/// - `trace_failures`: Log swallowed multicast handler failures at `warn`
/// - `fan_out`: Execution strategy for multicast handlers
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over checking sentinels directly.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Initial capacity of the unicast and multicast tables.
    ///
    /// - `0` = no preallocation
    /// - `n > 0` = room for `n` channel ids in each table before resizing
    pub capacity: usize,

    /// Whether failures swallowed by `Notifier::publish` are logged.
    ///
    /// Failures are never surfaced to the publisher; this only controls the `warn!` record.
    pub trace_failures: bool,

    /// Strategy used to run multicast handlers concurrently.
    pub fan_out: FanOut,
}

impl RegistryConfig {
    /// Returns the table preallocation as an `Option`.
    ///
    /// - `None` → grow lazily
    /// - `Some(n)` → preallocate `n` slots
    #[inline]
    pub fn initial_capacity(&self) -> Option<usize> {
        if self.capacity == 0 {
            None
        } else {
            Some(self.capacity)
        }
    }
}

impl Default for RegistryConfig {
    /// Default configuration:
    ///
    /// - `capacity = 0` (grow lazily)
    /// - `trace_failures = true`
    /// - `fan_out = FanOut::Inline`
    fn default() -> Self {
        Self {
            capacity: 0,
            trace_failures: true,
            fan_out: FanOut::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = RegistryConfig::default();
        assert_eq!(cfg.initial_capacity(), None);
        assert!(cfg.trace_failures);
        assert_eq!(cfg.fan_out, FanOut::Inline);
    }

    #[test]
    fn test_capacity_sentinel() {
        let cfg = RegistryConfig {
            capacity: 16,
            ..RegistryConfig::default()
        };
        assert_eq!(cfg.initial_capacity(), Some(16));
    }
}
