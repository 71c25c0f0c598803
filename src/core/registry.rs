//! # Channel registry - the single source of truth for subscriptions.
//!
//! The registry maps a channel id to either one handler (unicast, used by
//! [`Sender`]) or an ordered list of handlers (multicast, used by [`Notifier`]).
//!
//! ## Architecture
//! ```text
//! Sender<P, R>::subscribe ──► Registry.subscribe(id, h, Unicast)   ──► unicast["id"]   = Slot
//! Notifier<P>::subscribe  ──► Registry.subscribe(id, h, Multicast) ──► multicast["id"] += Slot
//!
//! Sender::publish   ──► unicast.get("id")   ──► downcast ──► h(payload) ──► Reply<R>
//! Notifier::publish ──► multicast.get("id") ──► snapshot ──► fan-out   ──► settle all
//! ```
//!
//! ## Rules
//! - Handlers are stored type-erased; `Sender`/`Notifier` restore the static types.
//!   Nothing checks that every user of a channel id agrees on those types.
//! - Unicast and multicast channels live in separate tables.
//! - Unicast subscribe overwrites silently (last subscriber wins).
//! - Unsubscribe removes by [`SubscriptionId`]; a stale or repeated unsubscribe is a no-op.
//! - No lock is held while a handler runs, so handlers may (un)subscribe re-entrantly.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::debug;

use crate::channels::{Notifier, Sender};
use crate::core::config::RegistryConfig;
use crate::subscription::Subscription;

/// Registry-unique identity of one installed handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Delivery mode of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// At most one handler; publishing returns its result.
    Unicast,
    /// Any number of handlers, notified in subscription order.
    Multicast,
}

/// One installed handler.
#[derive(Clone)]
pub(crate) struct Slot {
    pub(crate) id: SubscriptionId,
    /// Handler name for logs.
    pub(crate) label: Cow<'static, str>,
    /// `Arc<DynHandler<P, R>>` behind `Any`.
    handler: Arc<dyn Any + Send + Sync>,
}

impl Slot {
    /// Restores the static handler type, `None` if the slot holds another type.
    pub(crate) fn downcast<H>(&self) -> Option<Arc<H>>
    where
        H: ?Sized + 'static,
    {
        self.handler.downcast_ref::<Arc<H>>().cloned()
    }
}

struct Inner {
    unicast: DashMap<String, Slot>,
    multicast: DashMap<String, Vec<Slot>>,
    next_id: AtomicU64,
    config: RegistryConfig,
}

impl Inner {
    fn remove_unicast(&self, channel: &str, id: SubscriptionId) {
        if self.unicast.remove_if(channel, |_, slot| slot.id == id).is_some() {
            debug!(channel, subscription = %id, "sender unsubscribed");
        }
    }

    fn remove_multicast(&self, channel: &str, id: SubscriptionId) {
        let Some(mut slots) = self.multicast.get_mut(channel) else {
            return;
        };
        let Some(pos) = slots.iter().position(|slot| slot.id == id) else {
            return;
        };
        let removed = slots.remove(pos);
        let remaining = slots.len();
        // The handler may own registry handles; drop it only after the shard lock is released.
        drop(slots);
        drop(removed);

        // Dropping the handler may have unsubscribed others, so re-check emptiness under the lock.
        let _ = self.multicast.remove_if(channel, |_, slots| slots.is_empty());
        debug!(channel, subscription = %id, remaining, "notifier unsubscribed");
    }
}

/// Shared channel registry.
///
/// Cheap to clone: every clone refers to the same tables. Construct one at
/// startup and hand it to every component that creates senders or notifiers;
/// tests build their own to stay isolated.
///
/// # Example
/// ```
/// use courier::Registry;
///
/// # futures::executor::block_on(async {
/// let registry = Registry::new();
/// let parse = registry.sender::<String, Option<u32>>("parse");
/// assert!(parse.publish("123".into()).is_none());
///
/// let sub = parse.subscribe_sync(|s: String| s.parse().ok());
/// assert_eq!(parse.request("123".into()).await, Some(Some(123)));
///
/// sub.unsubscribe();
/// assert!(parse.publish("123".into()).is_none());
/// # });
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Creates a registry with [`RegistryConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Creates a registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        let (unicast, multicast) = match config.initial_capacity() {
            Some(n) => (DashMap::with_capacity(n), DashMap::with_capacity(n)),
            None => (DashMap::new(), DashMap::new()),
        };
        Self {
            inner: Arc::new(Inner {
                unicast,
                multicast,
                next_id: AtomicU64::new(1),
                config,
            }),
        }
    }

    /// Returns the configuration this registry was built with.
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Creates a unicast endpoint bound to `channel`.
    pub fn sender<P, R>(&self, channel: impl Into<String>) -> Sender<P, R> {
        Sender::new(self.clone(), channel.into())
    }

    /// Creates a multicast endpoint bound to `channel`.
    pub fn notifier<P>(&self, channel: impl Into<String>) -> Notifier<P> {
        Notifier::new(self.clone(), channel.into())
    }

    /// Installs a type-erased handler.
    ///
    /// - `Unicast`: replaces whatever occupies the channel. The returned handle
    ///   clears the channel only while this handler is still the one installed.
    /// - `Multicast`: appends to the channel's list. The returned handle removes
    ///   this handler only; later calls are no-ops.
    pub(crate) fn subscribe(
        &self,
        channel: &str,
        label: Cow<'static, str>,
        handler: Arc<dyn Any + Send + Sync>,
        delivery: Delivery,
    ) -> Subscription {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let slot = Slot { id, label, handler };

        match delivery {
            Delivery::Unicast => {
                if let Some(prev) = self.inner.unicast.insert(channel.to_string(), slot) {
                    debug!(channel, subscription = %id, replaced = %prev.id, "sender replaced");
                } else {
                    debug!(channel, subscription = %id, "sender subscribed");
                }
            }
            Delivery::Multicast => {
                let mut slots = self.inner.multicast.entry(channel.to_string()).or_default();
                slots.push(slot);
                debug!(channel, subscription = %id, total = slots.len(), "notifier subscribed");
            }
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let channel = channel.to_string();
        Subscription::from_fn(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            match delivery {
                Delivery::Unicast => inner.remove_unicast(&channel, id),
                Delivery::Multicast => inner.remove_multicast(&channel, id),
            }
        })
    }

    /// Current unicast handler of `channel`.
    pub(crate) fn unicast(&self, channel: &str) -> Option<Slot> {
        self.inner.unicast.get(channel).map(|slot| slot.value().clone())
    }

    /// Snapshot of the multicast handlers of `channel`, in subscription order.
    pub(crate) fn multicast(&self, channel: &str) -> Vec<Slot> {
        self.inner
            .multicast
            .get(channel)
            .map(|slots| slots.value().clone())
            .unwrap_or_default()
    }

    /// Returns true if a sender handler is installed on `channel`.
    pub fn has_sender(&self, channel: &str) -> bool {
        self.inner.unicast.contains_key(channel)
    }

    /// Returns the number of notifier handlers installed on `channel`.
    pub fn notifier_count(&self, channel: &str) -> usize {
        self.inner
            .multicast
            .get(channel)
            .map(|slots| slots.len())
            .unwrap_or(0)
    }

    /// Returns sorted, deduplicated ids of channels with at least one live handler.
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .unicast
            .iter()
            .map(|entry| entry.key().clone())
            .chain(
                self.inner
                    .multicast
                    .iter()
                    .filter(|entry| !entry.value().is_empty())
                    .map(|entry| entry.key().clone()),
            )
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("senders", &self.inner.unicast.len())
            .field("notifier_channels", &self.inner.multicast.len())
            .field("config", &self.inner.config)
            .finish()
    }
}
