//! # Unsubscribe handles.
//!
//! Every `subscribe` call returns a [`Subscription`]: an opaque, cloneable
//! callback that removes the subscription it was created for.
//!
//! ## Rules
//! - Dropping a [`Subscription`] does **not** unsubscribe; call
//!   [`Subscription::unsubscribe`] or convert it into a [`SubscriptionGuard`].
//! - Handles issued by the registry are idempotent: the second call is a no-op.
//! - [`merge_subscriptions`] chains several handles into one, called in order.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use courier::{merge_subscriptions, Subscription};
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let make = |c: Arc<AtomicUsize>| Subscription::from_fn(move || {
//!     c.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! let all = merge_subscriptions([make(calls.clone()), make(calls.clone())]);
//! all.unsubscribe();
//! assert_eq!(calls.load(Ordering::SeqCst), 2);
//! ```

use std::fmt;
use std::sync::Arc;

/// Handle that removes one (or, when merged, several) subscriptions.
#[derive(Clone)]
#[must_use = "dropping a Subscription keeps the handler installed; keep it to unsubscribe later"]
pub struct Subscription {
    unsubscribe: Arc<dyn Fn() + Send + Sync>,
}

impl Subscription {
    /// Wraps an arbitrary callback as an unsubscribe handle.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            unsubscribe: Arc::new(f),
        }
    }

    /// Handle that does nothing when invoked.
    pub fn noop() -> Self {
        Self::from_fn(|| {})
    }

    /// Removes the subscription(s) this handle is bound to.
    pub fn unsubscribe(&self) {
        (self.unsubscribe)()
    }

    /// Converts the handle into a guard that unsubscribes when dropped.
    pub fn guard(self) -> SubscriptionGuard {
        SubscriptionGuard { inner: Some(self) }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Unsubscribes on drop.
#[derive(Debug)]
#[must_use = "the subscription is removed as soon as the guard is dropped"]
pub struct SubscriptionGuard {
    inner: Option<Subscription>,
}

impl SubscriptionGuard {
    /// Detaches the guard and returns the plain handle; nothing is removed.
    pub fn disarm(mut self) -> Subscription {
        self.inner.take().unwrap_or_else(Subscription::noop)
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(sub) = self.inner.take() {
            sub.unsubscribe();
        }
    }
}

/// Chains several unsubscribe handles into one.
///
/// Invoking the result calls every handle in the order given. There is no
/// short-circuiting: a panicking handle propagates as-is and the rest are skipped
/// only because the panic unwinds.
pub fn merge_subscriptions<I>(subs: I) -> Subscription
where
    I: IntoIterator<Item = Subscription>,
{
    let subs: Vec<Subscription> = subs.into_iter().collect();
    Subscription::from_fn(move || {
        for sub in &subs {
            sub.unsubscribe();
        }
    })
}
