//! # Multicast endpoint (`Notifier`)
//!
//! A [`Notifier`] delivers each payload to every handler subscribed on its
//! channel and waits until all of them have settled.
//!
//! ## Architecture
//! ```text
//! Notifier::publish(payload)
//!     │
//!     ├──► Registry.multicast("id")   (snapshot, no lock held afterwards)
//!     ├──► downcast each slot         (foreign types skipped + warn)
//!     ├──► fan_out::invoke            (subscription order)
//!     └──► fan_out::settle            (Inline: join_all │ Spawn: tokio tasks)
//!              └──► failures logged (trace_failures), never returned
//! ```
//!
//! ## Rules
//! - Handlers subscribed or removed during a publish affect later publishes only.
//! - An empty channel resolves immediately.
//! - There is no aggregate failure report; a caller that needs one must record
//!   failures inside its own handler.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use courier::{merge_subscriptions, Registry};
//!
//! # futures::executor::block_on(async {
//! let registry = Registry::new();
//! let notifier = registry.notifier::<String>("");
//!
//! let raw = Arc::new(Mutex::new(Vec::new()));
//! let lens = Arc::new(Mutex::new(Vec::new()));
//!
//! let (r, l) = (raw.clone(), lens.clone());
//! let both = merge_subscriptions([
//!     notifier.subscribe_sync(move |s: String| r.lock().unwrap().push(s)),
//!     notifier.subscribe_sync(move |s: String| l.lock().unwrap().push(s.len())),
//! ]);
//!
//! notifier.publish("123".to_string()).await;
//! assert_eq!(*raw.lock().unwrap(), vec!["123".to_string()]);
//! assert_eq!(*lens.lock().unwrap(), vec![3]);
//!
//! both.unsubscribe();
//! notifier.publish("123".to_string()).await;
//! assert_eq!(raw.lock().unwrap().len(), 1);
//! assert_eq!(lens.lock().unwrap().len(), 1);
//! # });
//! ```

use std::any::type_name;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::channels::fan_out;
use crate::core::{Delivery, Registry};
use crate::error::{HandlerResult, RegistryError};
use crate::handlers::{erase_fn, erase_handler, erase_sync, DynHandler, Handler, IntoOutcome};
use crate::subscription::Subscription;

/// Multicast endpoint: every handler, settle-all completion.
pub struct Notifier<P> {
    registry: Registry,
    channel: Arc<str>,
    _payload: PhantomData<fn(P)>,
}

impl<P> Notifier<P> {
    pub(crate) fn new(registry: Registry, channel: String) -> Self {
        Self {
            registry,
            channel: channel.into(),
            _payload: PhantomData,
        }
    }

    /// Channel id this notifier is bound to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Number of handlers currently subscribed.
    pub fn subscriber_count(&self) -> usize {
        self.registry.notifier_count(&self.channel)
    }
}

impl<P> Notifier<P>
where
    P: Clone + Send + 'static,
{
    /// Appends an async closure to the channel's handlers.
    pub fn subscribe<F, Fut>(&self, f: F) -> Subscription
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoOutcome,
    {
        let handler = erase_fn(move |payload: P| {
            let fut = f(payload);
            async move { fut.await.into_outcome() }
        });
        self.install(Cow::Borrowed(type_name::<F>()), handler)
    }

    /// Appends a synchronous closure to the channel's handlers.
    pub fn subscribe_sync<F, O>(&self, f: F) -> Subscription
    where
        F: Fn(P) -> O + Send + Sync + 'static,
        O: IntoOutcome,
    {
        let handler = erase_sync(move |payload: P| f(payload).into_outcome());
        self.install(Cow::Borrowed(type_name::<F>()), handler)
    }

    /// Appends a [`Handler`] to the channel's handlers.
    pub fn subscribe_handler(&self, handler: Arc<dyn Handler<P, HandlerResult>>) -> Subscription {
        let label = Cow::Owned(handler.name().to_string());
        self.install(label, erase_handler(handler))
    }

    fn install(
        &self,
        label: Cow<'static, str>,
        handler: Arc<DynHandler<P, HandlerResult>>,
    ) -> Subscription {
        self.registry
            .subscribe(&self.channel, label, Arc::new(handler), Delivery::Multicast)
    }

    /// Delivers `payload` to every handler and waits until all have settled.
    ///
    /// Handlers are called in subscription order; their replies run
    /// concurrently. Failures and panics are swallowed.
    pub async fn publish(&self, payload: P) {
        let slots = self.registry.multicast(&self.channel);
        if slots.is_empty() {
            trace!(channel = %self.channel, "no notifier subscribers");
            return;
        }

        let mut labels = Vec::with_capacity(slots.len());
        let mut started = Vec::with_capacity(slots.len());
        for slot in slots {
            let Some(handler) = slot.downcast::<DynHandler<P, HandlerResult>>() else {
                let err = RegistryError::TypeMismatch {
                    channel: self.channel.to_string(),
                    expected: type_name::<fn(P)>(),
                };
                warn!(channel = %self.channel, subscription = %slot.id, label = err.as_label(), "{}", err.as_message());
                continue;
            };
            started.push(fan_out::invoke(&*handler, payload.clone()));
            labels.push((slot.id, slot.label));
        }

        trace!(channel = %self.channel, handlers = started.len(), "publish");
        let config = self.registry.config();
        let outcomes = fan_out::settle(started, config.fan_out).await;

        if config.trace_failures {
            for ((id, label), outcome) in labels.iter().zip(&outcomes) {
                if let Err(err) = outcome {
                    warn!(
                        channel = %self.channel,
                        subscription = %id,
                        handler = %label,
                        reason = err.as_label(),
                        "{}",
                        err.as_message()
                    );
                }
            }
        }
    }
}

impl<P> Clone for Notifier<P> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            channel: Arc::clone(&self.channel),
            _payload: PhantomData,
        }
    }
}

impl<P> fmt::Debug for Notifier<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("channel", &self.channel)
            .field("payload", &type_name::<P>())
            .finish()
    }
}

/// Creates a multicast endpoint bound to `channel` on `registry`.
///
/// Same as [`Registry::notifier`].
pub fn create_notifier<P>(registry: &Registry, channel: impl Into<String>) -> Notifier<P> {
    registry.notifier(channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FanOut, RegistryConfig};
    use crate::error::HandlerError;
    use crate::subscription::merge_subscriptions;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn collector<T>() -> Arc<Mutex<Vec<T>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[tokio::test]
    async fn test_empty_channel_resolves() {
        let reg = Registry::new();
        let n = create_notifier::<u8>(&reg, "quiet");
        n.publish(1).await;
        assert_eq!(n.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_collectors_scenario() {
        let reg = Registry::new();
        let n = reg.notifier::<String>("");
        let raw = collector::<String>();
        let lens = collector::<usize>();

        let (r, l) = (Arc::clone(&raw), Arc::clone(&lens));
        let both = merge_subscriptions([
            n.subscribe_sync(move |s: String| r.lock().unwrap().push(s)),
            n.subscribe(move |s: String| {
                let l = Arc::clone(&l);
                async move { l.lock().unwrap().push(s.len()) }
            }),
        ]);

        n.publish("123".into()).await;
        assert_eq!(*raw.lock().unwrap(), vec!["123".to_string()]);
        assert_eq!(*lens.lock().unwrap(), vec![3]);

        both.unsubscribe();
        n.publish("123".into()).await;
        assert_eq!(raw.lock().unwrap().len(), 1);
        assert_eq!(lens.lock().unwrap().len(), 1);
        assert_eq!(n.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_invocation_follows_subscription_order() {
        let reg = Registry::new();
        let n = reg.notifier::<()>("order");
        let seen = collector::<u8>();
        let _subs: Vec<Subscription> = (0..5u8)
            .map(|i| {
                let seen = Arc::clone(&seen);
                n.subscribe_sync(move |_| seen.lock().unwrap().push(i))
            })
            .collect();

        n.publish(()).await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_waits_for_slow_handlers_despite_failures() {
        let reg = Registry::new();
        let n = reg.notifier::<u64>("mixed");
        let done = Arc::new(AtomicUsize::new(0));

        let d = Arc::clone(&done);
        let _slow = n.subscribe(move |ms: u64| {
            let d = Arc::clone(&d);
            async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                d.fetch_add(1, Ordering::SeqCst);
            }
        });
        let _failing = n.subscribe_sync(|_| Err::<(), _>("refused"));
        let _panicking = n.subscribe_sync(|_: u64| -> () { panic!("handler panicked") });
        let d = Arc::clone(&done);
        let _fast = n.subscribe_sync(move |_| {
            d.fetch_add(1, Ordering::SeqCst);
        });

        n.publish(20).await;
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_removing_one_keeps_others() {
        let reg = Registry::new();
        let n = reg.notifier::<u32>("many");
        let a = collector::<u32>();
        let b = collector::<u32>();

        let (ca, cb) = (Arc::clone(&a), Arc::clone(&b));
        let sub_a = n.subscribe_sync(move |p| ca.lock().unwrap().push(p));
        let _sub_b = n.subscribe_sync(move |p| cb.lock().unwrap().push(p));

        n.publish(1).await;
        sub_a.unsubscribe();
        sub_a.unsubscribe();
        n.publish(2).await;

        assert_eq!(*a.lock().unwrap(), vec![1]);
        assert_eq!(*b.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_subscribe_during_publish_applies_next_time() {
        let reg = Registry::new();
        let n = reg.notifier::<()>("grow");
        let hits = Arc::new(AtomicUsize::new(0));

        let (inner_n, h) = (n.clone(), Arc::clone(&hits));
        let _sub = n.subscribe_sync(move |_| {
            let h = Arc::clone(&h);
            // leaked on purpose: lives for the rest of the test
            let _added = inner_n.subscribe_sync(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            });
        });

        n.publish(()).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(n.subscriber_count(), 2);

        n.publish(()).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(n.subscriber_count(), 3);
    }

    #[tokio::test]
    async fn test_handler_may_unsubscribe_itself() {
        let reg = Registry::new();
        let n = reg.notifier::<()>("once");
        let (own_hits, other_hits) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));

        let slot: Arc<Mutex<Option<Subscription>>> = Arc::default();
        let (own, h) = (Arc::clone(&slot), Arc::clone(&own_hits));
        let sub = n.subscribe_sync(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = own.lock().unwrap().take() {
                sub.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(sub);
        let h = Arc::clone(&other_hits);
        let _other = n.subscribe_sync(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        n.publish(()).await;
        assert_eq!(own_hits.load(Ordering::SeqCst), 1);
        assert_eq!(other_hits.load(Ordering::SeqCst), 1);
        assert_eq!(n.subscriber_count(), 1);

        n.publish(()).await;
        assert_eq!(own_hits.load(Ordering::SeqCst), 1);
        assert_eq!(other_hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_handler_may_unsubscribe_sibling() {
        let reg = Registry::new();
        let n = reg.notifier::<()>("siblings");
        let (first_hits, second_hits) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));

        let target: Arc<Mutex<Option<Subscription>>> = Arc::default();
        let (t, h) = (Arc::clone(&target), Arc::clone(&first_hits));
        let _first = n.subscribe_sync(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = t.lock().unwrap().take() {
                sub.unsubscribe();
            }
        });
        let h = Arc::clone(&second_hits);
        let second = n.subscribe_sync(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        *target.lock().unwrap() = Some(second);

        // the running publish still covers its snapshot
        n.publish(()).await;
        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 1);
        assert_eq!(n.subscriber_count(), 1);

        n.publish(()).await;
        assert_eq!(first_hits.load(Ordering::SeqCst), 2);
        assert_eq!(second_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_drops_handler_owning_a_guard() {
        let reg = Registry::new();
        let n = reg.notifier::<()>("ch");
        let partner = n.subscribe_sync(|_| {}).guard();
        let outer = n.subscribe_sync(move |_| {
            let _held = &partner;
        });
        assert_eq!(n.subscriber_count(), 2);

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            outer.unsubscribe();
            let _ = tx.send(());
        });
        rx.recv_timeout(Duration::from_secs(3))
            .expect("unsubscribe returned");

        assert_eq!(n.subscriber_count(), 0);
        assert!(reg.channels().is_empty());
    }

    struct Counter(AtomicUsize);

    #[async_trait]
    impl Handler<u32, HandlerResult> for Counter {
        async fn handle(&self, payload: u32) -> HandlerResult {
            if payload == 0 {
                return Err(HandlerError::failed("zero"));
            }
            self.0.fetch_add(payload as usize, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "counter"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawn_fan_out_with_trait_handler() {
        let reg = Registry::with_config(RegistryConfig {
            fan_out: FanOut::Spawn,
            ..RegistryConfig::default()
        });
        let n = reg.notifier::<u32>("sum");
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let _a = n.subscribe_handler(Arc::clone(&counter) as Arc<dyn Handler<u32, HandlerResult>>);
        let _b = n.subscribe_handler(Arc::clone(&counter) as Arc<dyn Handler<u32, HandlerResult>>);

        n.publish(0).await;
        n.publish(5).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_foreign_handler_type_is_skipped() {
        let reg = Registry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let _typed = reg.notifier::<u8>("shared").subscribe_sync(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let h = Arc::clone(&hits);
        let _other = reg.notifier::<String>("shared").subscribe_sync(move |_| {
            h.fetch_add(100, Ordering::SeqCst);
        });

        reg.notifier::<u8>("shared").publish(1).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
