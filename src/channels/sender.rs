//! # Unicast endpoint (`Sender`)
//!
//! A [`Sender`] is bound to one channel id and talks to at most one handler.
//! `publish` calls that handler inline and hands back its pending [`Reply`];
//! awaiting it is up to the caller.
//!
//! ## Rules
//! - **Last subscriber wins**: a new `subscribe` silently replaces the old handler.
//! - **Stale handles are inert**: the replaced subscriber's handle no longer
//!   removes anything.
//! - **Absence is not an error**: `publish` returns `None` when nobody listens.
//! - **Failures propagate**: panics unwind through `publish`/the reply, `Result`
//!   replies are returned untouched.

use std::any::type_name;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::core::{Delivery, Registry};
use crate::error::RegistryError;
use crate::handlers::{erase_fn, erase_handler, erase_sync, DynHandler, Handler, Reply};
use crate::subscription::Subscription;

/// Unicast endpoint: one handler, one reply.
pub struct Sender<P, R> {
    registry: Registry,
    channel: Arc<str>,
    _types: PhantomData<fn(P) -> R>,
}

impl<P, R> Sender<P, R> {
    pub(crate) fn new(registry: Registry, channel: String) -> Self {
        Self {
            registry,
            channel: channel.into(),
            _types: PhantomData,
        }
    }

    /// Channel id this sender is bound to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns true if a handler is currently installed on the channel.
    pub fn has_subscriber(&self) -> bool {
        self.registry.has_sender(&self.channel)
    }
}

impl<P, R> Sender<P, R>
where
    P: Send + 'static,
    R: Send + 'static,
{
    /// Installs an async closure as the sole responder.
    pub fn subscribe<F, Fut>(&self, f: F) -> Subscription
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.install(Cow::Borrowed(type_name::<F>()), erase_fn(f))
    }

    /// Installs a synchronous closure as the sole responder.
    pub fn subscribe_sync<F>(&self, f: F) -> Subscription
    where
        F: Fn(P) -> R + Send + Sync + 'static,
    {
        self.install(Cow::Borrowed(type_name::<F>()), erase_sync(f))
    }

    /// Installs a [`Handler`] as the sole responder.
    pub fn subscribe_handler(&self, handler: Arc<dyn Handler<P, R>>) -> Subscription {
        let label = Cow::Owned(handler.name().to_string());
        self.install(label, erase_handler(handler))
    }

    fn install(&self, label: Cow<'static, str>, handler: Arc<DynHandler<P, R>>) -> Subscription {
        self.registry
            .subscribe(&self.channel, label, Arc::new(handler), Delivery::Unicast)
    }

    /// Calls the current handler, if any, and returns its pending reply.
    ///
    /// `None` means "no current subscriber". A handler registered on this
    /// channel with other types is logged and treated as absent; use
    /// [`try_publish`](Self::try_publish) to observe that case.
    pub fn publish(&self, payload: P) -> Option<Reply<R>> {
        match self.try_publish(payload) {
            Ok(reply) => reply,
            Err(err) => {
                warn!(channel = %self.channel, label = err.as_label(), "{}", err.as_message());
                None
            }
        }
    }

    /// Like [`publish`](Self::publish) but reports a type mismatch as an error.
    pub fn try_publish(&self, payload: P) -> Result<Option<Reply<R>>, RegistryError> {
        let Some(slot) = self.registry.unicast(&self.channel) else {
            trace!(channel = %self.channel, "no sender subscriber");
            return Ok(None);
        };
        let handler = slot.downcast::<DynHandler<P, R>>().ok_or_else(|| {
            RegistryError::TypeMismatch {
                channel: self.channel.to_string(),
                expected: type_name::<fn(P) -> R>(),
            }
        })?;

        trace!(channel = %self.channel, subscription = %slot.id, handler = %slot.label, "publish");
        Ok(Some(handler(payload)))
    }

    /// Publishes and awaits the reply.
    pub async fn request(&self, payload: P) -> Option<R> {
        match self.publish(payload) {
            Some(reply) => Some(reply.await),
            None => None,
        }
    }
}

impl<P, R> Clone for Sender<P, R> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            channel: Arc::clone(&self.channel),
            _types: PhantomData,
        }
    }
}

impl<P, R> fmt::Debug for Sender<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("channel", &self.channel)
            .field("types", &type_name::<fn(P) -> R>())
            .finish()
    }
}

/// Creates a unicast endpoint bound to `channel` on `registry`.
///
/// Same as [`Registry::sender`].
pub fn create_sender<P, R>(registry: &Registry, channel: impl Into<String>) -> Sender<P, R> {
    registry.sender(channel)
}
