//! # Handler abstraction.
//!
//! This module defines the [`Handler`] trait (async, named) and the erased
//! callable form the registry stores. Closures passed to `subscribe` skip the
//! trait and are erased directly; [`Handler`] is the extension point for
//! struct-based handlers that carry their own state.
//!
//! The common reply type is [`Reply`], a boxed `'static` future: the handler is
//! called inline by `publish`, and whatever it still has to do is left in the
//! reply for the caller to await.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

/// Pending result of a handler invocation.
pub type Reply<R> = BoxFuture<'static, R>;

/// Type-erased handler as stored by the registry.
pub(crate) type DynHandler<P, R> = dyn Fn(P) -> Reply<R> + Send + Sync;

/// # Asynchronous payload handler.
///
/// A `Handler` receives the payload by value and produces `R`. For senders `R`
/// is the reply returned to the publisher; for notifiers it is
/// [`HandlerResult`](crate::HandlerResult).
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use courier::{Handler, Registry};
///
/// struct Doubler;
///
/// #[async_trait]
/// impl Handler<u32, u32> for Doubler {
///     async fn handle(&self, payload: u32) -> u32 {
///         payload * 2
///     }
///
///     fn name(&self) -> &str { "doubler" }
/// }
///
/// # futures::executor::block_on(async {
/// let registry = Registry::new();
/// let sender = registry.sender::<u32, u32>("double");
/// let _sub = sender.subscribe_handler(Arc::new(Doubler));
/// assert_eq!(sender.request(21).await, Some(42));
/// # });
/// ```
#[async_trait]
pub trait Handler<P, R = ()>: Send + Sync + 'static
where
    P: Send + 'static,
    R: Send + 'static,
{
    /// Handles one payload.
    async fn handle(&self, payload: P) -> R;

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Erases an async closure; the closure itself runs at call time.
pub(crate) fn erase_fn<P, R, F, Fut>(f: F) -> Arc<DynHandler<P, R>>
where
    P: Send + 'static,
    R: Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    Arc::new(move |payload: P| -> Reply<R> { Box::pin(f(payload)) })
}

/// Erases a synchronous closure; its value is delivered as a completed reply.
pub(crate) fn erase_sync<P, R, F>(f: F) -> Arc<DynHandler<P, R>>
where
    P: Send + 'static,
    R: Send + 'static,
    F: Fn(P) -> R + Send + Sync + 'static,
{
    Arc::new(move |payload: P| -> Reply<R> {
        let value = f(payload);
        Box::pin(futures::future::ready(value))
    })
}

/// Erases a trait-object handler.
pub(crate) fn erase_handler<P, R>(handler: Arc<dyn Handler<P, R>>) -> Arc<DynHandler<P, R>>
where
    P: Send + 'static,
    R: Send + 'static,
{
    Arc::new(move |payload: P| -> Reply<R> {
        let handler = Arc::clone(&handler);
        Box::pin(async move { handler.handle(payload).await })
    })
}
