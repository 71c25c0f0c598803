//! # courier
//!
//! **Courier** is a small in-process mediator for Rust.
//!
//! Components talk through named channels instead of holding references to each
//! other. A channel is used in one of two delivery modes:
//!
//! - **unicast** ([`Sender`]): at most one handler; publishing returns its reply;
//! - **multicast** ([`Notifier`]): any number of handlers; publishing calls all of
//!   them and waits until every one has settled, ignoring individual failures.
//!
//! ## Architecture
//! ```text
//!   ┌──────────────┐  ┌──────────────┐        ┌──────────────┐  ┌──────────────┐
//!   │ Sender<P, R> │  │ Sender<P, R> │        │ Notifier<P>  │  │ Notifier<P>  │
//!   │  ("parse")   │  │  ("parse")   │        │    ("")      │  │    ("")      │
//!   └──────┬───────┘  └──────┬───────┘        └──────┬───────┘  └──────┬───────┘
//!          │ subscribe       │ publish               │ subscribe       │ publish
//!          ▼                 ▼                       ▼                 ▼
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │  Registry (shared, cheap to clone)                                          │
//! │  - unicast:   channel id ──► Slot          (last subscriber wins)           │
//! │  - multicast: channel id ──► [Slot, ...]   (subscription order)             │
//! │  - Slot = SubscriptionId + type-erased handler                              │
//! └──────┬───────────────────────────────────────────────────┬──────────────────┘
//!        ▼                                                   ▼
//!   h(payload) ──► Reply<R>                      fan-out ──► h1 │ h2 │ ... │ hN
//!   (caller decides whether to await)            settle all (Inline or Spawn)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / functions                         |
//! |-------------------|--------------------------------------------------------------|-----------------------------------------------|
//! | **Registry**      | Shared channel tables, explicit instead of a global.         | [`Registry`], [`RegistryConfig`], [`FanOut`]  |
//! | **Unicast**       | One responder per channel, reply returned to the publisher.  | [`Sender`], [`create_sender`]                 |
//! | **Multicast**     | Many listeners per channel, settle-all delivery.             | [`Notifier`], [`create_notifier`]             |
//! | **Handlers**      | Closures (sync or async) or struct-based async handlers.     | [`Handler`], [`Reply`], [`IntoOutcome`]       |
//! | **Subscriptions** | Idempotent unsubscribe handles, merging, drop guards.        | [`Subscription`], [`merge_subscriptions`]     |
//! | **Errors**        | Typed registry and handler errors.                           | [`RegistryError`], [`HandlerError`]           |
//!
//! ## Type contract
//! Handlers are stored type-erased and the static payload/result types are
//! restored by [`Sender`]/[`Notifier`]. All users of one channel id must agree on
//! those types. A disagreement is logged and the foreign handler is treated as
//! absent ([`Sender::try_publish`] returns it as [`RegistryError::TypeMismatch`]).
//!
//! ## Logging
//! The crate emits [`tracing`] events (`debug` for subscription changes, `trace`
//! for publishes, `warn` for swallowed failures) and never installs a subscriber.
//!
//! ## Example
//! ```rust
//! use courier::{create_sender, Registry};
//!
//! # futures::executor::block_on(async {
//! let registry = Registry::new();
//! let parse = create_sender::<String, Option<i64>>(&registry, "parse");
//!
//! let sub = parse.subscribe_sync(|payload: String| payload.parse().ok());
//! assert_eq!(parse.request("123".into()).await, Some(Some(123)));
//!
//! sub.unsubscribe();
//! assert_eq!(parse.request("123".into()).await, None);
//! # });
//! ```
mod channels;
mod core;
mod error;
mod handlers;
mod subscription;

// ---- Public re-exports ----

pub use channels::{create_notifier, create_sender, Notifier, Sender};
pub use self::core::{FanOut, Registry, RegistryConfig};
pub use error::{HandlerError, HandlerResult, RegistryError};
pub use handlers::{Handler, IntoOutcome, Reply};
pub use subscription::{merge_subscriptions, Subscription, SubscriptionGuard};
