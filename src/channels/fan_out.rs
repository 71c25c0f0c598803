//! # Settle-all fan-out for multicast handlers.
//!
//! ## Architecture
//! ```text
//! publish(payload)
//!     │
//!     ├──► invoke h1(payload.clone()) ──► reply 1 ─┐
//!     │        └──► panic → Panicked               │
//!     ├──► invoke h2(payload.clone()) ──► reply 2 ─┼──► wait for all ──► [outcome; n]
//!     └──► invoke hN(payload)         ──► reply N ─┘
//! ```
//!
//! ## Rules
//! - **Invocation order**: handlers are called in subscription order.
//! - **No completion order**: replies run concurrently and finish in any order.
//! - **Settle, never fail fast**: every reply is driven to completion even if
//!   others fail or panic.
//! - **Isolation**: panics are caught (`catch_unwind`) and turned into
//!   [`HandlerError::Panicked`].
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a handler panics while holding a lock.

use std::panic::AssertUnwindSafe;

use futures::future::join_all;
use futures::FutureExt;
use tokio::task::JoinError;

use crate::core::FanOut;
use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{DynHandler, Reply};

/// A started handler: its pending reply, or the panic raised while calling it.
pub(crate) type Started = Result<Reply<HandlerResult>, HandlerError>;

/// Calls one handler, catching a panic raised by the call itself.
pub(crate) fn invoke<P>(handler: &DynHandler<P, HandlerResult>, payload: P) -> Started {
    std::panic::catch_unwind(AssertUnwindSafe(|| handler(payload)))
        .map_err(|panic| HandlerError::from_panic(panic.as_ref()))
}

/// Waits for every started handler and returns their outcomes in invocation order.
pub(crate) async fn settle(started: Vec<Started>, mode: FanOut) -> Vec<HandlerResult> {
    match mode {
        FanOut::Inline => join_all(started.into_iter().map(settle_inline)).await,
        FanOut::Spawn => {
            let handles: Vec<_> = started
                .into_iter()
                .map(|call| call.map(tokio::spawn))
                .collect();
            join_all(handles.into_iter().map(|handle| async move {
                match handle {
                    Ok(join) => join.await.unwrap_or_else(|err| Err(from_join_error(err))),
                    Err(err) => Err(err),
                }
            }))
            .await
        }
    }
}

async fn settle_inline(call: Started) -> HandlerResult {
    let reply = call?;
    match AssertUnwindSafe(reply).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => Err(HandlerError::from_panic(panic.as_ref())),
    }
}

fn from_join_error(err: JoinError) -> HandlerError {
    if err.is_panic() {
        HandlerError::from_panic(err.into_panic().as_ref())
    } else {
        HandlerError::failed(err)
    }
}
