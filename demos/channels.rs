//! # Channels Example
//!
//! Wires a unicast "parse" channel and a multicast "audit" channel on one registry.
//!
//! Shows:
//! - replying through a [`courier::Sender`]
//! - fanning out through a [`courier::Notifier`] with one failing listener
//! - tearing everything down with `merge_subscriptions`
//!
//! ## Run
//! ```bash
//! RUST_LOG=courier=debug cargo run --example channels
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use courier::{merge_subscriptions, FanOut, Registry, RegistryConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let registry = Registry::with_config(RegistryConfig {
        fan_out: FanOut::Spawn,
        ..RegistryConfig::default()
    });

    let parse = registry.sender::<String, Result<i64, String>>("parse");
    let audit = registry.notifier::<String>("audit");

    let seen = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&seen);

    let all = merge_subscriptions([
        parse.subscribe_sync(|raw: String| raw.trim().parse::<i64>().map_err(|e| e.to_string())),
        audit.subscribe_sync(|line: String| println!(" ├─► audit: {line}")),
        audit.subscribe(move |_line: String| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }),
        audit.subscribe_sync(|line: String| {
            if line.contains("abc") {
                Err(format!("refusing {line:?}"))
            } else {
                Ok(())
            }
        }),
    ]);

    for input in ["123", " 42 ", "abc"] {
        match parse.request(input.to_string()).await {
            Some(Ok(n)) => println!("parsed {input:?} -> {n}"),
            Some(Err(e)) => println!("parse {input:?} failed: {e}"),
            None => println!("nobody parses"),
        }
        audit.publish(format!("parse {input:?}")).await;
    }

    println!("Channels: {:?}", registry.channels());
    all.unsubscribe();
    println!("After unsubscribe: {:?}", registry.channels());

    assert!(parse.request("1".into()).await.is_none());
    println!(" └─► audited: {}", seen.load(Ordering::Relaxed));
}
