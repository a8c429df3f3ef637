//! # Example: basic
//!
//! Minimal publish/subscribe round trip on a single default topic.
//!
//! Demonstrates how to:
//! - Create an [`EventBus`] and subscribe with a bounded queue.
//! - Broadcast events and read the [`SendReport`] counters.
//! - Receive events and unsubscribe cleanly.
//!
//! ## Flow
//! ```text
//! subscribe ──► EventBus registry
//! send(Tick) ──► queue ──► recv()
//! finish() ──► teardown ──► recv() returns None
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic
//! ```

use tokio_util::sync::CancellationToken;
use topicbus::{EventBus, SubscribeOption};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
struct Tick(u64);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let ctx = CancellationToken::new();
    let bus = EventBus::new();

    // 1. Subscribe under Tick's default topic with room for 8 events
    let sub = bus
        .subscribe::<Tick>(&ctx, [SubscribeOption::queue_size(8)])
        .await?;

    // 2. Broadcast a few events
    for i in 1..=3 {
        let report = bus.send(&ctx, Tick(i)).await;
        println!("[send] Tick({i}) -> sent={}", report.total_sent());
    }

    // 3. Drain them in order
    for _ in 0..3 {
        if let Some(Tick(i)) = sub.recv().await {
            println!("[recv] Tick({i})");
        }
    }

    // 4. Unsubscribe; the queue closes and recv() ends
    sub.finish(&ctx).await;
    sub.finished().await;
    assert_eq!(sub.recv().await, None);
    println!("[done] subscription finished");
    Ok(())
}
