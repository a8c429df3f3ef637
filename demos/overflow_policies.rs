//! # Example: overflow_policies
//!
//! One publisher, four subscribers, four reactions to a full queue.
//!
//! Demonstrates how each [`OverflowPolicy`] shapes delivery when the
//! consumer is slower than the publisher:
//! - `Wait`: the publisher's deferred attempt waits for room;
//! - `Drop`: overflow events are discarded, the subscription survives;
//! - `Close`: the first overflow unsubscribes the consumer;
//! - `PileUpOrClose`: overflow is absorbed into a pile buffer; a consumer
//!   stuck past the drain window gets closed.
//!
//! ## Run
//! ```bash
//! cargo run --example overflow_policies
//! ```

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use topicbus::{EventBus, OverflowPolicy, SubscribeOption};

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

    let policies = [
        ("wait", OverflowPolicy::Wait(Duration::from_millis(200))),
        ("drop", OverflowPolicy::Drop),
        ("close", OverflowPolicy::Close),
        (
            "pile",
            OverflowPolicy::PileUpOrClose {
                pile_size: 4,
                timeout: Duration::from_millis(200),
            },
        ),
    ];

    let mut subs = Vec::new();
    for (name, policy) in policies {
        let sub = bus
            .subscribe::<Tick>(
                &ctx,
                [
                    SubscribeOption::queue_size(1),
                    SubscribeOption::overflow(policy),
                ],
            )
            .await?;
        println!("[subscribe] {name}: {}", sub.overflow_policy().as_label());
        subs.push((name, sub));
    }

    // Publish faster than anyone consumes: queue capacity is 1, so the
    // second event hits every policy's overflow path.
    for i in 1..=3u64 {
        let report = bus.send(&ctx, Tick(i)).await;
        println!(
            "[send] Tick({i}) -> sent={} piled={} dropped={}",
            report.total_sent(),
            report.piled,
            report.total_dropped(),
        );
    }

    // Drain whatever each subscriber still holds.
    for (name, sub) in &subs {
        while let Ok(Some(Tick(i))) =
            tokio::time::timeout(Duration::from_millis(300), sub.recv()).await
        {
            println!("[recv] {name}: Tick({i})");
        }
        println!(
            "[state] {name}: done={} finished={}",
            sub.is_done(),
            sub.is_finished()
        );
    }

    for (_, sub) in &subs {
        sub.finish(&ctx).await;
    }
    Ok(())
}
