//! # Pile drainer.
//!
//! One background task per `PileUpOrClose` subscription. It repeatedly takes
//! the next piled item and pushes it into the main delivery queue, deriving
//! a fresh timeout window for every item. Besides the direct send paths it
//! is the only writer into the main queue, and it follows the same
//! read-lock discipline: clone the sender under the read lock, wait with
//! the lock released.
//!
//! ## Exit conditions
//! - subscription cancelled (mid-wait or between items): exit quietly;
//! - setup context ended: exit quietly;
//! - per-item window exhausted: the consumer is genuinely stuck, so the
//!   drainer unsubscribes the subscription and exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::subscription::Subscription;
use crate::topic::Topic;

pub(super) async fn run<T, E>(
    ctx: CancellationToken,
    sub: Arc<Subscription<T, E>>,
    mut pile: mpsc::Receiver<E>,
    window: Duration,
) where
    T: Topic,
    E: Send + 'static,
{
    tracing::trace!(id = sub.id, "pile drainer started");
    loop {
        let event = tokio::select! {
            biased;
            _ = sub.canceler.token().cancelled() => break,
            _ = ctx.cancelled() => break,
            item = pile.recv() => match item {
                Some(event) => event,
                None => break,
            },
        };

        let queue = {
            let slot = sub.queue_tx.read().await;
            match slot.as_ref() {
                Some(tx) => tx.clone(),
                None => break,
            }
        };

        // fresh window per item
        let push = async {
            if window.is_zero() {
                queue.send(event).await.is_ok()
            } else {
                matches!(
                    tokio::time::timeout(window, queue.send(event)).await,
                    Ok(Ok(()))
                )
            }
        };
        let pushed = tokio::select! {
            biased;
            _ = sub.canceler.token().cancelled() => break,
            _ = ctx.cancelled() => break,
            pushed = push => pushed,
        };
        if pushed {
            continue;
        }

        tracing::trace!(id = sub.id, "pile drain timed out, closing subscription");
        let bus = sub.bus.clone();
        // teardown must not observe the setup context's cancellation
        bus.unsubscribe(&CancellationToken::new(), &sub).await;
        break;
    }
    tracing::trace!(id = sub.id, "pile drainer stopped");
}
