//! # Per-subscription send algorithm.
//!
//! One event, one subscription, one [`Delivery`] outcome. The bus calls
//! [`Subscription::deliver`] twice per broadcast at most:
//! - **deferrable pass** (under the registry lock): strictly non-blocking;
//!   a full queue resolves through the overflow policy, and the waiting
//!   policies report [`Delivery::Deferred`] instead of waiting;
//! - **blocking pass** (after the lock is released): only `Wait` and
//!   `WaitOrClose` reach it; the wait races the caller's cancellation and
//!   the subscription's own cancellation, and the two are told apart so a
//!   caller giving up never closes the subscription.
//!
//! ## FIFO through the pile
//! While the pile holds items, new events bypass the main queue and go to
//! the pile as well; otherwise a fresh event could overtake items the
//! drainer has not flushed yet.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::policy::OverflowPolicy;
use crate::subscription::Subscription;
use crate::topic::Topic;

/// Outcome of one delivery attempt to one subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// Placed into the main queue.
    Sent,
    /// Placed into the pile buffer.
    Piled,
    /// Dropped; the subscription stays alive.
    Dropped,
    /// Dropped, and the policy demands the subscription be closed.
    DroppedUnsubscribe,
    /// The subscription was already cancelled; nothing was delivered.
    Unsubscribe,
    /// Queue full under a waiting policy; retry with the blocking pass.
    Deferred,
}

impl<T, E> Subscription<T, E>
where
    T: Topic,
    E: Send + 'static,
{
    /// Attempts delivery of `event`. `deferrable` selects the non-blocking
    /// registry-locked pass; the blocking pass may wait per the policy.
    pub(crate) async fn deliver(
        &self,
        ctx: &CancellationToken,
        event: E,
        deferrable: bool,
    ) -> Delivery {
        if self.canceler.fired() {
            return Delivery::Unsubscribe;
        }

        let pile_empty = self
            .pile_tx
            .as_ref()
            .map_or(true, |pile| pile.capacity() == pile.max_capacity());

        // Clone the sender under the read lock; never hold the lock while
        // waiting. A `None` slot means the close transition already ran.
        let queue = if pile_empty {
            let slot = self.queue_tx.read().await;
            match slot.as_ref() {
                Some(tx) => Some(tx.clone()),
                None => return Delivery::Dropped,
            }
        } else {
            None
        };

        let outcome = if deferrable {
            self.deliver_nonblocking(ctx, queue, event)
        } else {
            self.deliver_blocking(ctx, queue, event).await
        };
        tracing::trace!(
            id = self.id,
            policy = self.config.overflow.as_label(),
            deferrable,
            ?outcome,
            "delivery attempt"
        );
        outcome
    }

    fn deliver_nonblocking(
        &self,
        ctx: &CancellationToken,
        queue: Option<mpsc::Sender<E>>,
        event: E,
    ) -> Delivery {
        if ctx.is_cancelled() {
            return Delivery::Dropped;
        }
        if self.canceler.fired() {
            return Delivery::Unsubscribe;
        }

        let Some(queue) = queue else {
            // piled items are ahead of this event
            return self.pile_overflow(event, None);
        };

        match queue.try_send(event) {
            Ok(()) => Delivery::Sent,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Dropped,
            Err(mpsc::error::TrySendError::Full(event)) => match self.config.overflow {
                OverflowPolicy::Wait(_) | OverflowPolicy::WaitOrClose(_) => Delivery::Deferred,
                OverflowPolicy::Drop => Delivery::Dropped,
                OverflowPolicy::Close => Delivery::DroppedUnsubscribe,
                OverflowPolicy::PileUpOrClose { .. } => self.pile_overflow(event, Some(&queue)),
            },
        }
    }

    fn pile_overflow(&self, event: E, queue: Option<&mpsc::Sender<E>>) -> Delivery {
        let Some(pile) = self.pile_tx.as_ref() else {
            return Delivery::Dropped;
        };
        match pile.try_send(event) {
            Ok(()) => Delivery::Piled,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Dropped,
            Err(mpsc::error::TrySendError::Full(event)) => {
                // the drainer may have opened room in the main queue meanwhile
                if let Some(queue) = queue {
                    if queue.try_send(event).is_ok() {
                        return Delivery::Sent;
                    }
                }
                Delivery::DroppedUnsubscribe
            }
        }
    }

    async fn deliver_blocking(
        &self,
        ctx: &CancellationToken,
        queue: Option<mpsc::Sender<E>>,
        event: E,
    ) -> Delivery {
        let window = match self.config.overflow {
            OverflowPolicy::Wait(d) | OverflowPolicy::WaitOrClose(d) => d,
            other => unreachable!(
                "overflow policy {} must be fully resolved in the non-blocking pass",
                other.as_label()
            ),
        };
        let Some(queue) = queue else {
            return Delivery::Dropped;
        };

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

        // The subscription's own cancellation takes precedence over both
        // the pending send and the caller's cancellation.
        tokio::select! {
            biased;
            _ = self.canceler.token().cancelled() => Delivery::Unsubscribe,
            _ = ctx.cancelled() => Delivery::Dropped,
            sent = push => {
                if sent {
                    Delivery::Sent
                } else if matches!(self.config.overflow, OverflowPolicy::WaitOrClose(_))
                    && !ctx.is_cancelled()
                {
                    // genuine queue exhaustion, not the caller giving up
                    Delivery::DroppedUnsubscribe
                } else {
                    Delivery::Dropped
                }
            }
        }
    }
}
