//! # Subscription handle and lifecycle.
//!
//! A [`Subscription`] owns one consumer's bounded delivery queue, its
//! overflow policy, its pile buffer (PileUpOrClose only) and three lifecycle
//! signals:
//! - **done**: cancellation; fired by unsubscription (explicit or
//!   policy-driven), makes the subscription invisible to new sends;
//! - **ready**: setup complete, including any asynchronous on-subscribed
//!   hook;
//! - **finished**: the delivery queue has been closed.
//!
//! ## Queue close discipline
//! The queue's sender sits in a slot behind a reader/writer lock. Senders
//! and the pile drainer clone it under the read lock and release the lock
//! before waiting; teardown takes the write lock, runs the on-unsubscribe
//! hook, then empties the slot exactly once. The channel itself guarantees
//! there is no write-after-close: a cloned sender at worst delays the
//! consumer's end-of-stream until its (cancellation-bounded) wait ends.
//!
//! ## Ownership
//! The bus registry holds the handle for membership only; the consumer owns
//! it and should eventually call [`Subscription::finish`], though an
//! overflow policy or the drainer may finish it first.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::policy::OverflowPolicy;
use crate::subscription::config::{Feeder, SubscriptionConfig};
use crate::subscription::drainer;
use crate::sync::Trigger;
use crate::topic::Topic;

/// Process-unique subscription identities.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(0);

/// One consumer's registration on the bus: delivery queue, overflow state
/// and lifecycle signals.
pub struct Subscription<T, E> {
    pub(super) id: u64,
    pub(super) topic: T,
    pub(super) bus: EventBus,
    pub(super) canceler: Trigger,
    pub(super) readier: Trigger,
    pub(super) finished: Trigger,
    pub(super) queue_tx: Arc<RwLock<Option<mpsc::Sender<E>>>>,
    pub(super) queue_rx: Mutex<mpsc::Receiver<E>>,
    pub(super) pile_tx: Option<mpsc::Sender<E>>,
    pub(super) config: SubscriptionConfig<T, E>,
}

impl<T, E> Subscription<T, E>
where
    T: Topic,
    E: Send + 'static,
{
    /// Builds the subscription and, for `PileUpOrClose`, spawns its pile
    /// drainer. Returns the handle together with a transient [`Feeder`]
    /// used for the lifecycle hooks of the subscribe path.
    pub(crate) fn new(
        ctx: &CancellationToken,
        bus: EventBus,
        topic: T,
        config: SubscriptionConfig<T, E>,
    ) -> (Arc<Self>, Feeder<E>) {
        let (tx, rx) = mpsc::channel(config.queue_size.max(1));
        let feeder = Feeder::new(tx.clone());

        let (pile_tx, pile_rx) = match config.overflow {
            OverflowPolicy::PileUpOrClose { pile_size, .. } => {
                let (ptx, prx) = mpsc::channel(pile_size.max(1));
                (Some(ptx), Some(prx))
            }
            _ => (None, None),
        };

        let sub = Arc::new(Self {
            id: NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed),
            topic,
            bus,
            canceler: Trigger::child_of(ctx),
            readier: Trigger::child_of(ctx),
            finished: Trigger::new(),
            queue_tx: Arc::new(RwLock::new(Some(tx))),
            queue_rx: Mutex::new(rx),
            pile_tx,
            config,
        });

        if let Some(pile_rx) = pile_rx {
            let window = match sub.config.overflow {
                OverflowPolicy::PileUpOrClose { timeout, .. } => timeout,
                _ => std::time::Duration::ZERO,
            };
            tokio::spawn(drainer::run(
                ctx.clone(),
                Arc::clone(&sub),
                pile_rx,
                window,
            ));
        }

        (sub, feeder)
    }

    /// Process-unique identity of this subscription.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The topic this subscription is registered under.
    #[must_use]
    pub fn topic(&self) -> &T {
        &self.topic
    }

    /// The overflow policy selected at subscribe time.
    #[must_use]
    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.config.overflow
    }

    /// Receives the next delivered event.
    ///
    /// Returns `None` once the subscription has been finished and the queue
    /// fully drained.
    pub async fn recv(&self) -> Option<E> {
        let mut rx = self.queue_rx.lock().await;
        rx.recv().await
    }

    /// Receives without waiting.
    ///
    /// Returns `None` when the queue is currently empty or closed, or when
    /// a concurrent [`Subscription::recv`] holds the receiver.
    #[must_use]
    pub fn try_recv(&self) -> Option<E> {
        let mut rx = self.queue_rx.try_lock().ok()?;
        rx.try_recv().ok()
    }

    /// Waits for the cancellation signal. Fired by unsubscription, whether
    /// explicit or policy-driven.
    pub async fn done(&self) {
        self.canceler.done().await;
    }

    /// Returns `true` once the subscription has been cancelled.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.canceler.fired()
    }

    /// Waits for setup to complete, including any asynchronous
    /// on-subscribed hook.
    pub async fn ready(&self) {
        self.readier.done().await;
    }

    /// Returns `true` once setup has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.readier.fired()
    }

    /// Waits for the delivery queue to be closed. This is the last
    /// lifecycle signal a subscription emits.
    pub async fn finished(&self) {
        self.finished.done().await;
    }

    /// Returns `true` once the delivery queue has been closed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.fired()
    }

    /// Unsubscribes from the bus. Equivalent to
    /// [`EventBus::unsubscribe`](crate::EventBus::unsubscribe); returns
    /// `false` if the subscription was already finished or detached.
    pub async fn finish(self: &Arc<Self>, ctx: &CancellationToken) -> bool {
        let bus = self.bus.clone();
        bus.unsubscribe(ctx, self).await
    }

    /// Triggers cancellation and, when the queue is still open, spawns the
    /// asynchronous teardown: write-lock the slot, run the on-unsubscribe
    /// hook, close the queue exactly once, fire `finished`.
    ///
    /// Returns `false` when the queue was already closed (or closing).
    pub(crate) async fn begin_close(self: &Arc<Self>) -> bool {
        self.canceler.trigger();

        let open = self.queue_tx.read().await.is_some();
        if !open {
            return false;
        }

        let sub = Arc::clone(self);
        let slot = Arc::clone(&self.queue_tx);
        tokio::spawn(async move {
            let mut slot = slot.write_owned().await;
            if let Some(hook) = sub.config.on_unsubscribe.clone() {
                let feeder = match slot.as_ref() {
                    Some(tx) => Feeder::new(tx.clone()),
                    None => Feeder::closed(),
                };
                hook(Arc::clone(&sub), feeder).await;
            }
            if let Some(tx) = slot.take() {
                drop(tx);
                sub.finished.trigger();
                tracing::trace!(id = sub.id, "subscription queue closed");
            }
        });
        true
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        self.canceler.token()
    }

    pub(crate) fn queue_slot(&self) -> &Arc<RwLock<Option<mpsc::Sender<E>>>> {
        &self.queue_tx
    }

    pub(crate) fn set_ready(&self) {
        self.readier.trigger();
    }

    pub(crate) fn hooks(&self) -> &SubscriptionConfig<T, E> {
        &self.config
    }
}
