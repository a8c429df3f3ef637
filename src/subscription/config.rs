//! # Subscription options and configuration resolution.
//!
//! A subscribe call takes a list of [`SubscribeOption`]s and folds them into
//! an immutable [`SubscriptionConfig`]. Options are order-independent at
//! resolution: later options of the same kind simply overwrite earlier ones.
//!
//! ## Defaults
//! - overflow policy: [`OverflowPolicy::Wait`]`(ZERO)` (wait forever);
//! - queue size: 1 (clamped to a minimum of 1);
//! - no lifecycle hooks.
//!
//! ## Lifecycle hooks
//! Hooks receive the subscription handle and a [`Feeder`]: direct, lock-free
//! write access to the delivery queue. The feeder exists because the
//! on-subscribed hook runs while the queue slot is write-locked against
//! regular senders; going through the slot from inside the hook would
//! deadlock.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::mpsc;

use crate::policy::OverflowPolicy;
use crate::subscription::Subscription;

/// Async lifecycle hook attached to a subscription.
///
/// Invoked with the subscription handle and a [`Feeder`] for the delivery
/// queue. The same shape serves all three hook points (before-subscribed,
/// on-subscribed, on-unsubscribe).
pub type SubscriptionHook<T, E> =
    Arc<dyn Fn(Arc<Subscription<T, E>>, Feeder<E>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Direct write access to a subscription's delivery queue.
///
/// Handed to lifecycle hooks so they can seed events even while the queue
/// slot is write-locked (the on-subscribed window) or closing (the
/// on-unsubscribe window, where feeding simply fails).
pub struct Feeder<E> {
    tx: mpsc::Sender<E>,
}

impl<E> Clone for Feeder<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> Feeder<E> {
    pub(crate) fn new(tx: mpsc::Sender<E>) -> Self {
        Self { tx }
    }

    /// Feeder over an already-closed queue: every feed fails.
    pub(crate) fn closed() -> Self {
        let (tx, _) = mpsc::channel(1);
        Self { tx }
    }

    /// Enqueues without waiting. Returns `false` when the queue is full or
    /// closed.
    pub fn try_feed(&self, event: E) -> bool {
        self.tx.try_send(event).is_ok()
    }

    /// Enqueues, waiting for room. Returns `false` when the queue closes
    /// while waiting.
    pub async fn feed(&self, event: E) -> bool {
        self.tx.send(event).await.is_ok()
    }
}

/// A single subscribe-time option.
///
/// Prefer the constructor helpers; they hide the hook boxing:
///
/// ```
/// use topicbus::{OverflowPolicy, SubscribeOption};
///
/// let opts: Vec<SubscribeOption<u64, u64>> = vec![
///     SubscribeOption::overflow(OverflowPolicy::Drop),
///     SubscribeOption::queue_size(16),
/// ];
/// ```
pub enum SubscribeOption<T, E> {
    /// Selects the overflow policy.
    Overflow(OverflowPolicy),
    /// Sets the delivery queue capacity (minimum 1).
    QueueSize(usize),
    /// Hook run synchronously before registration.
    BeforeSubscribed(SubscriptionHook<T, E>),
    /// Hook run as a spawned task while the queue is write-locked;
    /// readiness fires when it completes.
    OnSubscribed(SubscriptionHook<T, E>),
    /// Hook run during queue teardown, before the close transition.
    OnUnsubscribe(SubscriptionHook<T, E>),
}

impl<T, E> SubscribeOption<T, E> {
    /// Selects the overflow policy.
    pub fn overflow(policy: OverflowPolicy) -> Self {
        SubscribeOption::Overflow(policy)
    }

    /// Sets the delivery queue capacity (minimum 1).
    pub fn queue_size(size: usize) -> Self {
        SubscribeOption::QueueSize(size)
    }

    /// Attaches a hook that runs synchronously before registration, with
    /// access to the not-yet-registered subscription (e.g. to pre-seed its
    /// queue through the feeder).
    pub fn before_subscribed<F, Fut>(hook: F) -> Self
    where
        F: Fn(Arc<Subscription<T, E>>, Feeder<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        SubscribeOption::BeforeSubscribed(Arc::new(move |sub, feeder| {
            Box::pin(hook(sub, feeder))
        }))
    }

    /// Attaches a hook that runs as a spawned task while the queue slot is
    /// write-locked; the subscription reports ready once it completes.
    pub fn on_subscribed<F, Fut>(hook: F) -> Self
    where
        F: Fn(Arc<Subscription<T, E>>, Feeder<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        SubscribeOption::OnSubscribed(Arc::new(move |sub, feeder| Box::pin(hook(sub, feeder))))
    }

    /// Attaches a hook that runs during queue teardown, under the write
    /// lock, before the queue closes.
    pub fn on_unsubscribe<F, Fut>(hook: F) -> Self
    where
        F: Fn(Arc<Subscription<T, E>>, Feeder<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        SubscribeOption::OnUnsubscribe(Arc::new(move |sub, feeder| Box::pin(hook(sub, feeder))))
    }
}

/// Immutable per-subscription configuration, resolved once at subscribe
/// time.
pub struct SubscriptionConfig<T, E> {
    /// Strategy for a full delivery queue.
    pub overflow: OverflowPolicy,
    /// Delivery queue capacity (already clamped to a minimum of 1).
    pub queue_size: usize,
    pub(crate) before_subscribed: Option<SubscriptionHook<T, E>>,
    pub(crate) on_subscribed: Option<SubscriptionHook<T, E>>,
    pub(crate) on_unsubscribe: Option<SubscriptionHook<T, E>>,
}

impl<T, E> Default for SubscriptionConfig<T, E> {
    fn default() -> Self {
        Self {
            overflow: OverflowPolicy::default(),
            queue_size: 1,
            before_subscribed: None,
            on_subscribed: None,
            on_unsubscribe: None,
        }
    }
}

impl<T, E> SubscriptionConfig<T, E> {
    /// Folds a list of options into a configuration record.
    pub fn resolve(opts: impl IntoIterator<Item = SubscribeOption<T, E>>) -> Self {
        let mut cfg = Self::default();
        for opt in opts {
            match opt {
                SubscribeOption::Overflow(policy) => cfg.overflow = policy,
                SubscribeOption::QueueSize(size) => cfg.queue_size = size.max(1),
                SubscribeOption::BeforeSubscribed(hook) => cfg.before_subscribed = Some(hook),
                SubscribeOption::OnSubscribed(hook) => cfg.on_subscribed = Some(hook),
                SubscribeOption::OnUnsubscribe(hook) => cfg.on_unsubscribe = Some(hook),
            }
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let cfg: SubscriptionConfig<u64, u64> = SubscriptionConfig::resolve([]);
        assert_eq!(cfg.overflow, OverflowPolicy::Wait(Duration::ZERO));
        assert_eq!(cfg.queue_size, 1);
        assert!(cfg.before_subscribed.is_none());
        assert!(cfg.on_subscribed.is_none());
        assert!(cfg.on_unsubscribe.is_none());
    }

    #[test]
    fn test_later_options_win() {
        let cfg: SubscriptionConfig<u64, u64> = SubscriptionConfig::resolve([
            SubscribeOption::queue_size(4),
            SubscribeOption::overflow(OverflowPolicy::Drop),
            SubscribeOption::queue_size(8),
        ]);
        assert_eq!(cfg.queue_size, 8);
        assert_eq!(cfg.overflow, OverflowPolicy::Drop);
    }

    #[test]
    fn test_queue_size_clamped_to_one() {
        let cfg: SubscriptionConfig<u64, u64> =
            SubscriptionConfig::resolve([SubscribeOption::queue_size(0)]);
        assert_eq!(cfg.queue_size, 1);
    }
}
