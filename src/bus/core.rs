//! # The event bus: registration, two-phase broadcast, unsubscription.
//!
//! [`EventBus`] owns the topic registry behind a cancellation-aware lock and
//! implements the broadcast protocol:
//!
//! ## Two-phase send
//! ```text
//! send(topic, event)
//!   │
//!   ├─ Phase 1 (registry locked, strictly non-blocking)
//!   │    for every subscriber: deliver(deferrable = true)
//!   │      ├─ Sent / Piled / Dropped           → counted
//!   │      ├─ DroppedUnsubscribe / Unsubscribe → detach, async teardown
//!   │      └─ Deferred                         → collected for phase 2
//!   │
//!   └─ Phase 2 (lock released, may wait)
//!        one spawned attempt per deferred subscriber:
//!          deliver(deferrable = false) → SentDeferred / DroppedDeferred / close
//! ```
//!
//! ## Rules
//! - The registry lock's hold time is bounded by the non-blocking attempts;
//!   no publisher is ever stalled by another subscriber's wait.
//! - Phase 1 sees a consistent subscriber snapshot: registrations and
//!   removals cannot interleave with it.
//! - Phase 2 deliveries across subscribers are unordered relative to each
//!   other.
//! - Unsubscription is race-free against concurrent sends and repeated
//!   calls; queue teardown always runs as a detached task.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::bus::registry::Registry;
use crate::bus::report::SendReport;
use crate::error::SubscribeError;
use crate::subscription::{Delivery, SubscribeOption, Subscription, SubscriptionConfig};
use crate::sync::ChanLock;
use crate::topic::{Topic, TopicKey};

/// In-process, topic-addressed publish/subscribe bus with per-subscriber
/// backpressure policies.
///
/// Cheap to clone: clones share the same registry.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    registry: ChanLock<Registry>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                registry: ChanLock::new(Registry::default()),
            }),
        }
    }

    /// Subscribes under the default topic: the event type's
    /// [`Default`] value.
    ///
    /// See [`EventBus::subscribe_with_topic`] for the full contract.
    pub async fn subscribe<E>(
        &self,
        ctx: &CancellationToken,
        opts: impl IntoIterator<Item = SubscribeOption<E, E>>,
    ) -> Result<Arc<Subscription<E, E>>, SubscribeError>
    where
        E: Topic + Default,
    {
        self.subscribe_with_topic(ctx, E::default(), opts).await
    }

    /// Subscribes to events published under `topic`.
    ///
    /// Resolves `opts` into the subscription's immutable configuration,
    /// builds the subscription (spawning its pile drainer for
    /// `PileUpOrClose`), and registers it:
    /// 1. a before-subscribed hook runs synchronously, before registration,
    ///    with access to the not-yet-registered subscription;
    /// 2. an on-subscribed hook runs as a spawned task while the delivery
    ///    queue is write-locked; the subscription reports
    ///    [`ready`](Subscription::ready) once that task completes;
    /// 3. registration happens under the registry lock and fails only if
    ///    lock acquisition is cancelled ([`SubscribeError::Cancelled`]).
    pub async fn subscribe_with_topic<T, E>(
        &self,
        ctx: &CancellationToken,
        topic: T,
        opts: impl IntoIterator<Item = SubscribeOption<T, E>>,
    ) -> Result<Arc<Subscription<T, E>>, SubscribeError>
    where
        T: Topic,
        E: Send + 'static,
    {
        let config = SubscriptionConfig::resolve(opts);
        let (sub, feeder) = Subscription::new(ctx, self.clone(), topic.clone(), config);
        tracing::trace!(
            id = sub.id(),
            topic = std::any::type_name::<T>(),
            policy = sub.overflow_policy().as_label(),
            "subscribe"
        );

        if let Some(hook) = sub.hooks().before_subscribed.clone() {
            hook(Arc::clone(&sub), feeder.clone()).await;
        }

        let on_subscribed = sub.hooks().on_subscribed.clone();
        if let Some(hook) = on_subscribed.clone() {
            // Hold the queue write lock for the hook's duration so the very
            // first delivery cannot race it; readiness fires once the hook
            // task completes.
            let guard = Arc::clone(sub.queue_slot()).write_owned().await;
            let hook_sub = Arc::clone(&sub);
            let hook_feeder = feeder.clone();
            tokio::spawn(async move {
                hook(Arc::clone(&hook_sub), hook_feeder).await;
                drop(guard);
                hook_sub.set_ready();
                tracing::trace!(id = hook_sub.id(), "on-subscribed hook finished");
            });
        }

        {
            let Some(mut registry) = self.inner.registry.lock(ctx).await else {
                return Err(SubscribeError::Cancelled);
            };
            registry.insert(
                TopicKey::of(topic),
                sub.id(),
                Arc::clone(&sub) as Arc<dyn Any + Send + Sync>,
            );
        }

        if on_subscribed.is_none() {
            sub.set_ready();
        }
        Ok(sub)
    }

    /// Broadcasts under the default topic: the event type's [`Default`]
    /// value.
    ///
    /// See [`EventBus::send_with_topic`] for the full contract.
    pub async fn send<E>(&self, ctx: &CancellationToken, event: E) -> SendReport
    where
        E: Topic + Default,
    {
        self.send_with_topic(ctx, E::default(), event).await
    }

    /// Broadcasts `event` to every subscription registered under `topic`,
    /// returning per-call delivery counters.
    ///
    /// Phase 1 classifies every subscriber without blocking while the
    /// registry is locked; phase 2 runs one concurrent blocking attempt per
    /// deferred subscriber after the lock is released and waits for all of
    /// them.
    ///
    /// If lock acquisition is cancelled, the report carries
    /// [`SendReport::DROPPED_UNKNOWN`] since the subscriber count cannot be
    /// safely read. If `ctx` is already done under the lock, every current
    /// subscriber of the topic counts as an immediate drop and no queue is
    /// touched.
    pub async fn send_with_topic<T, E>(
        &self,
        ctx: &CancellationToken,
        topic: T,
        event: E,
    ) -> SendReport
    where
        T: Topic,
        E: Clone + Send + 'static,
    {
        let mut report = SendReport::default();
        let key = TopicKey::of(topic);
        tracing::trace!(topic = key.type_name(), "send: phase 1");

        // Registry-locked zone: act swiftly, never wait on a subscriber.
        let deferred: Vec<Arc<Subscription<T, E>>> = {
            let Some(mut registry) = self.inner.registry.lock(ctx).await else {
                report.dropped_immediate = SendReport::DROPPED_UNKNOWN;
                return report;
            };

            let (total, subs) = match registry.subscribers(&key) {
                None => return report,
                Some(set) => {
                    let subs: Vec<Arc<Subscription<T, E>>> = set
                        .values()
                        .filter_map(|any| match Arc::clone(any).downcast::<Subscription<T, E>>() {
                            Ok(sub) => Some(sub),
                            Err(_) => {
                                tracing::error!(
                                    topic = key.type_name(),
                                    event = std::any::type_name::<E>(),
                                    "subscription event type mismatch, skipping subscriber"
                                );
                                None
                            }
                        })
                        .collect();
                    (set.len(), subs)
                }
            };

            if ctx.is_cancelled() {
                report.dropped_immediate = total;
                return report;
            }

            let mut deferred = Vec::new();
            for sub in subs {
                match sub.deliver(ctx, event.clone(), true).await {
                    Delivery::Sent => report.sent_immediate += 1,
                    Delivery::Piled => report.piled += 1,
                    Delivery::Dropped => report.dropped_immediate += 1,
                    Delivery::DroppedUnsubscribe => {
                        report.dropped_immediate += 1;
                        if sub.begin_close().await {
                            registry.detach(&sub);
                        }
                    }
                    Delivery::Unsubscribe => {
                        if sub.begin_close().await {
                            registry.detach(&sub);
                        }
                    }
                    Delivery::Deferred => deferred.push(sub),
                }
            }
            deferred
        };

        // Lock-free zone: deferred attempts may wait.
        if deferred.is_empty() {
            return report;
        }
        tracing::trace!(
            topic = key.type_name(),
            deferred = deferred.len(),
            "send: phase 2"
        );

        let mut attempts = Vec::with_capacity(deferred.len());
        for sub in deferred {
            let ctx = ctx.clone();
            let event = event.clone();
            let bus = self.clone();
            attempts.push(tokio::spawn(async move {
                let outcome = sub.deliver(&ctx, event, false).await;
                if matches!(
                    outcome,
                    Delivery::DroppedUnsubscribe | Delivery::Unsubscribe
                ) {
                    // teardown must not observe the caller's cancellation
                    bus.unsubscribe(&CancellationToken::new(), &sub).await;
                }
                outcome
            }));
        }
        for attempt in attempts {
            match attempt.await {
                Ok(Delivery::Sent) => report.sent_deferred += 1,
                Ok(Delivery::Dropped | Delivery::DroppedUnsubscribe) => {
                    report.dropped_deferred += 1;
                }
                Ok(Delivery::Unsubscribe) => {}
                Ok(outcome @ (Delivery::Piled | Delivery::Deferred)) => {
                    unreachable!("blocking pass returned {outcome:?}")
                }
                Err(err) => {
                    tracing::error!(error = %err, "deferred delivery task failed");
                }
            }
        }
        report
    }

    /// Unsubscribes `sub`: triggers cancellation, spawns the asynchronous
    /// queue teardown, and detaches the registry entry.
    ///
    /// Returns `false` when the subscription was already finished (queue
    /// closed) or already detached. Safe to call repeatedly and from
    /// concurrent paths; the queue still closes exactly once.
    pub async fn unsubscribe<T, E>(
        &self,
        ctx: &CancellationToken,
        sub: &Arc<Subscription<T, E>>,
    ) -> bool
    where
        T: Topic,
        E: Send + 'static,
    {
        tracing::trace!(id = sub.id(), "unsubscribe");
        if !sub.begin_close().await {
            return false;
        }
        let Some(mut registry) = self.inner.registry.lock(ctx).await else {
            return false;
        };
        registry.detach(sub)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::policy::OverflowPolicy;
    use crate::subscription::SubscribeOption;

    #[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
    struct Tick(u64);

    fn opts(policy: OverflowPolicy, queue: usize) -> Vec<SubscribeOption<Tick, Tick>> {
        vec![
            SubscribeOption::overflow(policy),
            SubscribeOption::queue_size(queue),
        ]
    }

    #[tokio::test]
    async fn test_send_without_subscribers_is_empty() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();

        let report = bus.send(&ctx, Tick(1)).await;
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_drop_policy_drops_on_full_queue() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus
            .subscribe(&ctx, opts(OverflowPolicy::Drop, 1))
            .await
            .expect("subscribe");

        let first = bus.send(&ctx, Tick(1)).await;
        assert_eq!(first.sent_immediate, 1);

        let second = bus.send(&ctx, Tick(2)).await;
        assert_eq!(second.dropped_immediate, 1);
        assert_eq!(second.total_sent(), 0);

        assert_eq!(sub.try_recv(), Some(Tick(1)));
        assert_eq!(sub.try_recv(), None);
        assert!(!sub.is_done());
        sub.finish(&ctx).await;
    }

    #[tokio::test]
    async fn test_wait_policy_defers_until_consumer_drains() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus
            .subscribe(&ctx, opts(OverflowPolicy::Wait(Duration::ZERO), 1))
            .await
            .expect("subscribe");

        assert_eq!(bus.send(&ctx, Tick(1)).await.sent_immediate, 1);

        let pending = {
            let bus = bus.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { bus.send(&ctx, Tick(2)).await })
        };
        // let the send reach its deferred, blocking attempt
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(sub.recv().await, Some(Tick(1)));
        let report = pending.await.expect("send task");
        assert_eq!(report.sent_deferred, 1);
        assert_eq!(report.total_dropped(), 0);

        assert_eq!(sub.recv().await, Some(Tick(2)));
        sub.finish(&ctx).await;
    }

    #[tokio::test]
    async fn test_unsubscribe_during_deferred_send_reports_nothing() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus
            .subscribe(&ctx, opts(OverflowPolicy::Wait(Duration::ZERO), 1))
            .await
            .expect("subscribe");

        assert_eq!(bus.send(&ctx, Tick(1)).await.sent_immediate, 1);

        let pending = {
            let bus = bus.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { bus.send(&ctx, Tick(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(sub.finish(&ctx).await);
        let report = pending.await.expect("send task");
        // an unsubscribed target counts as neither sent nor dropped
        assert!(report.is_empty());

        sub.finished().await;
        assert_eq!(sub.recv().await, Some(Tick(1)));
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_close_policy_closes_on_full_queue() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus
            .subscribe(&ctx, opts(OverflowPolicy::Close, 1))
            .await
            .expect("subscribe");

        assert_eq!(bus.send(&ctx, Tick(1)).await.sent_immediate, 1);

        let report = bus.send(&ctx, Tick(2)).await;
        assert_eq!(report.dropped_immediate, 1);

        sub.finished().await;
        assert!(sub.is_done());
        assert_eq!(sub.recv().await, Some(Tick(1)));
        assert_eq!(sub.recv().await, None);

        // already gone from the registry
        assert!(bus.send(&ctx, Tick(3)).await.is_empty());
    }

    #[tokio::test]
    async fn test_pile_up_or_close_piles_then_closes_on_stuck_consumer() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus
            .subscribe(
                &ctx,
                opts(
                    OverflowPolicy::PileUpOrClose {
                        pile_size: 1,
                        timeout: Duration::from_millis(50),
                    },
                    1,
                ),
            )
            .await
            .expect("subscribe");

        assert_eq!(bus.send(&ctx, Tick(1)).await.sent_immediate, 1);
        assert_eq!(bus.send(&ctx, Tick(2)).await.piled, 1);

        // nobody drains: the drainer's per-item window expires and closes us
        sub.finished().await;
        assert_eq!(sub.recv().await, Some(Tick(1)));
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_pile_preserves_delivery_order() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus
            .subscribe(
                &ctx,
                opts(
                    OverflowPolicy::PileUpOrClose {
                        pile_size: 4,
                        timeout: Duration::ZERO,
                    },
                    1,
                ),
            )
            .await
            .expect("subscribe");

        assert_eq!(bus.send(&ctx, Tick(1)).await.sent_immediate, 1);
        assert_eq!(bus.send(&ctx, Tick(2)).await.piled, 1);
        assert_eq!(bus.send(&ctx, Tick(3)).await.piled, 1);

        assert_eq!(sub.recv().await, Some(Tick(1)));
        assert_eq!(sub.recv().await, Some(Tick(2)));
        assert_eq!(sub.recv().await, Some(Tick(3)));
        sub.finish(&ctx).await;
    }

    #[tokio::test]
    async fn test_every_event_accounted_across_subscribers() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();

        let mut subs = Vec::new();
        let mut consumers = Vec::new();
        for _ in 0..3 {
            let sub = bus
                .subscribe(&ctx, opts(OverflowPolicy::Wait(Duration::ZERO), 2))
                .await
                .expect("subscribe");
            subs.push(Arc::clone(&sub));
            consumers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(event) = sub.recv().await {
                    seen.push(event);
                }
                seen
            }));
        }

        for i in 0..20u64 {
            let report = bus.send(&ctx, Tick(i)).await;
            assert_eq!(report.total_sent(), 3, "send #{i}: {report:?}");
            assert_eq!(report.total_dropped(), 0, "send #{i}: {report:?}");
        }

        for sub in &subs {
            assert!(sub.finish(&ctx).await);
            sub.finished().await;
        }
        let expected: Vec<Tick> = (0..20).map(Tick).collect();
        for consumer in consumers {
            let seen = consumer.await.expect("consumer");
            assert_eq!(seen, expected);
        }
    }

    #[tokio::test]
    async fn test_per_subscriber_fifo_order() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus
            .subscribe(&ctx, opts(OverflowPolicy::Wait(Duration::ZERO), 2))
            .await
            .expect("subscribe");

        let consumer = {
            let sub = Arc::clone(&sub);
            tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(event) = sub.recv().await {
                    seen.push(event);
                }
                seen
            })
        };

        for i in 0..20u64 {
            let report = bus.send(&ctx, Tick(i)).await;
            assert_eq!(report.total_sent(), 1, "send #{i}: {report:?}");
        }

        assert!(sub.finish(&ctx).await);
        sub.finished().await;
        let seen = consumer.await.expect("consumer");
        assert_eq!(seen, (0..20).map(Tick).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();

        let alpha = bus
            .subscribe_with_topic::<String, u32>(
                &ctx,
                "alpha".to_string(),
                [SubscribeOption::queue_size(4)],
            )
            .await
            .expect("subscribe alpha");
        let beta = bus
            .subscribe_with_topic::<String, u32>(
                &ctx,
                "beta".to_string(),
                [SubscribeOption::queue_size(4)],
            )
            .await
            .expect("subscribe beta");

        let report = bus.send_with_topic(&ctx, "alpha".to_string(), 7u32).await;
        assert_eq!(report.sent_immediate, 1);

        assert_eq!(alpha.recv().await, Some(7));
        assert!(bus.send_with_topic(&ctx, "gamma".to_string(), 0u32).await.is_empty());

        alpha.finish(&ctx).await;
        beta.finish(&ctx).await;
    }

    #[tokio::test]
    async fn test_equal_values_of_distinct_topic_types_do_not_collide() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();

        let narrow = bus
            .subscribe_with_topic::<u32, Tick>(&ctx, 1u32, [])
            .await
            .expect("subscribe u32 topic");
        let wide = bus
            .subscribe_with_topic::<u64, Tick>(&ctx, 1u64, [])
            .await
            .expect("subscribe u64 topic");

        let report = bus.send_with_topic(&ctx, 1u32, Tick(9)).await;
        assert_eq!(report.sent_immediate, 1);
        assert_eq!(narrow.recv().await, Some(Tick(9)));

        narrow.finish(&ctx).await;
        wide.finish(&ctx).await;
    }

    #[tokio::test]
    async fn test_event_type_mismatch_skips_subscriber() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();

        let matching = bus
            .subscribe_with_topic::<String, u32>(&ctx, "mixed".to_string(), [])
            .await
            .expect("subscribe u32 events");
        let mismatched = bus
            .subscribe_with_topic::<String, String>(&ctx, "mixed".to_string(), [])
            .await
            .expect("subscribe String events");

        let report = bus.send_with_topic(&ctx, "mixed".to_string(), 7u32).await;
        assert_eq!(report.sent_immediate, 1);
        assert_eq!(matching.recv().await, Some(7));

        matching.finish(&ctx).await;
        mismatched.finish(&ctx).await;
    }

    #[tokio::test]
    async fn test_subscribe_with_cancelled_token_fails() {
        let ctx = CancellationToken::new();
        ctx.cancel();

        let bus = EventBus::new();
        let result = bus.subscribe::<Tick>(&ctx, []).await;
        assert!(matches!(result, Err(SubscribeError::Cancelled)));
    }

    #[tokio::test]
    async fn test_send_with_cancelled_token_reports_unknown_drop() {
        let ctx = CancellationToken::new();
        ctx.cancel();

        let bus = EventBus::new();
        let report = bus.send(&ctx, Tick(1)).await;
        assert_eq!(report.dropped_immediate, SendReport::DROPPED_UNKNOWN);
        assert_eq!(report.total_sent(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus.subscribe::<Tick>(&ctx, []).await.expect("subscribe");

        assert!(sub.finish(&ctx).await);
        sub.finished().await;
        assert!(!sub.finish(&ctx).await);
        assert!(!bus.unsubscribe(&ctx, &sub).await);
    }

    #[tokio::test]
    async fn test_before_subscribed_seeds_the_queue() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus
            .subscribe::<Tick>(
                &ctx,
                [
                    SubscribeOption::queue_size(4),
                    SubscribeOption::before_subscribed(|_sub, feeder| async move {
                        assert!(feeder.try_feed(Tick(99)));
                    }),
                ],
            )
            .await
            .expect("subscribe");

        assert_eq!(bus.send(&ctx, Tick(1)).await.sent_immediate, 1);
        assert_eq!(sub.recv().await, Some(Tick(99)));
        assert_eq!(sub.recv().await, Some(Tick(1)));
        sub.finish(&ctx).await;
    }

    #[tokio::test]
    async fn test_on_subscribed_gates_readiness() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus
            .subscribe::<Tick>(
                &ctx,
                [
                    SubscribeOption::queue_size(4),
                    SubscribeOption::on_subscribed(|_sub, feeder| async move {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        assert!(feeder.try_feed(Tick(0)));
                    }),
                ],
            )
            .await
            .expect("subscribe");

        assert!(!sub.is_ready());
        sub.ready().await;
        assert!(sub.is_ready());

        assert_eq!(bus.send(&ctx, Tick(1)).await.sent_immediate, 1);
        // the hook's marker was enqueued before any regular delivery
        assert_eq!(sub.recv().await, Some(Tick(0)));
        assert_eq!(sub.recv().await, Some(Tick(1)));
        sub.finish(&ctx).await;
    }

    #[tokio::test]
    async fn test_on_unsubscribe_runs_exactly_once() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let hook_calls = Arc::clone(&calls);
        let sub = bus
            .subscribe::<Tick>(
                &ctx,
                [SubscribeOption::on_unsubscribe(move |_sub, _feeder| {
                    let calls = Arc::clone(&hook_calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                    }
                })],
            )
            .await
            .expect("subscribe");

        assert!(sub.finish(&ctx).await);
        sub.finished().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(!sub.finish(&ctx).await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wait_or_close_timeout_closes_subscription() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus
            .subscribe(
                &ctx,
                opts(OverflowPolicy::WaitOrClose(Duration::from_millis(50)), 1),
            )
            .await
            .expect("subscribe");

        assert_eq!(bus.send(&ctx, Tick(1)).await.sent_immediate, 1);

        let report = bus.send(&ctx, Tick(2)).await;
        assert_eq!(report.dropped_deferred, 1);

        sub.finished().await;
        assert_eq!(sub.recv().await, Some(Tick(1)));
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_wait_or_close_caller_cancellation_only_drops() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus
            .subscribe(
                &ctx,
                opts(OverflowPolicy::WaitOrClose(Duration::from_secs(10)), 1),
            )
            .await
            .expect("subscribe");

        assert_eq!(bus.send(&ctx, Tick(1)).await.sent_immediate, 1);

        let send_ctx = ctx.child_token();
        let pending = {
            let bus = bus.clone();
            let send_ctx = send_ctx.clone();
            tokio::spawn(async move { bus.send(&send_ctx, Tick(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        send_ctx.cancel();

        let report = pending.await.expect("send task");
        assert_eq!(report.dropped_deferred, 1);

        // the caller gave up; the subscription must survive
        assert!(!sub.is_done());
        assert!(!sub.is_finished());
        assert_eq!(sub.recv().await, Some(Tick(1)));
        assert!(sub.finish(&ctx).await);
    }

    #[tokio::test]
    async fn test_default_topic_is_the_default_value() {
        let ctx = CancellationToken::new();
        let bus = EventBus::new();
        let sub = bus
            .subscribe::<Tick>(&ctx, [SubscribeOption::queue_size(4)])
            .await
            .expect("subscribe");

        // routed by Tick::default(), regardless of the event's own value
        assert_eq!(bus.send(&ctx, Tick(5)).await.sent_immediate, 1);
        assert_eq!(sub.recv().await, Some(Tick(5)));

        // an explicit non-default topic is a different address
        assert!(bus.send_with_topic(&ctx, Tick(9), Tick(9)).await.is_empty());
        sub.finish(&ctx).await;
    }
}
