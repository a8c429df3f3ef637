//! # topicbus
//!
//! **Topicbus** is an in-process, topic-addressed publish/subscribe bus for
//! async Rust.
//!
//! Publishers broadcast typed events to every subscription registered under
//! a topic; each subscription owns a bounded delivery queue and decides,
//! through its overflow policy, what happens when that queue is full. One
//! slow consumer never stalls the publisher or its peers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  send(topic, event)
//!        │
//!        ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  EventBus                                                 │
//! │  - Registry: TopicKey ─► { id ─► Subscription }           │
//! │  - ChanLock (cancellation-aware registry lock)            │
//! └──────┬──────────────────────┬──────────────────────┬──────┘
//!        ▼                      ▼                      ▼
//! ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//! │ Subscription │      │ Subscription │      │ Subscription │
//! │ queue [====] │      │ queue [==  ] │      │ queue [====] │
//! │ Wait         │      │ Drop         │      │ PileUpOrClose│
//! │   │ full     │      │   │ room     │      │   │ full     │
//! │   ▼          │      │   ▼          │      │   ▼          │
//! │ deferred,    │      │ sent         │      │ pile [==  ]  │
//! │ waits after  │      │ immediately  │      │   │ drainer  │
//! │ lock release │      │              │      │   ▼ task     │
//! └──────┬───────┘      └──────┬───────┘      └──────┬───────┘
//!        ▼                     ▼                     ▼
//!     recv()                recv()                recv()
//! ```
//!
//! ### Subscription lifecycle
//! ```text
//! subscribe(topic, opts)
//!   ├─► resolve options (policy, queue size, hooks)
//!   ├─► before-subscribed hook (inline, pre-registration)
//!   ├─► on-subscribed hook (spawned, queue write-locked)
//!   │       └─► ready() fires when the hook task completes
//!   └─► register under the topic
//!
//! unsubscribe(sub)                ─┐
//! Close / WaitOrClose /           ├─► cancel ─► detach ─► teardown task:
//! PileUpOrClose policy fires      ─┘             on-unsubscribe hook,
//!                                                close queue once,
//!                                                finished() fires
//! ```
//!
//! ## Features
//! | Area           | Description                                                   | Key types                                 |
//! |----------------|---------------------------------------------------------------|-------------------------------------------|
//! | **Bus**        | Topic-addressed broadcast with per-call delivery counters.    | [`EventBus`], [`SendReport`]              |
//! | **Policies**   | Per-subscriber reaction to a full queue.                      | [`OverflowPolicy`]                        |
//! | **Lifecycle**  | Subscribe-time options and async hooks with queue access.     | [`SubscribeOption`], [`Feeder`]           |
//! | **Receiving**  | Bounded queue, `done`/`ready`/`finished` signals.             | [`Subscription`]                          |
//! | **Topics**     | Any hashable, comparable, clonable type addresses a topic.    | [`Topic`], [`TopicKey`]                   |
//! | **Sync**       | Cancellation-aware lock and one-shot signal primitives.       | [`ChanLock`], [`Trigger`]                 |
//! | **Errors**     | Typed subscribe failures.                                     | [`SubscribeError`]                        |
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use topicbus::{EventBus, OverflowPolicy, SubscribeOption};
//!
//! #[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
//! struct Tick(u64);
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = CancellationToken::new();
//!     let bus = EventBus::new();
//!
//!     // Subscribe under the default topic (Tick's Default value).
//!     let sub = bus
//!         .subscribe(&ctx, [
//!             SubscribeOption::queue_size(8),
//!             SubscribeOption::overflow(OverflowPolicy::Drop),
//!         ])
//!         .await?;
//!
//!     let report = bus.send(&ctx, Tick(1)).await;
//!     assert_eq!(report.total_sent(), 1);
//!
//!     assert_eq!(sub.recv().await, Some(Tick(1)));
//!
//!     sub.finish(&ctx).await;
//!     Ok(())
//! }
//! ```
mod bus;
mod error;
mod policy;
mod subscription;
mod sync;
mod topic;

// ---- Public re-exports ----

pub use bus::{EventBus, SendReport};
pub use error::SubscribeError;
pub use policy::OverflowPolicy;
pub use subscription::{Feeder, SubscribeOption, Subscription, SubscriptionConfig, SubscriptionHook};
pub use sync::{ChanLock, ChanLockGuard, Trigger};
pub use topic::{Topic, TopicKey};
