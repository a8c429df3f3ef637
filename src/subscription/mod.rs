//! # Subscriptions: delivery queues, overflow state, lifecycle.
//!
//! This module groups everything that belongs to a single consumer's
//! registration:
//! - [`Subscription`] the handle: bounded delivery queue, lifecycle signals
//!   (`done`/`ready`/`finished`), close discipline;
//! - [`SubscribeOption`] / [`SubscriptionConfig`] subscribe-time options and
//!   their resolution into an immutable configuration record;
//! - [`Feeder`] lock-free queue access for lifecycle hooks;
//! - `delivery`: the per-subscription send algorithm (non-blocking and
//!   blocking passes);
//! - `drainer`: the background task flushing the `PileUpOrClose` pile.
//!
//! ## Wiring
//! ```text
//! EventBus::send ── deliver(deferrable=true) ──► [main queue] ──► recv()
//!        │                │ full                     ▲
//!        │                └─► policy: defer / drop / close / pile
//!        │                                  [pile] ──┘ (drainer task)
//!        └── deliver(deferrable=false), after the registry lock drops
//! ```

mod config;
mod delivery;
mod drainer;
mod handle;

pub use config::{Feeder, SubscribeOption, SubscriptionConfig, SubscriptionHook};
pub use handle::Subscription;

pub(crate) use delivery::Delivery;
