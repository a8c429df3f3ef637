//! Coordination primitives shared across the bus.
//!
//! ## Contents
//! - [`Trigger`] one-shot, idempotent lifecycle signal with an observable
//!   done state (cancellation, readiness, completion of subscriptions);
//! - [`ChanLock`] cancellation-aware mutual exclusion guarding the bus
//!   registry.
//!
//! Both are deliberately small: delivery-path waiting is expressed with the
//! bounded queues themselves, not with these primitives.

mod chan_lock;
mod trigger;

pub use chan_lock::{ChanLock, ChanLockGuard};
pub use trigger::Trigger;
