//! # Overflow policies for full delivery queues.
//!
//! [`OverflowPolicy`] decides what happens when an event cannot be placed
//! into a subscription's bounded delivery queue without waiting. The policy
//! is chosen once at subscribe time and is immutable thereafter.
//!
//! ## Quick reference
//! | Policy            | Queue full behavior                                                |
//! |-------------------|--------------------------------------------------------------------|
//! | `Wait(d)`         | wait up to `d` (`ZERO` = forever); on timeout the event is dropped |
//! | `Drop`            | drop the event immediately                                         |
//! | `Close`           | drop the event and unsubscribe the subscription                    |
//! | `WaitOrClose(d)`  | like `Wait`, but a genuine wait timeout closes the subscription    |
//! | `PileUpOrClose`   | buffer into a secondary pile, drained in the background            |
//!
//! `WaitOrClose` closes only on queue exhaustion: if the *caller's* own
//! cancellation ends the wait, the subscription stays alive and the event is
//! merely dropped.
//!
//! `PileUpOrClose` absorbs bursts beyond the main queue into a pile of
//! `pile_size` items. A per-subscription drainer task moves piled items into
//! the main queue, waiting up to `timeout` per item (`ZERO` = forever). A
//! full pile, or a drain timeout, closes the subscription.

use std::time::Duration;

/// Strategy for handling a full delivery queue, selected at subscribe time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Wait up to the given duration for queue room (`ZERO` = forever);
    /// drop the event if the wait times out.
    Wait(Duration),

    /// Drop the event immediately, without waiting.
    Drop,

    /// Drop the event and unsubscribe the subscription.
    Close,

    /// Wait up to the given duration (`ZERO` = forever); a wait timeout
    /// closes the subscription, the caller's own cancellation does not.
    WaitOrClose(Duration),

    /// Buffer overflow into a secondary pile, drained in the background.
    PileUpOrClose {
        /// Capacity of the pile buffer (clamped to a minimum of 1).
        pile_size: usize,
        /// Per-item budget for draining into the main queue (`ZERO` = forever).
        timeout: Duration,
    },
}

impl Default for OverflowPolicy {
    /// Wait forever: publishers block in the deferred phase until the
    /// consumer drains.
    fn default() -> Self {
        OverflowPolicy::Wait(Duration::ZERO)
    }
}

impl OverflowPolicy {
    /// Returns `true` for policies resolved by a blocking wait after the
    /// registry lock is released.
    #[inline]
    #[must_use]
    pub fn may_defer(&self) -> bool {
        matches!(
            self,
            OverflowPolicy::Wait(_) | OverflowPolicy::WaitOrClose(_)
        )
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            OverflowPolicy::Wait(_) => "wait",
            OverflowPolicy::Drop => "drop",
            OverflowPolicy::Close => "close",
            OverflowPolicy::WaitOrClose(_) => "wait_or_close",
            OverflowPolicy::PileUpOrClose { .. } => "pile_up_or_close",
        }
    }
}
