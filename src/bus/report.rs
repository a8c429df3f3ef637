//! # Broadcast outcome counters.
//!
//! [`SendReport`] splits delivery counts along two axes:
//! - **immediate vs. deferred**: resolved during the locked, non-blocking
//!   registry scan vs. by a blocking wait after the lock was released;
//! - **sent vs. piled vs. dropped**.
//!
//! The split exists so the fast path (subscribers with room) never pays for
//! the slow path (subscribers that must wait), and so callers can tell the
//! two apart.

/// Per-call delivery counters returned by
/// [`EventBus::send`](crate::EventBus::send).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SendReport {
    /// Events placed into a subscriber's queue during the locked,
    /// non-blocking pass.
    pub sent_immediate: usize,
    /// Events placed by a blocking wait after the registry lock was
    /// released.
    pub sent_deferred: usize,
    /// Events absorbed by a `PileUpOrClose` pile buffer.
    pub piled: usize,
    /// Events dropped during the locked pass.
    ///
    /// When registry lock acquisition itself is cancelled the subscriber
    /// count cannot be safely read, and this field carries the saturating
    /// sentinel [`SendReport::DROPPED_UNKNOWN`] instead of a real count.
    pub dropped_immediate: usize,
    /// Events dropped after a blocking wait (timeout or caller
    /// cancellation).
    pub dropped_deferred: usize,
}

impl SendReport {
    /// Sentinel for "every subscriber dropped, exact count unknown",
    /// reported when the registry lock could not be acquired.
    pub const DROPPED_UNKNOWN: usize = usize::MAX;

    /// Total successfully delivered events (immediate + deferred).
    #[must_use]
    pub fn total_sent(&self) -> usize {
        self.sent_immediate.saturating_add(self.sent_deferred)
    }

    /// Total dropped events (immediate + deferred).
    #[must_use]
    pub fn total_dropped(&self) -> usize {
        self.dropped_immediate.saturating_add(self.dropped_deferred)
    }

    /// `true` when nothing was sent, piled or dropped (e.g. a topic with no
    /// subscribers).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
