//! # One-shot lifecycle signal.
//!
//! Provides [`Trigger`] a fire-once, idempotent signal with an observable
//! "done" state. Subscriptions carry three of them:
//! - **canceler**: fired on unsubscription; makes the subscription invisible
//!   to new sends;
//! - **readier**: fired when subscription setup completes (including any
//!   asynchronous on-subscribed hook);
//! - **finished**: fired when the delivery queue has been closed.
//!
//! ## Rules
//! - Firing twice is safe; the second call is a no-op.
//! - Once fired, the done state is permanently set.
//! - A trigger built with [`Trigger::child_of`] also fires when its parent
//!   token fires.

use tokio_util::sync::CancellationToken;

/// Fire-once signal with an observable done state.
///
/// Thin wrapper over [`CancellationToken`]: `cancel()` is already idempotent
/// and `cancelled()` resolves for every waiter, past and future, once fired.
#[derive(Debug)]
pub struct Trigger {
    token: CancellationToken,
}

impl Trigger {
    /// Creates a standalone trigger that only fires when [`Trigger::trigger`] is called.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Creates a trigger that additionally fires when `parent` is cancelled.
    ///
    /// Used for the cancellation and readiness signals of a subscription,
    /// which must observe the shutdown of the context they were created under.
    #[must_use]
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
        }
    }

    /// Fires the signal. Idempotent.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the signal has fired.
    #[must_use]
    pub fn fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits until the signal fires. Resolves immediately if already fired.
    pub async fn done(&self) {
        self.token.cancelled().await;
    }

    /// Returns the underlying token, for `select!` integration.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_is_idempotent() {
        let t = Trigger::new();
        assert!(!t.fired());
        t.trigger();
        t.trigger();
        assert!(t.fired());
        t.done().await;
    }

    #[tokio::test]
    async fn test_done_resolves_for_late_waiters() {
        let t = Trigger::new();
        t.trigger();
        // waiting after the fact must not hang
        t.done().await;
        assert!(t.fired());
    }

    #[tokio::test]
    async fn test_child_fires_with_parent() {
        let parent = CancellationToken::new();
        let t = Trigger::child_of(&parent);
        assert!(!t.fired());
        parent.cancel();
        t.done().await;
        assert!(t.fired());
    }

    #[tokio::test]
    async fn test_child_fires_independently() {
        let parent = CancellationToken::new();
        let t = Trigger::child_of(&parent);
        t.trigger();
        assert!(t.fired());
        assert!(!parent.is_cancelled());
    }
}
