//! # Cancellation-aware registry lock.
//!
//! Provides [`ChanLock`] a mutual-exclusion primitive whose blocking
//! acquisition can be abandoned when the caller's cancellation token fires.
//! It guards the bus registry only, never a subscription's delivery path.
//!
//! ## Rules
//! - [`ChanLock::lock`] waits for availability or cancellation, whichever
//!   comes first; it returns `None` on cancellation.
//! - [`ChanLock::try_lock`] acquires only if the lock is immediately free
//!   (and never succeeds under an already-cancelled token).
//! - Unlocking happens by dropping the guard (or calling
//!   [`ChanLockGuard::unlock`] to make the release point explicit). The
//!   guard type makes unlocking a lock that is not held unrepresentable.
//! - Hold the lock only for non-blocking work; anything that may wait on a
//!   subscriber must run after the guard is released.

use std::ops::{Deref, DerefMut};

use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Mutual exclusion over `T` with cancellation-aware acquisition.
///
/// Built on tokio's semaphore-backed [`Mutex`]: waiters queue fairly, and
/// the acquisition future can be dropped at any time, which is what makes
/// the cancellation race safe.
#[derive(Debug, Default)]
pub struct ChanLock<T> {
    inner: Mutex<T>,
}

/// Exclusive access to the value guarded by a [`ChanLock`].
///
/// The lock is released when the guard is dropped.
#[derive(Debug)]
pub struct ChanLockGuard<'a, T>(MutexGuard<'a, T>);

impl<T> ChanLock<T> {
    /// Creates a lock wrapping `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Acquires the lock, waiting until it is available or `ctx` fires.
    ///
    /// Returns `None` if `ctx` fires first. Cancellation is checked before
    /// availability, so a caller with an already-cancelled token fails fast
    /// even when the lock is free.
    pub async fn lock(&self, ctx: &CancellationToken) -> Option<ChanLockGuard<'_, T>> {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                tracing::trace!("lock acquisition cancelled");
                None
            }
            guard = self.inner.lock() => Some(ChanLockGuard(guard)),
        }
    }

    /// Acquires the lock only if it is immediately available.
    ///
    /// Returns `None` when the lock is held elsewhere or `ctx` has already
    /// fired.
    pub fn try_lock(&self, ctx: &CancellationToken) -> Option<ChanLockGuard<'_, T>> {
        if ctx.is_cancelled() {
            return None;
        }
        self.inner.try_lock().ok().map(ChanLockGuard)
    }
}

impl<T> ChanLockGuard<'_, T> {
    /// Releases the lock at an explicit point, consuming the guard.
    pub fn unlock(self) {}
}

impl<T> Deref for ChanLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for ChanLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}
