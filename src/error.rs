//! Error types surfaced by the bus API.
//!
//! The bus reports most adverse conditions as data, not errors: cancellation
//! during a send shows up in the [`SendReport`](crate::SendReport) drop
//! counters, and policy-driven subscription termination is observable
//! through the subscription's cancellation and completion signals. The only
//! recoverable error a caller can receive is [`SubscribeError`].

use thiserror::Error;

/// # Errors produced while registering a subscription.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeError {
    /// Registration was abandoned because the caller's cancellation token
    /// fired before the registry lock could be acquired.
    #[error("registration aborted: registry lock acquisition was cancelled")]
    Cancelled,
}

impl SubscribeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use topicbus::SubscribeError;
    ///
    /// assert_eq!(SubscribeError::Cancelled.as_label(), "subscribe_cancelled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubscribeError::Cancelled => "subscribe_cancelled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SubscribeError::Cancelled => {
                "registry lock acquisition cancelled before registration".to_string()
            }
        }
    }
}
