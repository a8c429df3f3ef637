//! # Topic → subscriptions registry.
//!
//! The registry maps a [`TopicKey`] to the set of subscriptions registered
//! under it, keyed by subscription identity. Subscriptions of different
//! `(topic, event)` types coexist: each entry is type-erased and recovered
//! by downcast at dispatch time.
//!
//! ## Rules
//! - Mutated exclusively under the bus [`ChanLock`](crate::ChanLock).
//! - A subscription appears under at most one topic entry, and only while
//!   active (not yet unsubscribed).
//! - Empty topic entries are pruned on removal.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::subscription::Subscription;
use crate::topic::{Topic, TopicKey};

/// Type-erased registry entry.
pub(crate) type AnySubscription = Arc<dyn Any + Send + Sync>;

/// Topic-keyed sets of active subscriptions.
#[derive(Default)]
pub(crate) struct Registry {
    topics: HashMap<TopicKey, HashMap<u64, AnySubscription>>,
}

impl Registry {
    /// Registers a subscription under `key`.
    pub(crate) fn insert(&mut self, key: TopicKey, id: u64, sub: AnySubscription) {
        self.topics.entry(key).or_default().insert(id, sub);
    }

    /// Returns the subscriber set for `key`, if any.
    pub(crate) fn subscribers(&self, key: &TopicKey) -> Option<&HashMap<u64, AnySubscription>> {
        self.topics.get(key)
    }

    /// Removes `id` from the entry for `key`. Returns `false` when the
    /// topic or the subscription is not listed.
    pub(crate) fn remove(&mut self, key: &TopicKey, id: u64) -> bool {
        let Some(set) = self.topics.get_mut(key) else {
            return false;
        };
        let hit = set.remove(&id).is_some();
        if set.is_empty() {
            self.topics.remove(key);
        }
        hit
    }

    /// Detaches a subscription from its topic's entry.
    pub(crate) fn detach<T, E>(&mut self, sub: &Arc<Subscription<T, E>>) -> bool
    where
        T: Topic,
        E: Send + 'static,
    {
        self.remove(&TopicKey::of(sub.topic().clone()), sub.id())
    }
}
