//! # Topic keys.
//!
//! Events are published and consumed under a **topic**: any comparable value.
//! The registry must hold subscriptions for topics of arbitrary concrete
//! types side by side, so topic values are erased into [`TopicKey`], a boxed
//! comparable. Two keys are equal only when they carry the same concrete
//! type and equal values; the key hashes the type id together with the value
//! so distinct topic types never collide logically.
//!
//! The "no custom topic" topic used by [`EventBus::send`](crate::EventBus::send)
//! and [`EventBus::subscribe`](crate::EventBus::subscribe) is the event
//! type's [`Default`] value.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Bounds for values usable as topic keys.
///
/// Implemented automatically for every eligible type; there is nothing to
/// implement by hand.
pub trait Topic: Any + Hash + Eq + Clone + Send + Sync + 'static {}

impl<T: Any + Hash + Eq + Clone + Send + Sync + 'static> Topic for T {}

/// Object-safe view of a topic value: comparable and hashable across types.
trait DynTopic: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn dyn_eq(&self, other: &dyn DynTopic) -> bool;
    fn type_name(&self) -> &'static str;
}

impl<T: Topic> DynTopic for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn dyn_eq(&self, other: &dyn DynTopic) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Type-erased, comparable registry key.
pub struct TopicKey(Box<dyn DynTopic>);

impl TopicKey {
    /// Erases a topic value into a key.
    #[must_use]
    pub fn of<T: Topic>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Returns the concrete type name of the topic value, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }
}

impl PartialEq for TopicKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(other.0.as_ref())
    }
}

impl Eq for TopicKey {}

impl Hash for TopicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state);
    }
}

impl fmt::Debug for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TopicKey").field(&self.type_name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_equal_values_same_type() {
        assert_eq!(TopicKey::of(42u32), TopicKey::of(42u32));
        assert_ne!(TopicKey::of(42u32), TopicKey::of(43u32));
    }

    #[test]
    fn test_same_value_different_types_differ() {
        // 42u32 and 42u64 are different topics even though they print alike
        assert_ne!(TopicKey::of(42u32), TopicKey::of(42u64));
    }

    #[test]
    fn test_default_values_keep_type_identity() {
        assert_ne!(TopicKey::of(u32::default()), TopicKey::of(u64::default()));
        assert_eq!(TopicKey::of(String::new()), TopicKey::of(String::new()));
    }

    #[test]
    fn test_usable_as_hashmap_key() {
        let mut map: HashMap<TopicKey, &'static str> = HashMap::new();
        map.insert(TopicKey::of("alpha".to_string()), "a");
        map.insert(TopicKey::of(7i32), "b");

        assert_eq!(map.get(&TopicKey::of("alpha".to_string())), Some(&"a"));
        assert_eq!(map.get(&TopicKey::of(7i32)), Some(&"b"));
        assert_eq!(map.get(&TopicKey::of(7i64)), None);
    }
}
