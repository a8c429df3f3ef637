//! # Bus internals: registry, broadcast protocol, counters.

mod core;
mod registry;
mod report;

pub use self::core::EventBus;
pub use self::report::SendReport;

pub(crate) use self::registry::Registry;
