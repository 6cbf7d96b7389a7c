//! Out-of-band signalling: event trait and pub/sub bus.
//!
//! Production code publishes facts (run completed, material short) here after
//! its atomic unit has finished. Delivery is best-effort and never part of a
//! transactional boundary.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
