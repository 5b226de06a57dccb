//! Domain events module.
//!
//! Provides domain event types and the sink trait for emitting events
//! after successful ledger mutations. The realtime hub implements the sink
//! to push portfolio updates to subscribed clients.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
