//! Domain events module.
//!
//! Audit events emitted after successful writes and the sink trait that
//! receives them. Adapters implement the sink to record or forward events.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
