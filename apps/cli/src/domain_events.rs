//! Domain event sink for the command-line runtime.

use eventplan_core::events::{DomainEvent, DomainEventSink};

/// Writes every domain event to the `eventplan::events` log target.
#[derive(Clone, Default)]
pub struct TracingDomainEventSink;

impl DomainEventSink for TracingDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => tracing::info!(target: "eventplan::events", event = %json, "domain event"),
            Err(e) => tracing::warn!(target: "eventplan::events", "Unserializable domain event {:?}: {}", event, e),
        }
    }
}
