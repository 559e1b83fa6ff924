//! Where the ledger's audit trail goes.

use std::sync::{Arc, Mutex, MutexGuard};

use super::DomainEvent;

/// Receives the audit trail of booking, budget and payment changes.
///
/// The reconciliation service calls this only after the store has committed
/// the change the event describes; a payment completion that rolled back
/// produces nothing. Sinks cannot veto or fail the write, so keep `emit`
/// cheap and hand slow delivery off elsewhere.
pub trait DomainEventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);

    /// Events from one committed write, in the order they happened, e.g. a
    /// payment completing followed by its budget item being reconciled.
    fn emit_batch(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// Drops every event. The service default when no sink is configured.
#[derive(Clone, Default)]
pub struct NoOpDomainEventSink;

impl DomainEventSink for NoOpDomainEventSink {
    fn emit(&self, _event: DomainEvent) {}
}

/// Keeps the audit trail in memory so it can be inspected after the fact.
#[derive(Clone, Default)]
pub struct CollectingDomainEventSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl CollectingDomainEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock still holds a usable trail.
    fn lock(&self) -> MutexGuard<'_, Vec<DomainEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.lock().clone()
    }

    /// The history of one booking, budget item or payment.
    pub fn events_for(&self, aggregate_id: &str) -> Vec<DomainEvent> {
        self.lock()
            .iter()
            .filter(|event| event.touches(aggregate_id))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl DomainEventSink for CollectingDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        self.lock().push(event);
    }
}
