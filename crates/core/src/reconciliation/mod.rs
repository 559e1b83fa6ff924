//! Reconciliation module - the service that ties bookings, budget items and
//! payments together.

mod reconciliation_service;
mod reconciliation_traits;

#[cfg(test)]
mod reconciliation_service_tests;

pub use reconciliation_service::ReconciliationService;
pub use reconciliation_traits::ReconciliationServiceTrait;
