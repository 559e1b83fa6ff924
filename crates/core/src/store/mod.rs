//! Transaction contract for work that spans more than one aggregate.
//!
//! Single-aggregate operations go through the per-aggregate repository traits.
//! Anything that must commit two aggregates together runs as a job on a
//! [`TransactionExecutor`]: the job receives a [`LedgerTransaction`] and the
//! executor commits its writes only if the job returns `Ok`.

use async_trait::async_trait;

use crate::bookings::BookingRequest;
use crate::budget::BudgetItem;
use crate::errors::Result;
use crate::payments::Payment;

/// Aggregate access inside an open transaction.
///
/// `save_*` follow the same version rules as the repositories; writes become
/// visible to other callers only when the surrounding job succeeds.
pub trait LedgerTransaction {
    fn load_booking(&mut self, booking_id: &str) -> Result<BookingRequest>;
    fn save_booking(&mut self, booking: BookingRequest) -> Result<BookingRequest>;

    fn load_budget_item(&mut self, budget_item_id: &str) -> Result<BudgetItem>;
    fn save_budget_item(&mut self, item: BudgetItem) -> Result<BudgetItem>;

    fn load_payment(&mut self, payment_id: &str) -> Result<Payment>;
    fn save_payment(&mut self, payment: Payment) -> Result<Payment>;
}

/// Runs jobs atomically against the store.
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    async fn execute<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LedgerTransaction) -> Result<T> + Send + 'static,
        T: Send + 'static;
}
