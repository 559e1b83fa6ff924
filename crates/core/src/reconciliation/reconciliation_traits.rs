//! Reconciliation service trait.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::bookings::{BookingRequest, NewBookingRequest, NewMilestone};
use crate::budget::{BudgetItem, BudgetSummary, NewBudgetItem, RecommendedSplit};
use crate::errors::Result;
use crate::payments::{NewPayment, Payment, PaymentTotals};

/// Operations exposed to API controllers.
///
/// Every mutating call returns the aggregate as persisted, or fails with one
/// of the [`Error`](crate::errors::Error) kinds without partial writes.
#[async_trait]
pub trait ReconciliationServiceTrait: Send + Sync {
    // --- Bookings ---

    /// Opens a booking in `quote_requested` (or `draft` when requested).
    async fn create_booking(&self, new_booking: NewBookingRequest) -> Result<BookingRequest>;

    /// Sends a drafted booking to the vendor.
    async fn request_quote(&self, booking_id: &str) -> Result<BookingRequest>;

    async fn submit_quote(
        &self,
        booking_id: &str,
        amount: Decimal,
        notes: Option<String>,
    ) -> Result<BookingRequest>;

    async fn start_negotiation(
        &self,
        booking_id: &str,
        counter_amount: Option<Decimal>,
        notes: Option<String>,
    ) -> Result<BookingRequest>;

    /// Confirms the booking and materializes the supplied payment schedule.
    async fn accept_quote(
        &self,
        booking_id: &str,
        agreed_amount: Option<Decimal>,
        milestones: Vec<NewMilestone>,
    ) -> Result<BookingRequest>;

    async fn decline_booking(
        &self,
        booking_id: &str,
        reason: Option<String>,
    ) -> Result<BookingRequest>;

    async fn cancel_booking(&self, booking_id: &str, reason: Option<String>)
        -> Result<BookingRequest>;

    async fn start_service(&self, booking_id: &str) -> Result<BookingRequest>;

    async fn complete_booking(&self, booking_id: &str) -> Result<BookingRequest>;

    async fn add_milestone(
        &self,
        booking_id: &str,
        milestone: NewMilestone,
    ) -> Result<BookingRequest>;

    /// Marks a milestone paid and advances a confirmed booking to `deposit_paid`.
    async fn mark_milestone_paid(
        &self,
        booking_id: &str,
        milestone_id: &str,
    ) -> Result<BookingRequest>;

    fn get_booking(&self, booking_id: &str) -> Result<BookingRequest>;

    fn list_bookings(&self, event_id: &str) -> Result<Vec<BookingRequest>>;

    // --- Budget ---

    async fn create_budget_item(&self, new_item: NewBudgetItem) -> Result<BudgetItem>;

    async fn set_budget_actual(
        &self,
        budget_item_id: &str,
        actual_amount: Option<Decimal>,
    ) -> Result<BudgetItem>;

    async fn add_budget_payment(&self, budget_item_id: &str, amount: Decimal)
        -> Result<BudgetItem>;

    fn get_budget_item(&self, budget_item_id: &str) -> Result<BudgetItem>;

    fn get_budget_summary(&self, event_id: &str) -> Result<BudgetSummary>;

    fn get_recommended_split(&self, total_budget: Decimal) -> Vec<RecommendedSplit>;

    // --- Payments ---

    async fn create_payment(&self, new_payment: NewPayment) -> Result<Payment>;

    async fn start_payment_processing(&self, payment_id: &str) -> Result<Payment>;

    /// Completes a payment and, in the same transaction, adds its amount to the
    /// linked budget item.
    async fn complete_payment(&self, payment_id: &str, reference: Option<String>)
        -> Result<Payment>;

    async fn fail_payment(&self, payment_id: &str, notes: Option<String>) -> Result<Payment>;

    async fn cancel_payment(&self, payment_id: &str, reason: Option<String>) -> Result<Payment>;

    fn get_payment(&self, payment_id: &str) -> Result<Payment>;

    fn get_payment_totals(&self, event_id: &str) -> Result<PaymentTotals>;
}
