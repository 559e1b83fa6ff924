//! Booking repository trait.

use async_trait::async_trait;

use super::bookings_model::BookingRequest;
use crate::errors::Result;

/// Persistence contract for booking requests, milestones included.
///
/// `save` is an upsert guarded by `version`; see
/// [`BudgetItemRepositoryTrait`](crate::budget::BudgetItemRepositoryTrait).
#[async_trait]
pub trait BookingRepositoryTrait: Send + Sync {
    /// Loads a booking, failing with `Error::NotFound` if absent.
    fn load(&self, booking_id: &str) -> Result<BookingRequest>;

    fn list_by_event(&self, event_id: &str) -> Result<Vec<BookingRequest>>;

    async fn save(&self, booking: BookingRequest) -> Result<BookingRequest>;
}
