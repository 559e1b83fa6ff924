//! Payment repository trait.

use async_trait::async_trait;

use super::payments_model::Payment;
use crate::errors::Result;

/// Persistence contract for payments. `save` is version-guarded like the
/// other aggregate repositories.
#[async_trait]
pub trait PaymentRepositoryTrait: Send + Sync {
    fn load(&self, payment_id: &str) -> Result<Payment>;

    fn list_by_event(&self, event_id: &str) -> Result<Vec<Payment>>;

    async fn save(&self, payment: Payment) -> Result<Payment>;
}
