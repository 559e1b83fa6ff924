//! Budget item repository trait.

use async_trait::async_trait;

use super::budget_model::BudgetItem;
use crate::errors::Result;

/// Persistence contract for budget items.
///
/// `save` is an upsert guarded by the item's `version`: the stored version must
/// match, and the returned copy carries the incremented version.
#[async_trait]
pub trait BudgetItemRepositoryTrait: Send + Sync {
    /// Loads an item, failing with `Error::NotFound` if absent.
    fn load(&self, budget_item_id: &str) -> Result<BudgetItem>;

    /// Lists all items allocated to an event.
    fn list_by_event(&self, event_id: &str) -> Result<Vec<BudgetItem>>;

    async fn save(&self, item: BudgetItem) -> Result<BudgetItem>;
}
