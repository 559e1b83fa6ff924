use async_trait::async_trait;

use eventplan_core::budget::{BudgetItem, BudgetItemRepositoryTrait};
use eventplan_core::Result;

use crate::db::{LedgerTables, MemoryDatabase, WriteHandle};

pub struct BudgetItemRepository {
    db: MemoryDatabase,
    writer: WriteHandle,
}

impl BudgetItemRepository {
    pub fn new(db: MemoryDatabase, writer: WriteHandle) -> Self {
        Self { db, writer }
    }
}

#[async_trait]
impl BudgetItemRepositoryTrait for BudgetItemRepository {
    fn load(&self, budget_item_id: &str) -> Result<BudgetItem> {
        self.db.read(|tables| tables.get(budget_item_id))
    }

    fn list_by_event(&self, event_id: &str) -> Result<Vec<BudgetItem>> {
        self.db.read(|tables| tables.list_by_event(event_id))
    }

    async fn save(&self, item: BudgetItem) -> Result<BudgetItem> {
        self.writer
            .exec(move |tables: &mut LedgerTables| tables.put(item))
            .await
    }
}
