use async_trait::async_trait;

use eventplan_core::payments::{Payment, PaymentRepositoryTrait};
use eventplan_core::Result;

use crate::db::{LedgerTables, MemoryDatabase, WriteHandle};

/// Repository for payments.
pub struct PaymentRepository {
    db: MemoryDatabase,
    writer: WriteHandle,
}

impl PaymentRepository {
    pub fn new(db: MemoryDatabase, writer: WriteHandle) -> Self {
        Self { db, writer }
    }
}

#[async_trait]
impl PaymentRepositoryTrait for PaymentRepository {
    fn load(&self, payment_id: &str) -> Result<Payment> {
        self.db.read(|tables| tables.get(payment_id))
    }

    fn list_by_event(&self, event_id: &str) -> Result<Vec<Payment>> {
        self.db.read(|tables| tables.list_by_event(event_id))
    }

    async fn save(&self, payment: Payment) -> Result<Payment> {
        self.writer
            .exec(move |tables: &mut LedgerTables| tables.put(payment))
            .await
    }
}
