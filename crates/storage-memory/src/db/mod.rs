//! Versioned in-memory tables and the handles that read and write them.
//!
//! Each aggregate is stored as a JSON row next to its version. Reads decode
//! from the shared snapshot; writes go through the single writer actor, which
//! applies a job to a working copy and swaps it in only when the job succeeds.

pub mod write_actor;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use eventplan_core::bookings::BookingRequest;
use eventplan_core::budget::BudgetItem;
use eventplan_core::constants::{BOOKING_ENTITY, BUDGET_ITEM_ENTITY, PAYMENT_ENTITY};
use eventplan_core::errors::{DatabaseError, Error, Result};
use eventplan_core::payments::Payment;
use eventplan_core::store::{LedgerTransaction, TransactionExecutor};

use crate::bookings::BookingRepository;
use crate::budget::BudgetItemRepository;
use crate::errors::StorageError;
use crate::payments::PaymentRepository;

pub use write_actor::{spawn_writer, WriteHandle};

/// One stored aggregate.
#[derive(Debug, Clone)]
pub struct StoredRow {
    pub version: i64,
    pub data: String,
}

type Table = BTreeMap<String, StoredRow>;

/// All rows of the ledger.
#[derive(Debug, Clone, Default)]
pub struct LedgerTables {
    bookings: Table,
    budget_items: Table,
    payments: Table,
}

/// Glue between an aggregate type and its table.
pub trait StoredAggregate: Serialize + DeserializeOwned {
    const ENTITY: &'static str;

    fn table(tables: &LedgerTables) -> &Table;
    fn table_mut(tables: &mut LedgerTables) -> &mut Table;

    fn id(&self) -> &str;
    fn event_id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn version(&self) -> i64;
    fn set_version(&mut self, version: i64);
    fn validate(&self) -> Result<()>;
}

macro_rules! stored_aggregate {
    ($ty:ty, $entity:expr, $table:ident) => {
        impl StoredAggregate for $ty {
            const ENTITY: &'static str = $entity;

            fn table(tables: &LedgerTables) -> &Table {
                &tables.$table
            }

            fn table_mut(tables: &mut LedgerTables) -> &mut Table {
                &mut tables.$table
            }

            fn id(&self) -> &str {
                &self.id
            }

            fn event_id(&self) -> &str {
                &self.event_id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn version(&self) -> i64 {
                self.version
            }

            fn set_version(&mut self, version: i64) {
                self.version = version;
            }

            fn validate(&self) -> Result<()> {
                <$ty>::validate(self)
            }
        }
    };
}

stored_aggregate!(BookingRequest, BOOKING_ENTITY, bookings);
stored_aggregate!(BudgetItem, BUDGET_ITEM_ENTITY, budget_items);
stored_aggregate!(Payment, PAYMENT_ENTITY, payments);

/// Decodes a row and runs the aggregate's structural checks.
fn decode<A: StoredAggregate>(id: &str, row: &StoredRow) -> Result<A> {
    let mut aggregate: A = serde_json::from_str(&row.data).map_err(StorageError::from)?;
    aggregate.set_version(row.version);
    aggregate.validate().map_err(|err| match err {
        Error::Database(_) => err,
        other => Error::Database(DatabaseError::Corrupted(format!(
            "{} {}: {}",
            A::ENTITY,
            id,
            other
        ))),
    })?;
    Ok(aggregate)
}

impl LedgerTables {
    pub fn get<A: StoredAggregate>(&self, id: &str) -> Result<A> {
        let row = A::table(self)
            .get(id)
            .ok_or_else(|| Error::not_found(A::ENTITY, id))?;
        decode(id, row)
    }

    /// All aggregates of one event, oldest first.
    pub fn list_by_event<A: StoredAggregate>(&self, event_id: &str) -> Result<Vec<A>> {
        let mut found = Vec::new();
        for (id, row) in A::table(self) {
            let aggregate: A = decode(id, row)?;
            if aggregate.event_id() == event_id {
                found.push(aggregate);
            }
        }
        found.sort_by_key(|a| a.created_at());
        Ok(found)
    }

    /// Inserts or replaces an aggregate, checking and bumping its version.
    pub fn put<A: StoredAggregate>(&mut self, mut aggregate: A) -> Result<A> {
        let table = A::table_mut(self);
        let found = table.get(aggregate.id()).map(|row| row.version).unwrap_or(0);
        if found != aggregate.version() {
            return Err(Error::ConcurrencyConflict {
                entity: A::ENTITY,
                id: aggregate.id().to_string(),
                expected: aggregate.version(),
                found,
            });
        }
        aggregate.set_version(found + 1);
        let data = serde_json::to_string(&aggregate).map_err(StorageError::from)?;
        table.insert(
            aggregate.id().to_string(),
            StoredRow {
                version: aggregate.version(),
                data,
            },
        );
        Ok(aggregate)
    }

    /// Raw rows as JSON, keyed by table and id.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut out = serde_json::Map::new();
        for (name, table) in [
            ("bookings", &self.bookings),
            ("budgetItems", &self.budget_items),
            ("payments", &self.payments),
        ] {
            let mut rows = serde_json::Map::new();
            for (id, row) in table {
                let value: serde_json::Value =
                    serde_json::from_str(&row.data).map_err(StorageError::from)?;
                rows.insert(id.clone(), value);
            }
            out.insert(name.to_string(), serde_json::Value::Object(rows));
        }
        Ok(serde_json::Value::Object(out))
    }

    /// Overwrites a raw row. Used to seed and to simulate damaged storage.
    pub fn put_raw<A: StoredAggregate>(&mut self, id: &str, row: StoredRow) {
        A::table_mut(self).insert(id.to_string(), row);
    }
}

impl LedgerTransaction for LedgerTables {
    fn load_booking(&mut self, booking_id: &str) -> Result<BookingRequest> {
        self.get(booking_id)
    }

    fn save_booking(&mut self, booking: BookingRequest) -> Result<BookingRequest> {
        self.put(booking)
    }

    fn load_budget_item(&mut self, budget_item_id: &str) -> Result<BudgetItem> {
        self.get(budget_item_id)
    }

    fn save_budget_item(&mut self, item: BudgetItem) -> Result<BudgetItem> {
        self.put(item)
    }

    fn load_payment(&mut self, payment_id: &str) -> Result<Payment> {
        self.get(payment_id)
    }

    fn save_payment(&mut self, payment: Payment) -> Result<Payment> {
        self.put(payment)
    }
}

/// Shared, committed state of the ledger.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<LedgerTables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a read against the committed tables.
    pub fn read<T>(&self, f: impl FnOnce(&LedgerTables) -> Result<T>) -> Result<T> {
        let tables = self
            .tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&tables)
    }

    /// Copy of the committed tables.
    pub fn snapshot(&self) -> LedgerTables {
        self.tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) fn commit(&self, tables: LedgerTables) {
        *self
            .tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = tables;
    }
}

#[async_trait]
impl TransactionExecutor for WriteHandle {
    async fn execute<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LedgerTransaction) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.exec(move |tables: &mut LedgerTables| job(tables)).await
    }
}

/// Database plus writer, with repository constructors.
#[derive(Clone)]
pub struct MemoryStore {
    db: MemoryDatabase,
    writer: WriteHandle,
}

impl MemoryStore {
    /// Creates an empty store and starts its writer. Must be called inside a
    /// Tokio runtime.
    pub fn open() -> Self {
        let db = MemoryDatabase::new();
        let writer = spawn_writer(db.clone());
        debug!("In-memory ledger store opened");
        Self { db, writer }
    }

    pub fn database(&self) -> &MemoryDatabase {
        &self.db
    }

    pub fn writer(&self) -> WriteHandle {
        self.writer.clone()
    }

    pub fn booking_repository(&self) -> Arc<BookingRepository> {
        Arc::new(BookingRepository::new(self.db.clone(), self.writer.clone()))
    }

    pub fn budget_repository(&self) -> Arc<BudgetItemRepository> {
        Arc::new(BudgetItemRepository::new(self.db.clone(), self.writer.clone()))
    }

    pub fn payment_repository(&self) -> Arc<PaymentRepository> {
        Arc::new(PaymentRepository::new(self.db.clone(), self.writer.clone()))
    }
}
