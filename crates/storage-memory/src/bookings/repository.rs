use async_trait::async_trait;
use log::debug;

use eventplan_core::bookings::{BookingRepositoryTrait, BookingRequest};
use eventplan_core::Result;

use crate::db::{LedgerTables, MemoryDatabase, WriteHandle};

/// Repository for booking requests and their embedded payment schedules.
pub struct BookingRepository {
    db: MemoryDatabase,
    writer: WriteHandle,
}

impl BookingRepository {
    pub fn new(db: MemoryDatabase, writer: WriteHandle) -> Self {
        Self { db, writer }
    }
}

#[async_trait]
impl BookingRepositoryTrait for BookingRepository {
    fn load(&self, booking_id: &str) -> Result<BookingRequest> {
        self.db.read(|tables| tables.get(booking_id))
    }

    fn list_by_event(&self, event_id: &str) -> Result<Vec<BookingRequest>> {
        self.db.read(|tables| tables.list_by_event(event_id))
    }

    async fn save(&self, booking: BookingRequest) -> Result<BookingRequest> {
        debug!("Saving booking {} at version {}", booking.id, booking.version);
        self.writer
            .exec(move |tables: &mut LedgerTables| tables.put(booking))
            .await
    }
}
