//! In-memory storage implementation for the event planning ledger.
//!
//! This crate implements the repository and transaction traits defined in
//! `eventplan-core` on top of versioned JSON rows held in memory:
//! - A shared table snapshot for reads
//! - A single writer actor that applies jobs atomically
//! - Repository implementations for bookings, budget items and payments
//!
//! ```text
//!        core (domain)
//!              │
//!              ▼
//!   storage-memory (this crate)
//!       │              │
//!   reads (RwLock)   writes (writer actor)
//!       └──────┬───────┘
//!              ▼
//!        LedgerTables
//! ```

pub mod db;
pub mod errors;

// Repository implementations
pub mod bookings;
pub mod budget;
pub mod payments;

// Re-export database utilities
pub use db::{spawn_writer, LedgerTables, MemoryDatabase, MemoryStore, WriteHandle};

// Re-export storage errors
pub use errors::StorageError;

// Re-export from eventplan-core for convenience
pub use eventplan_core::errors::{DatabaseError, Error, Result};
