//! Event Plan Core - booking, budget and payment reconciliation.
//!
//! This crate holds the domain models, state machines and the reconciliation
//! service. It is storage-agnostic and defines the repository and transaction
//! traits that storage adapters implement.

pub mod bookings;
pub mod budget;
pub mod constants;
pub mod errors;
pub mod events;
pub mod money;
pub mod payments;
pub mod reconciliation;
pub mod settings;
pub mod store;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
