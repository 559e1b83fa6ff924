//! In-memory storage for payments.

mod repository;

pub use repository::PaymentRepository;
