//! In-memory storage for booking requests.

mod repository;

pub use repository::BookingRepository;
