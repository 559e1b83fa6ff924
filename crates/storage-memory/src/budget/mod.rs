//! In-memory storage for budget items.

mod repository;

pub use repository::BudgetItemRepository;
