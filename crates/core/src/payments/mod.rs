//! Payments module - money movements with their own status machine.

mod payments_model;
mod payments_totals;
mod payments_traits;


pub use payments_model::{
    CompletionOutcome, NewPayment, Payment, PaymentMethod, PaymentStatus, PaymentType,
};
pub use payments_totals::PaymentTotals;
pub use payments_traits::PaymentRepositoryTrait;
