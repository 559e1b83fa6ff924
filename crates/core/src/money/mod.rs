//! Money ledger primitives - decimal amounts tagged with a currency code.

mod money_model;
mod rounding;

pub use money_model::{
    add_amounts, ensure_same_currency, sum_amounts, validate_currency_code, Money,
};
pub use rounding::{percentage_of, round_half_up};
