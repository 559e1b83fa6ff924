use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to whole currency units, midpoints away from zero.
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// `round(part / whole * 100)` clamped to `0..=u32::MAX`.
///
/// A zero `whole` reads as fully covered (100). Ratios too large for a
/// decimal saturate.
pub fn percentage_of(part: Decimal, whole: Decimal) -> u32 {
    if whole.is_zero() {
        return 100;
    }
    let negative = part.is_sign_negative() != whole.is_sign_negative() && !part.is_zero();
    let pct = part
        .checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED));
    match pct {
        Some(pct) if !pct.is_sign_negative() => round_half_up(pct).to_u32().unwrap_or(u32::MAX),
        Some(_) => 0,
        None if negative => 0,
        None => u32::MAX,
    }
}
