/// Currency used when nothing else determines one.
pub const DEFAULT_BASE_CURRENCY: &str = "USD";

/// Decimal places kept for display of money amounts.
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Entity names used in not-found and concurrency errors.
pub const BOOKING_ENTITY: &str = "BookingRequest";
pub const BUDGET_ITEM_ENTITY: &str = "BudgetItem";
pub const PAYMENT_ENTITY: &str = "Payment";
