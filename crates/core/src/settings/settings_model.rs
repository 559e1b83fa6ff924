use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_BASE_CURRENCY;
use crate::errors::Result;
use crate::money::validate_currency_code;

/// Policy knobs for the reconciliation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSettings {
    /// Currency reported for events that have no budget items yet.
    pub base_currency: String,
    /// Reject budget payments that would push `paid_amount` past the
    /// effective amount instead of only logging a warning.
    pub reject_budget_overpayment: bool,
    /// Advance a confirmed booking to `deposit_paid` once a milestone is paid.
    pub auto_advance_on_deposit: bool,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            reject_budget_overpayment: false,
            auto_advance_on_deposit: true,
        }
    }
}

impl LedgerSettings {
    pub fn validate(&self) -> Result<()> {
        validate_currency_code(&self.base_currency)
    }
}
