//! Budget ledger domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};
use crate::money::{percentage_of, validate_currency_code, Money};

/// Closed set of spend categories shared by budget items and bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetCategory {
    Venue,
    Catering,
    Photography,
    Videography,
    Entertainment,
    Decor,
    Attire,
    Beauty,
    Stationery,
    Transportation,
    Miscellaneous,
}

impl BudgetCategory {
    pub const ALL: [BudgetCategory; 11] = [
        BudgetCategory::Venue,
        BudgetCategory::Catering,
        BudgetCategory::Photography,
        BudgetCategory::Videography,
        BudgetCategory::Entertainment,
        BudgetCategory::Decor,
        BudgetCategory::Attire,
        BudgetCategory::Beauty,
        BudgetCategory::Stationery,
        BudgetCategory::Transportation,
        BudgetCategory::Miscellaneous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetCategory::Venue => "venue",
            BudgetCategory::Catering => "catering",
            BudgetCategory::Photography => "photography",
            BudgetCategory::Videography => "videography",
            BudgetCategory::Entertainment => "entertainment",
            BudgetCategory::Decor => "decor",
            BudgetCategory::Attire => "attire",
            BudgetCategory::Beauty => "beauty",
            BudgetCategory::Stationery => "stationery",
            BudgetCategory::Transportation => "transportation",
            BudgetCategory::Miscellaneous => "miscellaneous",
        }
    }
}

impl fmt::Display for BudgetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BudgetCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(format!(
                    "Unknown budget category '{}'",
                    s
                )))
            })
    }
}

/// Domain model for a budget allocation within an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItem {
    pub id: String,
    pub event_id: String,
    pub category: BudgetCategory,
    pub description: String,
    pub estimated_amount: Decimal,
    pub actual_amount: Option<Decimal>,
    /// Never decreases.
    pub paid_amount: Decimal,
    pub currency: String,
    pub vendor_id: Option<String>,
    pub booking_request_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: i64,
}

/// Input model for allocating budget to a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudgetItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub event_id: String,
    pub category: BudgetCategory,
    pub description: String,
    pub estimated_amount: Decimal,
    #[serde(default)]
    pub actual_amount: Option<Decimal>,
    pub currency: String,
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default)]
    pub booking_request_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewBudgetItem {
    pub fn validate(&self) -> Result<()> {
        if self.event_id.trim().is_empty() {
            return Err(ValidationError::MissingField("eventId".to_string()).into());
        }
        validate_currency_code(&self.currency)?;
        ensure_non_negative("estimatedAmount", self.estimated_amount)?;
        if let Some(actual) = self.actual_amount {
            ensure_non_negative("actualAmount", actual)?;
        }
        Ok(())
    }
}

impl BudgetItem {
    /// Creates a budget item with nothing paid yet.
    pub fn new(input: NewBudgetItem, id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            event_id: input.event_id,
            category: input.category,
            description: input.description,
            estimated_amount: input.estimated_amount,
            actual_amount: input.actual_amount,
            paid_amount: Decimal::ZERO,
            currency: input.currency,
            vendor_id: input.vendor_id,
            booking_request_id: input.booking_request_id,
            notes: input.notes,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// The actual amount once known, otherwise the estimate.
    pub fn effective_amount(&self) -> Decimal {
        self.actual_amount.unwrap_or(self.estimated_amount)
    }

    /// Negative when the item has been overpaid.
    pub fn remaining_balance(&self) -> Decimal {
        self.effective_amount() - self.paid_amount
    }

    /// Estimate-only items are never over budget.
    pub fn is_over_budget(&self) -> bool {
        matches!(self.actual_amount, Some(actual) if actual > self.estimated_amount)
    }

    pub fn overage_amount(&self) -> Decimal {
        match self.actual_amount {
            Some(actual) if actual > self.estimated_amount => actual - self.estimated_amount,
            _ => Decimal::ZERO,
        }
    }

    pub fn payment_progress(&self) -> u32 {
        percentage_of(self.paid_amount, self.effective_amount())
    }

    pub fn is_overpaid(&self) -> bool {
        self.paid_amount > self.effective_amount()
    }

    pub fn paid(&self) -> Money {
        Money::new(self.paid_amount, self.currency.as_str())
    }

    pub fn effective(&self) -> Money {
        Money::new(self.effective_amount(), self.currency.as_str())
    }

    /// What `paid_amount` would become after `payment`, without applying it.
    pub fn projected_paid(&self, payment: &Money) -> Result<Money> {
        ensure_non_negative("amount", payment.amount)?;
        self.paid().checked_add(payment)
    }

    /// Records money paid against this item. Overpayment is allowed and shows
    /// up as a negative remaining balance.
    pub fn add_payment(&mut self, payment: &Money, now: DateTime<Utc>) -> Result<()> {
        let paid = self.projected_paid(payment)?;
        self.paid_amount = paid.amount;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_actual_amount(&mut self, actual: Option<Decimal>, now: DateTime<Utc>) -> Result<()> {
        if let Some(value) = actual {
            ensure_non_negative("actualAmount", value)?;
        }
        self.actual_amount = actual;
        self.updated_at = now;
        Ok(())
    }

    /// Structural checks applied after decoding a stored item.
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("estimatedAmount", self.estimated_amount)?;
        ensure_non_negative("paidAmount", self.paid_amount)?;
        if let Some(actual) = self.actual_amount {
            ensure_non_negative("actualAmount", actual)?;
        }
        validate_currency_code(&self.currency)
    }
}

pub(crate) fn ensure_non_negative(field: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::NegativeAmount {
            field: field.to_string(),
            value: value.to_string(),
        }
        .into());
    }
    Ok(())
}
