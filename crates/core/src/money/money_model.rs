//! Money value object.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// An amount in a single currency.
///
/// Arithmetic between two values is only defined when the currencies match;
/// the engine never converts between currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Adds two amounts of the same currency.
    pub fn checked_add(&self, other: &Money) -> Result<Money> {
        self.ensure_same_currency(other)?;
        let amount = add_amounts(&self.label(), self.amount, other.amount)?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    /// Subtracts an amount of the same currency. The result may be negative.
    pub fn checked_sub(&self, other: &Money) -> Result<Money> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| overflow(&self.label()))?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    pub fn ensure_same_currency(&self, other: &Money) -> Result<()> {
        ensure_same_currency(&self.currency, &other.currency)
    }

    fn label(&self) -> String {
        format!("{} amount", self.currency)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// `left + right`, or `AmountOverflow` naming `field` when the sum leaves the
/// decimal range.
pub fn add_amounts(field: &str, left: Decimal, right: Decimal) -> Result<Decimal> {
    left.checked_add(right).ok_or_else(|| overflow(field))
}

pub fn sum_amounts<I>(field: &str, values: I) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| add_amounts(field, total, value))
}

pub fn ensure_same_currency(expected: &str, actual: &str) -> Result<()> {
    if expected != actual {
        return Err(Error::Validation(ValidationError::CurrencyMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }));
    }
    Ok(())
}

fn overflow(field: &str) -> Error {
    Error::Validation(ValidationError::AmountOverflow(field.to_string()))
}

/// Validates an ISO-4217 style currency code (three uppercase ASCII letters).
pub fn validate_currency_code(code: &str) -> Result<()> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(Error::Validation(ValidationError::InvalidCurrency(
            code.to_string(),
        )))
    }
}
