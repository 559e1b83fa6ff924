//! Payment domain models.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::budget::ensure_non_negative;
use crate::errors::{DatabaseError, Error, Result, ValidationError};
use crate::money::{validate_currency_code, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    ClientPayment,
    VendorPayment,
    Refund,
    Expense,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::ClientPayment => "client_payment",
            PaymentType::VendorPayment => "vendor_payment",
            PaymentType::Refund => "refund",
            PaymentType::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    BankTransfer,
    CreditCard,
    DebitCard,
    Cash,
    Check,
    Online,
    Other,
}

/// Result of [`Payment::mark_completed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The payment moved to `completed` in this call.
    Completed,
    /// The payment was already completed; nothing changed.
    AlreadyCompleted,
}

/// A single money movement for an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub event_id: String,
    pub booking_request_id: Option<String>,
    pub budget_item_id: Option<String>,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub currency: String,
    pub paid_by: Option<String>,
    pub paid_to: Option<String>,
    pub due_date: Option<NaiveDate>,
    /// Set once the payment completes and kept as history afterwards.
    pub paid_date: Option<DateTime<Utc>>,
    pub reference: Option<String>,
    pub receipt_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: i64,
}

/// Input model for recording a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub event_id: String,
    #[serde(default)]
    pub booking_request_id: Option<String>,
    #[serde(default)]
    pub budget_item_id: Option<String>,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub paid_by: Option<String>,
    #[serde(default)]
    pub paid_to: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewPayment {
    pub fn validate(&self) -> Result<()> {
        if self.event_id.trim().is_empty() {
            return Err(ValidationError::MissingField("eventId".to_string()).into());
        }
        validate_currency_code(&self.currency)?;
        ensure_non_negative("amount", self.amount)?;
        if self.amount.is_zero() {
            return Err(ValidationError::InvalidInput(
                "Payment amount must be greater than zero".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

impl Payment {
    pub fn new(input: NewPayment, id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            event_id: input.event_id,
            booking_request_id: input.booking_request_id,
            budget_item_id: input.budget_item_id,
            payment_type: input.payment_type,
            status: PaymentStatus::Pending,
            method: input.method,
            amount: input.amount,
            currency: input.currency,
            paid_by: input.paid_by,
            paid_to: input.paid_to,
            due_date: input.due_date,
            paid_date: None,
            reference: None,
            receipt_url: input.receipt_url,
            notes: input.notes,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn money(&self) -> Money {
        Money::new(self.amount, self.currency.as_str())
    }

    fn ensure_not_terminal(&self, target: PaymentStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::invalid_transition(&self.id, self.status, target));
        }
        Ok(())
    }

    /// Hands the payment to a processor.
    pub fn start_processing(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != PaymentStatus::Pending {
            return Err(Error::invalid_transition(
                &self.id,
                self.status,
                PaymentStatus::Processing,
            ));
        }
        self.status = PaymentStatus::Processing;
        self.updated_at = now;
        Ok(())
    }

    /// Completes the payment. A second call on a completed payment is a no-op
    /// that keeps the original paid date and reference.
    pub fn mark_completed(
        &mut self,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        if self.status == PaymentStatus::Completed {
            return Ok(CompletionOutcome::AlreadyCompleted);
        }
        self.ensure_not_terminal(PaymentStatus::Completed)?;
        self.status = PaymentStatus::Completed;
        self.paid_date = Some(now);
        if reference.is_some() {
            self.reference = reference;
        }
        self.updated_at = now;
        Ok(CompletionOutcome::Completed)
    }

    pub fn mark_failed(&mut self, notes: Option<String>, now: DateTime<Utc>) -> Result<()> {
        self.ensure_not_terminal(PaymentStatus::Failed)?;
        self.status = PaymentStatus::Failed;
        if notes.is_some() {
            self.notes = notes;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Result<()> {
        self.ensure_not_terminal(PaymentStatus::Cancelled)?;
        self.status = PaymentStatus::Cancelled;
        if reason.is_some() {
            self.notes = reason;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !matches!(
            self.status,
            PaymentStatus::Completed | PaymentStatus::Cancelled
        ) && self.due_date.is_some_and(|due| due < today)
    }

    /// Days from `today` until the due date; negative once past due.
    pub fn get_days_until_due(&self, today: NaiveDate) -> Option<i64> {
        self.due_date.map(|due| (due - today).num_days())
    }

    /// Structural checks applied after decoding a stored payment.
    pub fn validate(&self) -> Result<()> {
        validate_currency_code(&self.currency)?;
        ensure_non_negative("amount", self.amount)?;
        if (self.status == PaymentStatus::Completed) != self.paid_date.is_some() {
            return Err(Error::Database(DatabaseError::Corrupted(format!(
                "Payment {}: paid date does not match status {}",
                self.id, self.status
            ))));
        }
        Ok(())
    }
}
