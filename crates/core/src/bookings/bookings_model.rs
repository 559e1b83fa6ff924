//! Booking request domain models.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::booking_status::BookingStatus;
use crate::budget::{ensure_non_negative, BudgetCategory};
use crate::constants::BOOKING_ENTITY;
use crate::errors::{DatabaseError, Error, Result, ValidationError};
use crate::money::{add_amounts, sum_amounts, validate_currency_code};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Pending,
    Paid,
    Overdue,
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MilestoneStatus::Pending => "pending",
            MilestoneStatus::Paid => "paid",
            MilestoneStatus::Overdue => "overdue",
        })
    }
}

/// A scheduled partial payment inside a booking's payment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMilestone {
    pub id: String,
    pub name: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub paid_date: Option<DateTime<Utc>>,
    pub status: MilestoneStatus,
}

impl PaymentMilestone {
    pub fn is_paid(&self) -> bool {
        self.status == MilestoneStatus::Paid
    }

    /// Status as of `today`: unpaid milestones past their due date read as overdue.
    pub fn effective_status(&self, today: NaiveDate) -> MilestoneStatus {
        match self.status {
            MilestoneStatus::Paid => MilestoneStatus::Paid,
            _ if self.due_date < today => MilestoneStatus::Overdue,
            other => other,
        }
    }
}

/// Input for one milestone of a payment schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMilestone {
    pub name: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

/// One planner-vendor negotiation for a service category of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub id: String,
    pub event_id: String,
    pub vendor_id: String,
    pub planner_id: String,
    pub function_id: Option<String>,
    pub service_category: BudgetCategory,
    pub status: BookingStatus,
    pub quoted_amount: Option<Decimal>,
    pub agreed_amount: Option<Decimal>,
    pub currency: String,
    #[serde(default)]
    pub payment_schedule: Vec<PaymentMilestone>,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub requested_date: DateTime<Utc>,
    pub response_date: Option<DateTime<Utc>>,
    pub confirmation_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: i64,
}

/// Input model for opening a booking request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub event_id: String,
    pub vendor_id: String,
    pub planner_id: String,
    #[serde(default)]
    pub function_id: Option<String>,
    pub service_category: BudgetCategory,
    pub currency: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Start in `draft` instead of sending the quote request right away.
    #[serde(default)]
    pub as_draft: bool,
}

impl NewBookingRequest {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("eventId", &self.event_id),
            ("vendorId", &self.vendor_id),
            ("plannerId", &self.planner_id),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field.to_string()).into());
            }
        }
        validate_currency_code(&self.currency)
    }
}

impl BookingRequest {
    pub fn new(input: NewBookingRequest, id: String, now: DateTime<Utc>) -> Self {
        let status = if input.as_draft {
            BookingStatus::Draft
        } else {
            BookingStatus::QuoteRequested
        };
        Self {
            id,
            event_id: input.event_id,
            vendor_id: input.vendor_id,
            planner_id: input.planner_id,
            function_id: input.function_id,
            service_category: input.service_category,
            status,
            quoted_amount: None,
            agreed_amount: None,
            currency: input.currency,
            payment_schedule: Vec::new(),
            notes: input.notes,
            cancellation_reason: None,
            requested_date: now,
            response_date: None,
            confirmation_date: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Moves to `target` if the transition table allows it.
    pub fn transition_to(&mut self, target: BookingStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(Error::invalid_transition(&self.id, self.status, target));
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    /// Terminal bookings reject every transition operation with `InvalidTransition`.
    fn ensure_not_terminal(&self, target: BookingStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::invalid_transition(&self.id, self.status, target));
        }
        Ok(())
    }

    /// Sends a drafted request to the vendor.
    pub fn request_quote(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition_to(BookingStatus::QuoteRequested, now)?;
        self.requested_date = now;
        Ok(())
    }

    pub fn submit_quote(
        &mut self,
        amount: Decimal,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_not_terminal(BookingStatus::QuoteReceived)?;
        if self.status != BookingStatus::QuoteRequested {
            return Err(Error::business_rule(format!(
                "Cannot submit a quote for booking {} in status {}",
                self.id, self.status
            )));
        }
        ensure_non_negative("quotedAmount", amount)?;
        self.transition_to(BookingStatus::QuoteReceived, now)?;
        self.quoted_amount = Some(amount);
        self.response_date = Some(now);
        if notes.is_some() {
            self.notes = notes;
        }
        Ok(())
    }

    /// Opens a negotiation round; a counter offer replaces the quoted amount.
    pub fn start_negotiation(
        &mut self,
        counter_amount: Option<Decimal>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(amount) = counter_amount {
            ensure_non_negative("counterAmount", amount)?;
        }
        self.transition_to(BookingStatus::Negotiating, now)?;
        if counter_amount.is_some() {
            self.quoted_amount = counter_amount;
        }
        if notes.is_some() {
            self.notes = notes;
        }
        Ok(())
    }

    /// Confirms the booking at `agreed_amount`, or at the quoted amount when absent.
    pub fn accept_quote(
        &mut self,
        agreed_amount: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_not_terminal(BookingStatus::Confirmed)?;
        if !matches!(
            self.status,
            BookingStatus::QuoteReceived | BookingStatus::Negotiating
        ) {
            return Err(Error::business_rule(format!(
                "Cannot accept a quote for booking {} in status {}",
                self.id, self.status
            )));
        }
        let agreed = agreed_amount.or(self.quoted_amount).ok_or_else(|| {
            Error::business_rule(format!("Booking {} has no amount to agree on", self.id))
        })?;
        ensure_non_negative("agreedAmount", agreed)?;
        self.transition_to(BookingStatus::Confirmed, now)?;
        self.agreed_amount = Some(agreed);
        self.confirmation_date = Some(now);
        Ok(())
    }

    pub fn decline(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Result<()> {
        self.transition_to(BookingStatus::Declined, now)?;
        self.cancellation_reason = reason;
        Ok(())
    }

    pub fn cancel(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Result<()> {
        self.transition_to(BookingStatus::Cancelled, now)?;
        self.cancellation_reason = reason;
        Ok(())
    }

    /// Vendor starts delivering the service.
    pub fn start_service(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition_to(BookingStatus::InProgress, now)
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition_to(BookingStatus::Completed, now)
    }

    /// Appends a pending milestone and returns its id.
    pub fn add_payment_milestone(
        &mut self,
        name: impl Into<String>,
        amount: Decimal,
        due_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<String> {
        if self.status.is_terminal() {
            return Err(Error::business_rule(format!(
                "Cannot add a milestone to booking {} in terminal status {}",
                self.id, self.status
            )));
        }
        ensure_non_negative("milestone.amount", amount)?;
        add_amounts("paymentSchedule", self.schedule_total(), amount)?;
        let id = Uuid::new_v4().to_string();
        self.payment_schedule.push(PaymentMilestone {
            id: id.clone(),
            name: name.into(),
            amount,
            due_date,
            paid_date: None,
            status: MilestoneStatus::Pending,
        });
        self.updated_at = now;
        Ok(id)
    }

    /// Marks a milestone paid. Never changes the booking status itself.
    pub fn mark_milestone_paid(&mut self, milestone_id: &str, now: DateTime<Utc>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::business_rule(format!(
                "Cannot pay a milestone of booking {} in terminal status {}",
                self.id, self.status
            )));
        }
        let milestone = self
            .payment_schedule
            .iter_mut()
            .find(|m| m.id == milestone_id)
            .ok_or_else(|| Error::not_found("PaymentMilestone", milestone_id))?;
        if milestone.is_paid() {
            return Err(Error::business_rule(format!(
                "Milestone {} is already paid",
                milestone_id
            )));
        }
        milestone.paid_date = Some(now);
        milestone.status = MilestoneStatus::Paid;
        self.updated_at = now;
        Ok(())
    }

    pub fn milestone(&self, milestone_id: &str) -> Option<&PaymentMilestone> {
        self.payment_schedule.iter().find(|m| m.id == milestone_id)
    }

    pub fn get_total_paid(&self) -> Decimal {
        self.payment_schedule
            .iter()
            .filter(|m| m.is_paid())
            .map(|m| m.amount)
            .sum()
    }

    pub fn get_outstanding_balance(&self) -> Decimal {
        self.agreed_amount.unwrap_or(Decimal::ZERO) - self.get_total_paid()
    }

    pub fn is_fully_paid(&self) -> bool {
        self.get_outstanding_balance() <= Decimal::ZERO
    }

    /// Sum of every scheduled milestone, paid or not. Milestones are only
    /// added while this stays in the decimal range.
    pub fn schedule_total(&self) -> Decimal {
        self.payment_schedule.iter().map(|m| m.amount).sum()
    }

    /// `agreed - schedule_total` when a schedule exists and does not add up to
    /// the agreed amount.
    pub fn schedule_discrepancy(&self) -> Option<Decimal> {
        let agreed = self.agreed_amount?;
        if self.payment_schedule.is_empty() {
            return None;
        }
        let diff = agreed - self.schedule_total();
        (!diff.is_zero()).then_some(diff)
    }

    pub fn overdue_milestones(&self, today: NaiveDate) -> Vec<&PaymentMilestone> {
        self.payment_schedule
            .iter()
            .filter(|m| m.effective_status(today) == MilestoneStatus::Overdue)
            .collect()
    }

    /// Structural checks applied after decoding a stored booking.
    pub fn validate(&self) -> Result<()> {
        validate_currency_code(&self.currency)?;

        let mut seen = HashSet::new();
        for m in &self.payment_schedule {
            if !seen.insert(m.id.as_str()) {
                return Err(corrupted(&self.id, format!("duplicate milestone id {}", m.id)));
            }
            ensure_non_negative("milestone.amount", m.amount)?;
            if m.is_paid() != m.paid_date.is_some() {
                return Err(corrupted(
                    &self.id,
                    format!("milestone {} paid date does not match status {}", m.id, m.status),
                ));
            }
        }
        let amounts = self.payment_schedule.iter().map(|m| m.amount);
        if sum_amounts("paymentSchedule", amounts).is_err() {
            return Err(corrupted(&self.id, "payment schedule total overflows".to_string()));
        }

        if self.status.has_quote() && self.quoted_amount.is_none() {
            return Err(corrupted(
                &self.id,
                format!("status {} requires a quoted amount", self.status),
            ));
        }
        if self.status.is_confirmed_or_later() != self.agreed_amount.is_some()
            && !matches!(
                self.status,
                BookingStatus::Cancelled | BookingStatus::Declined
            )
        {
            return Err(corrupted(
                &self.id,
                format!("agreed amount inconsistent with status {}", self.status),
            ));
        }
        Ok(())
    }
}

fn corrupted(id: &str, detail: String) -> Error {
    Error::Database(DatabaseError::Corrupted(format!("{} {}: {}", BOOKING_ENTITY, id, detail)))
}
