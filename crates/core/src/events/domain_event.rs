//! Domain event types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::bookings::{BookingRequest, BookingStatus};
use crate::budget::{BudgetCategory, BudgetItem};
use crate::payments::{Payment, PaymentStatus};

/// Audit events emitted by the reconciliation service after a successful write.
///
/// They record facts about committed changes; adapters forward them to
/// notification or activity-feed channels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A planner opened a booking request with a vendor.
    BookingRequested {
        booking_id: String,
        event_id: String,
        vendor_id: String,
        status: BookingStatus,
    },

    /// A booking moved between lifecycle states.
    BookingStatusChanged {
        booking_id: String,
        event_id: String,
        from: BookingStatus,
        to: BookingStatus,
        reason: Option<String>,
    },

    /// A milestone was appended to a booking's payment schedule.
    MilestoneAdded {
        booking_id: String,
        milestone_id: String,
        amount: Decimal,
    },

    /// A milestone was paid.
    MilestonePaid {
        booking_id: String,
        milestone_id: String,
        amount: Decimal,
        outstanding_balance: Decimal,
    },

    BudgetItemCreated {
        budget_item_id: String,
        event_id: String,
        category: BudgetCategory,
    },

    /// Paid or actual amounts of a budget item changed.
    BudgetItemUpdated {
        budget_item_id: String,
        event_id: String,
        paid_amount: Decimal,
        is_over_budget: bool,
    },

    PaymentCreated {
        payment_id: String,
        event_id: String,
        amount: Decimal,
        currency: String,
    },

    PaymentStatusChanged {
        payment_id: String,
        event_id: String,
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// A completed payment was applied to its budget item.
    PaymentReconciled {
        payment_id: String,
        budget_item_id: String,
        amount: Decimal,
        paid_amount: Decimal,
    },
}

impl DomainEvent {
    /// Whether the event records a change to the booking, budget item or
    /// payment with this id.
    pub fn touches(&self, aggregate_id: &str) -> bool {
        match self {
            Self::BookingRequested { booking_id, .. }
            | Self::BookingStatusChanged { booking_id, .. }
            | Self::MilestoneAdded { booking_id, .. }
            | Self::MilestonePaid { booking_id, .. } => booking_id == aggregate_id,
            Self::BudgetItemCreated { budget_item_id, .. }
            | Self::BudgetItemUpdated { budget_item_id, .. } => budget_item_id == aggregate_id,
            Self::PaymentCreated { payment_id, .. }
            | Self::PaymentStatusChanged { payment_id, .. } => payment_id == aggregate_id,
            Self::PaymentReconciled {
                payment_id,
                budget_item_id,
                ..
            } => payment_id == aggregate_id || budget_item_id == aggregate_id,
        }
    }

    pub fn booking_requested(booking: &BookingRequest) -> Self {
        Self::BookingRequested {
            booking_id: booking.id.clone(),
            event_id: booking.event_id.clone(),
            vendor_id: booking.vendor_id.clone(),
            status: booking.status,
        }
    }

    pub fn booking_status_changed(
        booking: &BookingRequest,
        from: BookingStatus,
        reason: Option<String>,
    ) -> Self {
        Self::BookingStatusChanged {
            booking_id: booking.id.clone(),
            event_id: booking.event_id.clone(),
            from,
            to: booking.status,
            reason,
        }
    }

    pub fn milestone_added(booking_id: &str, milestone_id: &str, amount: Decimal) -> Self {
        Self::MilestoneAdded {
            booking_id: booking_id.to_string(),
            milestone_id: milestone_id.to_string(),
            amount,
        }
    }

    pub fn milestone_paid(booking: &BookingRequest, milestone_id: &str, amount: Decimal) -> Self {
        Self::MilestonePaid {
            booking_id: booking.id.clone(),
            milestone_id: milestone_id.to_string(),
            amount,
            outstanding_balance: booking.get_outstanding_balance(),
        }
    }

    pub fn budget_item_created(item: &BudgetItem) -> Self {
        Self::BudgetItemCreated {
            budget_item_id: item.id.clone(),
            event_id: item.event_id.clone(),
            category: item.category,
        }
    }

    pub fn budget_item_updated(item: &BudgetItem) -> Self {
        Self::BudgetItemUpdated {
            budget_item_id: item.id.clone(),
            event_id: item.event_id.clone(),
            paid_amount: item.paid_amount,
            is_over_budget: item.is_over_budget(),
        }
    }

    pub fn payment_created(payment: &Payment) -> Self {
        Self::PaymentCreated {
            payment_id: payment.id.clone(),
            event_id: payment.event_id.clone(),
            amount: payment.amount,
            currency: payment.currency.clone(),
        }
    }

    pub fn payment_status_changed(payment: &Payment, from: PaymentStatus) -> Self {
        Self::PaymentStatusChanged {
            payment_id: payment.id.clone(),
            event_id: payment.event_id.clone(),
            from,
            to: payment.status,
        }
    }

    pub fn payment_reconciled(payment: &Payment, item: &BudgetItem) -> Self {
        Self::PaymentReconciled {
            payment_id: payment.id.clone(),
            budget_item_id: item.id.clone(),
            amount: payment.amount,
            paid_amount: item.paid_amount,
        }
    }
}
