//! Booking lifecycle states and the legal transition table.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Draft,
    QuoteRequested,
    QuoteReceived,
    Negotiating,
    Confirmed,
    DepositPaid,
    InProgress,
    Completed,
    Cancelled,
    Declined,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 10] = [
        BookingStatus::Draft,
        BookingStatus::QuoteRequested,
        BookingStatus::QuoteReceived,
        BookingStatus::Negotiating,
        BookingStatus::Confirmed,
        BookingStatus::DepositPaid,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Declined,
    ];

    /// Targets reachable from this status in one step.
    pub fn allowed_transitions(&self) -> &'static [BookingStatus] {
        use BookingStatus::*;
        match self {
            Draft => &[QuoteRequested, Cancelled],
            QuoteRequested => &[QuoteReceived, Declined, Cancelled],
            QuoteReceived => &[Negotiating, Confirmed, Declined, Cancelled],
            Negotiating => &[Confirmed, Declined, Cancelled],
            Confirmed => &[DepositPaid, Cancelled],
            DepositPaid => &[InProgress, Cancelled],
            InProgress => &[Completed, Cancelled],
            Completed | Cancelled | Declined => &[],
        }
    }

    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Declined
        )
    }

    /// Statuses in which a quote must already be on record.
    pub fn has_quote(&self) -> bool {
        matches!(
            self,
            BookingStatus::QuoteReceived
                | BookingStatus::Negotiating
                | BookingStatus::Confirmed
                | BookingStatus::DepositPaid
                | BookingStatus::InProgress
                | BookingStatus::Completed
        )
    }

    /// Statuses in which an agreed amount must be on record.
    pub fn is_confirmed_or_later(&self) -> bool {
        matches!(
            self,
            BookingStatus::Confirmed
                | BookingStatus::DepositPaid
                | BookingStatus::InProgress
                | BookingStatus::Completed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Draft => "draft",
            BookingStatus::QuoteRequested => "quote_requested",
            BookingStatus::QuoteReceived => "quote_received",
            BookingStatus::Negotiating => "negotiating",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::DepositPaid => "deposit_paid",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
