//! Read-side totals over an event's payments.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::payments_model::{Payment, PaymentStatus, PaymentType};
use crate::errors::{Result, ValidationError};
use crate::money::add_amounts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTotals {
    pub event_id: String,
    pub payment_count: usize,
    /// Completed client payments, vendor payments and expenses.
    pub total_paid: Decimal,
    /// Completed refunds.
    pub total_refunded: Decimal,
    pub net_paid: Decimal,
    /// Pending or processing.
    pub total_pending: Decimal,
    pub total_overdue: Decimal,
    pub overdue_count: usize,
    pub total_failed: Decimal,
    /// Completed amounts per payment type.
    pub completed_by_type: BTreeMap<PaymentType, Decimal>,
}

impl PaymentTotals {
    pub fn from_payments(event_id: &str, payments: &[Payment], today: NaiveDate) -> Result<Self> {
        let mut totals = Self {
            event_id: event_id.to_string(),
            payment_count: payments.len(),
            total_paid: Decimal::ZERO,
            total_refunded: Decimal::ZERO,
            net_paid: Decimal::ZERO,
            total_pending: Decimal::ZERO,
            total_overdue: Decimal::ZERO,
            overdue_count: 0,
            total_failed: Decimal::ZERO,
            completed_by_type: BTreeMap::new(),
        };

        for payment in payments {
            match payment.status {
                PaymentStatus::Completed => {
                    let by_type = totals
                        .completed_by_type
                        .entry(payment.payment_type)
                        .or_insert(Decimal::ZERO);
                    *by_type = add_amounts(payment.payment_type.as_str(), *by_type, payment.amount)?;
                    if payment.payment_type == PaymentType::Refund {
                        totals.total_refunded =
                            add_amounts("refunded", totals.total_refunded, payment.amount)?;
                    } else {
                        totals.total_paid = add_amounts("paid", totals.total_paid, payment.amount)?;
                    }
                }
                PaymentStatus::Pending | PaymentStatus::Processing => {
                    totals.total_pending =
                        add_amounts("pending", totals.total_pending, payment.amount)?;
                }
                PaymentStatus::Failed => {
                    totals.total_failed = add_amounts("failed", totals.total_failed, payment.amount)?;
                }
                PaymentStatus::Cancelled => {}
            }
            if payment.is_overdue(today) {
                totals.total_overdue = add_amounts("overdue", totals.total_overdue, payment.amount)?;
                totals.overdue_count += 1;
            }
        }

        totals.net_paid = totals
            .total_paid
            .checked_sub(totals.total_refunded)
            .ok_or_else(|| ValidationError::AmountOverflow("netPaid".to_string()))?;
        Ok(totals)
    }
}
