//! JSON command scripts.
//!
//! A script is a JSON array of steps. Each step names an operation in `op`
//! and carries its arguments in camelCase:
//!
//! ```json
//! [
//!   { "op": "createBudgetItem", "id": "b-venue", "eventId": "evt-1",
//!     "category": "venue", "description": "Hall", "estimatedAmount": "300000",
//!     "currency": "INR" },
//!   { "op": "addBudgetPayment", "budgetItemId": "b-venue", "amount": "50000" },
//!   { "op": "completePayment", "paymentId": "p-404", "expectFailure": true }
//! ]
//! ```
//!
//! Steps marked `expectFailure` count as passing when they fail.

use anyhow::Context;
use eventplan_core::bookings::{NewBookingRequest, NewMilestone};
use eventplan_core::budget::{BudgetSummary, NewBudgetItem};
use eventplan_core::constants::DISPLAY_DECIMAL_PRECISION;
use eventplan_core::errors::Error;
use eventplan_core::payments::NewPayment;
use eventplan_core::reconciliation::ReconciliationServiceTrait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::main_lib::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    CreateBooking(NewBookingRequest),
    RequestQuote {
        booking_id: String,
    },
    SubmitQuote {
        booking_id: String,
        amount: Decimal,
        #[serde(default)]
        notes: Option<String>,
    },
    StartNegotiation {
        booking_id: String,
        #[serde(default)]
        counter_amount: Option<Decimal>,
        #[serde(default)]
        notes: Option<String>,
    },
    AcceptQuote {
        booking_id: String,
        #[serde(default)]
        agreed_amount: Option<Decimal>,
        #[serde(default)]
        milestones: Vec<NewMilestone>,
    },
    DeclineBooking {
        booking_id: String,
        #[serde(default)]
        reason: Option<String>,
    },
    CancelBooking {
        booking_id: String,
        #[serde(default)]
        reason: Option<String>,
    },
    StartService {
        booking_id: String,
    },
    CompleteBooking {
        booking_id: String,
    },
    AddMilestone {
        booking_id: String,
        milestone: NewMilestone,
    },
    /// `milestone` is a milestone id or name.
    MarkMilestonePaid {
        booking_id: String,
        milestone: String,
    },
    ShowBooking {
        booking_id: String,
    },
    CreateBudgetItem(NewBudgetItem),
    SetBudgetActual {
        budget_item_id: String,
        #[serde(default)]
        actual_amount: Option<Decimal>,
    },
    AddBudgetPayment {
        budget_item_id: String,
        amount: Decimal,
    },
    BudgetSummary {
        event_id: String,
    },
    RecommendedSplit {
        total_budget: Decimal,
    },
    CreatePayment(NewPayment),
    StartPaymentProcessing {
        payment_id: String,
    },
    CompletePayment {
        payment_id: String,
        #[serde(default)]
        reference: Option<String>,
    },
    FailPayment {
        payment_id: String,
        #[serde(default)]
        notes: Option<String>,
    },
    CancelPayment {
        payment_id: String,
        #[serde(default)]
        reason: Option<String>,
    },
    PaymentTotals {
        event_id: String,
    },
    DumpState,
}

/// Result line for one step.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step: usize,
    pub op: String,
    pub ok: bool,
    pub expected_failure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    fn passed(&self) -> bool {
        self.ok != self.expected_failure
    }
}

#[derive(Debug, Default)]
pub struct ScriptReport {
    pub outcomes: Vec<StepOutcome>,
    pub succeeded: usize,
    pub expected_failures: usize,
    pub unexpected_failures: usize,
}

enum StepError {
    Parse(serde_json::Error),
    Domain(Error),
}

impl From<Error> for StepError {
    fn from(err: Error) -> Self {
        StepError::Domain(err)
    }
}

impl From<serde_json::Error> for StepError {
    fn from(err: serde_json::Error) -> Self {
        StepError::Parse(err)
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, StepError> {
    Ok(serde_json::to_value(value)?)
}

fn log_budget_summary(summary: &BudgetSummary) {
    let dp = DISPLAY_DECIMAL_PRECISION;
    tracing::info!(
        "Budget {}: paid {} of {} {} ({}%), {} remaining",
        summary.event_id,
        summary.total_paid.round_dp(dp),
        summary.total_effective.round_dp(dp),
        summary.currency,
        summary.payment_progress,
        summary.total_remaining.round_dp(dp)
    );
    for category in &summary.categories {
        tracing::info!(
            "  {:<28} est {:>14} paid {:>14}{}",
            category.label,
            category.estimated.round_dp(dp),
            category.paid.round_dp(dp),
            if category.is_over_budget { "  OVER" } else { "" }
        );
    }
}

async fn execute(state: &AppState, command: Command) -> Result<Value, StepError> {
    let svc = state.reconciliation_service.as_ref();
    match command {
        Command::CreateBooking(input) => to_value(&svc.create_booking(input).await?),
        Command::RequestQuote { booking_id } => to_value(&svc.request_quote(&booking_id).await?),
        Command::SubmitQuote {
            booking_id,
            amount,
            notes,
        } => to_value(&svc.submit_quote(&booking_id, amount, notes).await?),
        Command::StartNegotiation {
            booking_id,
            counter_amount,
            notes,
        } => to_value(
            &svc.start_negotiation(&booking_id, counter_amount, notes)
                .await?,
        ),
        Command::AcceptQuote {
            booking_id,
            agreed_amount,
            milestones,
        } => to_value(
            &svc.accept_quote(&booking_id, agreed_amount, milestones)
                .await?,
        ),
        Command::DeclineBooking { booking_id, reason } => {
            to_value(&svc.decline_booking(&booking_id, reason).await?)
        }
        Command::CancelBooking { booking_id, reason } => {
            to_value(&svc.cancel_booking(&booking_id, reason).await?)
        }
        Command::StartService { booking_id } => to_value(&svc.start_service(&booking_id).await?),
        Command::CompleteBooking { booking_id } => {
            to_value(&svc.complete_booking(&booking_id).await?)
        }
        Command::AddMilestone {
            booking_id,
            milestone,
        } => to_value(&svc.add_milestone(&booking_id, milestone).await?),
        Command::MarkMilestonePaid {
            booking_id,
            milestone,
        } => {
            let booking = svc.get_booking(&booking_id)?;
            let milestone_id = booking
                .payment_schedule
                .iter()
                .find(|m| m.id == milestone || m.name == milestone)
                .map(|m| m.id.clone())
                .ok_or_else(|| Error::not_found("PaymentMilestone", milestone.as_str()))?;
            to_value(&svc.mark_milestone_paid(&booking_id, &milestone_id).await?)
        }
        Command::ShowBooking { booking_id } => to_value(&svc.get_booking(&booking_id)?),
        Command::CreateBudgetItem(input) => to_value(&svc.create_budget_item(input).await?),
        Command::SetBudgetActual {
            budget_item_id,
            actual_amount,
        } => to_value(&svc.set_budget_actual(&budget_item_id, actual_amount).await?),
        Command::AddBudgetPayment {
            budget_item_id,
            amount,
        } => to_value(&svc.add_budget_payment(&budget_item_id, amount).await?),
        Command::BudgetSummary { event_id } => {
            let summary = svc.get_budget_summary(&event_id)?;
            log_budget_summary(&summary);
            to_value(&summary)
        }
        Command::RecommendedSplit { total_budget } => {
            to_value(&svc.get_recommended_split(total_budget))
        }
        Command::CreatePayment(input) => to_value(&svc.create_payment(input).await?),
        Command::StartPaymentProcessing { payment_id } => {
            to_value(&svc.start_payment_processing(&payment_id).await?)
        }
        Command::CompletePayment {
            payment_id,
            reference,
        } => to_value(&svc.complete_payment(&payment_id, reference).await?),
        Command::FailPayment { payment_id, notes } => {
            to_value(&svc.fail_payment(&payment_id, notes).await?)
        }
        Command::CancelPayment { payment_id, reason } => {
            to_value(&svc.cancel_payment(&payment_id, reason).await?)
        }
        Command::PaymentTotals { event_id } => to_value(&svc.get_payment_totals(&event_id)?),
        Command::DumpState => Ok(state.store.database().snapshot().to_json()?),
    }
}

/// Runs every step of `source` in order.
pub async fn run_script(
    state: &AppState,
    source: &str,
    fail_fast: bool,
) -> anyhow::Result<ScriptReport> {
    let steps: Vec<Value> =
        serde_json::from_str(source).context("Script must be a JSON array of steps")?;
    let mut report = ScriptReport::default();

    for (index, raw) in steps.into_iter().enumerate() {
        let step = index + 1;
        let op = raw
            .get("op")
            .and_then(Value::as_str)
            .unwrap_or("<missing>")
            .to_string();
        let expected_failure = raw
            .get("expectFailure")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let result = match serde_json::from_value::<Command>(raw) {
            Ok(command) => execute(state, command).await,
            Err(e) => Err(StepError::Parse(e)),
        };

        let outcome = match result {
            Ok(value) => StepOutcome {
                step,
                op,
                ok: true,
                expected_failure,
                result: Some(value),
                error_kind: None,
                error: None,
            },
            Err(err) => {
                let (kind, message) = match err {
                    StepError::Parse(e) => ("invalid_step".to_string(), e.to_string()),
                    StepError::Domain(e) => (e.kind().to_string(), e.to_string()),
                };
                if expected_failure {
                    tracing::debug!("Step {} ({}) failed as expected: {}", step, op, message);
                } else {
                    tracing::warn!("Step {} ({}) failed: {}", step, op, message);
                }
                StepOutcome {
                    step,
                    op,
                    ok: false,
                    expected_failure,
                    result: None,
                    error_kind: Some(kind),
                    error: Some(message),
                }
            }
        };

        match (outcome.ok, outcome.passed()) {
            (true, true) => report.succeeded += 1,
            (false, true) => report.expected_failures += 1,
            _ => report.unexpected_failures += 1,
        }
        let stop = fail_fast && !outcome.passed();
        report.outcomes.push(outcome);
        if stop {
            break;
        }
    }
    Ok(report)
}
