use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::reconciliation_traits::ReconciliationServiceTrait;
use crate::bookings::{
    BookingRepositoryTrait, BookingRequest, BookingStatus, NewBookingRequest, NewMilestone,
};
use crate::budget::{
    get_recommended_split, BudgetItem, BudgetItemRepositoryTrait, BudgetSummary, NewBudgetItem,
    RecommendedSplit,
};
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::money::{ensure_same_currency, Money};
use crate::payments::{
    CompletionOutcome, NewPayment, Payment, PaymentRepositoryTrait, PaymentStatus, PaymentTotals,
};
use crate::settings::LedgerSettings;
use crate::store::{LedgerTransaction, TransactionExecutor};

/// Applies booking, budget and payment changes and keeps them consistent.
pub struct ReconciliationService<E: TransactionExecutor> {
    booking_repository: Arc<dyn BookingRepositoryTrait>,
    budget_repository: Arc<dyn BudgetItemRepositoryTrait>,
    payment_repository: Arc<dyn PaymentRepositoryTrait>,
    transaction_executor: E,
    settings: Arc<RwLock<LedgerSettings>>,
    event_sink: Arc<dyn DomainEventSink>,
}

/// What a payment completion job committed.
struct PaymentCompletion {
    payment: Payment,
    previous_status: PaymentStatus,
    budget_item: Option<BudgetItem>,
    outcome: CompletionOutcome,
}

impl<E: TransactionExecutor> ReconciliationService<E> {
    pub fn new(
        booking_repository: Arc<dyn BookingRepositoryTrait>,
        budget_repository: Arc<dyn BudgetItemRepositoryTrait>,
        payment_repository: Arc<dyn PaymentRepositoryTrait>,
        transaction_executor: E,
        settings: Arc<RwLock<LedgerSettings>>,
    ) -> Self {
        Self {
            booking_repository,
            budget_repository,
            payment_repository,
            transaction_executor,
            settings,
            event_sink: Arc::new(NoOpDomainEventSink),
        }
    }

    /// Sets the domain event sink for this service.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    fn settings(&self) -> LedgerSettings {
        self.settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Load, mutate and save one booking, emitting a status event when the
    /// status moved.
    async fn update_booking<F>(
        &self,
        booking_id: &str,
        reason: Option<String>,
        apply: F,
    ) -> Result<BookingRequest>
    where
        F: FnOnce(&mut BookingRequest, DateTime<Utc>) -> Result<()> + Send,
    {
        let mut booking = self.booking_repository.load(booking_id)?;
        let previous = booking.status;
        apply(&mut booking, Utc::now())?;
        let saved = self.booking_repository.save(booking).await?;

        if saved.status != previous {
            debug!(
                "Booking {} moved {} -> {}",
                saved.id, previous, saved.status
            );
            self.event_sink
                .emit(DomainEvent::booking_status_changed(&saved, previous, reason));
        }
        Ok(saved)
    }

    async fn update_payment<F>(&self, payment_id: &str, apply: F) -> Result<Payment>
    where
        F: FnOnce(&mut Payment, DateTime<Utc>) -> Result<()> + Send,
    {
        let mut payment = self.payment_repository.load(payment_id)?;
        let previous = payment.status;
        apply(&mut payment, Utc::now())?;
        let saved = self.payment_repository.save(payment).await?;

        if saved.status != previous {
            self.event_sink
                .emit(DomainEvent::payment_status_changed(&saved, previous));
        }
        Ok(saved)
    }

    fn ensure_same_event(kind: &str, id: &str, expected: &str, actual: &str) -> Result<()> {
        if expected != actual {
            return Err(Error::business_rule(format!(
                "{} {} belongs to event {}, not {}",
                kind, id, actual, expected
            )));
        }
        Ok(())
    }
}

/// Adds a payment to a budget item, applying the overpayment policy.
fn apply_budget_payment(
    item: &mut BudgetItem,
    payment: &Money,
    reject_overpayment: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let projected = item.projected_paid(payment)?;
    if projected.amount > item.effective_amount() {
        if reject_overpayment {
            return Err(Error::business_rule(format!(
                "Payment of {} would take budget item {} to {} against {}",
                payment,
                item.id,
                projected,
                item.effective()
            )));
        }
        warn!(
            "Budget item {} overpaid: paid {} against {}",
            item.id,
            projected,
            item.effective()
        );
    }
    item.add_payment(payment, now)
}

/// The transactional body of a payment completion.
fn complete_payment_in_transaction(
    tx: &mut dyn LedgerTransaction,
    payment_id: &str,
    reference: Option<String>,
    reject_overpayment: bool,
) -> Result<PaymentCompletion> {
    let now = Utc::now();
    let mut payment = tx.load_payment(payment_id)?;
    let previous_status = payment.status;

    let outcome = payment.mark_completed(reference, now)?;
    if outcome == CompletionOutcome::AlreadyCompleted {
        return Ok(PaymentCompletion {
            payment,
            previous_status,
            budget_item: None,
            outcome,
        });
    }

    let budget_item = match payment.budget_item_id.clone() {
        Some(budget_item_id) => {
            let item = reconcile_budget_item(tx, &payment, &budget_item_id, reject_overpayment, now)
                .map_err(|err| Error::ReconciliationFailure {
                    payment_id: payment.id.clone(),
                    budget_item_id,
                    reason: err.to_string(),
                })?;
            Some(item)
        }
        None => None,
    };

    let payment = tx.save_payment(payment)?;
    Ok(PaymentCompletion {
        payment,
        previous_status,
        budget_item,
        outcome,
    })
}

fn reconcile_budget_item(
    tx: &mut dyn LedgerTransaction,
    payment: &Payment,
    budget_item_id: &str,
    reject_overpayment: bool,
    now: DateTime<Utc>,
) -> Result<BudgetItem> {
    let mut item = tx.load_budget_item(budget_item_id)?;
    apply_budget_payment(&mut item, &payment.money(), reject_overpayment, now)?;
    tx.save_budget_item(item)
}

#[async_trait::async_trait]
impl<E: TransactionExecutor> ReconciliationServiceTrait for ReconciliationService<E> {
    async fn create_booking(&self, new_booking: NewBookingRequest) -> Result<BookingRequest> {
        new_booking.validate()?;
        let id = new_booking
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let booking = BookingRequest::new(new_booking, id, Utc::now());
        debug!(
            "Creating booking {} for event {} with vendor {}",
            booking.id, booking.event_id, booking.vendor_id
        );
        let saved = self.booking_repository.save(booking).await?;
        self.event_sink.emit(DomainEvent::booking_requested(&saved));
        Ok(saved)
    }

    async fn request_quote(&self, booking_id: &str) -> Result<BookingRequest> {
        self.update_booking(booking_id, None, |b, now| b.request_quote(now))
            .await
    }

    async fn submit_quote(
        &self,
        booking_id: &str,
        amount: Decimal,
        notes: Option<String>,
    ) -> Result<BookingRequest> {
        self.update_booking(booking_id, None, move |b, now| {
            b.submit_quote(amount, notes, now)
        })
        .await
    }

    async fn start_negotiation(
        &self,
        booking_id: &str,
        counter_amount: Option<Decimal>,
        notes: Option<String>,
    ) -> Result<BookingRequest> {
        self.update_booking(booking_id, None, move |b, now| {
            b.start_negotiation(counter_amount, notes, now)
        })
        .await
    }

    async fn accept_quote(
        &self,
        booking_id: &str,
        agreed_amount: Option<Decimal>,
        milestones: Vec<NewMilestone>,
    ) -> Result<BookingRequest> {
        let mut added = Vec::with_capacity(milestones.len());
        let saved = self
            .update_booking(booking_id, None, |b, now| {
                b.accept_quote(agreed_amount, now)?;
                for milestone in milestones {
                    let amount = milestone.amount;
                    let id = b.add_payment_milestone(
                        milestone.name,
                        milestone.amount,
                        milestone.due_date,
                        now,
                    )?;
                    added.push((id, amount));
                }
                Ok(())
            })
            .await?;

        if let Some(gap) = saved.schedule_discrepancy() {
            warn!(
                "Payment schedule of booking {} differs from the agreed amount by {} {}",
                saved.id, gap, saved.currency
            );
        }
        self.event_sink.emit_batch(
            added
                .into_iter()
                .map(|(id, amount)| DomainEvent::milestone_added(&saved.id, &id, amount))
                .collect(),
        );
        Ok(saved)
    }

    async fn decline_booking(
        &self,
        booking_id: &str,
        reason: Option<String>,
    ) -> Result<BookingRequest> {
        let event_reason = reason.clone();
        self.update_booking(booking_id, event_reason, move |b, now| b.decline(reason, now))
            .await
    }

    async fn cancel_booking(
        &self,
        booking_id: &str,
        reason: Option<String>,
    ) -> Result<BookingRequest> {
        let event_reason = reason.clone();
        self.update_booking(booking_id, event_reason, move |b, now| b.cancel(reason, now))
            .await
    }

    async fn start_service(&self, booking_id: &str) -> Result<BookingRequest> {
        self.update_booking(booking_id, None, |b, now| b.start_service(now))
            .await
    }

    async fn complete_booking(&self, booking_id: &str) -> Result<BookingRequest> {
        self.update_booking(booking_id, None, |b, now| b.complete(now))
            .await
    }

    async fn add_milestone(
        &self,
        booking_id: &str,
        milestone: NewMilestone,
    ) -> Result<BookingRequest> {
        let amount = milestone.amount;
        let mut milestone_id = String::new();
        let saved = self
            .update_booking(booking_id, None, |b, now| {
                milestone_id =
                    b.add_payment_milestone(milestone.name, amount, milestone.due_date, now)?;
                Ok(())
            })
            .await?;

        if let Some(gap) = saved.schedule_discrepancy() {
            debug!(
                "Booking {} schedule is {} {} away from the agreed amount",
                saved.id, gap, saved.currency
            );
        }
        self.event_sink
            .emit(DomainEvent::milestone_added(&saved.id, &milestone_id, amount));
        Ok(saved)
    }

    async fn mark_milestone_paid(
        &self,
        booking_id: &str,
        milestone_id: &str,
    ) -> Result<BookingRequest> {
        let auto_advance = self.settings().auto_advance_on_deposit;
        let saved = self
            .update_booking(booking_id, None, |b, now| {
                b.mark_milestone_paid(milestone_id, now)?;
                if auto_advance
                    && b.status == BookingStatus::Confirmed
                    && b.get_total_paid() > Decimal::ZERO
                {
                    b.transition_to(BookingStatus::DepositPaid, now)?;
                }
                Ok(())
            })
            .await?;

        let amount = saved
            .milestone(milestone_id)
            .map(|m| m.amount)
            .unwrap_or_default();
        self.event_sink
            .emit(DomainEvent::milestone_paid(&saved, milestone_id, amount));
        Ok(saved)
    }

    fn get_booking(&self, booking_id: &str) -> Result<BookingRequest> {
        self.booking_repository.load(booking_id)
    }

    fn list_bookings(&self, event_id: &str) -> Result<Vec<BookingRequest>> {
        self.booking_repository.list_by_event(event_id)
    }

    async fn create_budget_item(&self, new_item: NewBudgetItem) -> Result<BudgetItem> {
        new_item.validate()?;
        if let Some(booking_id) = new_item.booking_request_id.as_deref() {
            let booking = self.booking_repository.load(booking_id)?;
            Self::ensure_same_event("Booking", booking_id, &new_item.event_id, &booking.event_id)?;
            ensure_same_currency(&new_item.currency, &booking.currency)?;
        }

        let id = new_item
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let item = BudgetItem::new(new_item, id, Utc::now());
        debug!(
            "Allocating {} {} to {} for event {}",
            item.estimated_amount, item.currency, item.category, item.event_id
        );
        let saved = self.budget_repository.save(item).await?;
        self.event_sink.emit(DomainEvent::budget_item_created(&saved));
        Ok(saved)
    }

    async fn set_budget_actual(
        &self,
        budget_item_id: &str,
        actual_amount: Option<Decimal>,
    ) -> Result<BudgetItem> {
        let mut item = self.budget_repository.load(budget_item_id)?;
        item.set_actual_amount(actual_amount, Utc::now())?;
        let saved = self.budget_repository.save(item).await?;
        if saved.is_over_budget() {
            warn!(
                "Budget item {} is over budget by {} {}",
                saved.id,
                saved.overage_amount(),
                saved.currency
            );
        }
        self.event_sink.emit(DomainEvent::budget_item_updated(&saved));
        Ok(saved)
    }

    async fn add_budget_payment(
        &self,
        budget_item_id: &str,
        amount: Decimal,
    ) -> Result<BudgetItem> {
        let reject_overpayment = self.settings().reject_budget_overpayment;
        let mut item = self.budget_repository.load(budget_item_id)?;
        let payment = Money::new(amount, item.currency.as_str());
        apply_budget_payment(&mut item, &payment, reject_overpayment, Utc::now())?;
        let saved = self.budget_repository.save(item).await?;
        self.event_sink.emit(DomainEvent::budget_item_updated(&saved));
        Ok(saved)
    }

    fn get_budget_item(&self, budget_item_id: &str) -> Result<BudgetItem> {
        self.budget_repository.load(budget_item_id)
    }

    fn get_budget_summary(&self, event_id: &str) -> Result<BudgetSummary> {
        let items = self.budget_repository.list_by_event(event_id)?;
        BudgetSummary::from_items(event_id, &self.settings().base_currency, &items)
    }

    fn get_recommended_split(&self, total_budget: Decimal) -> Vec<RecommendedSplit> {
        get_recommended_split(total_budget)
    }

    async fn create_payment(&self, new_payment: NewPayment) -> Result<Payment> {
        new_payment.validate()?;

        if let Some(booking_id) = new_payment.booking_request_id.as_deref() {
            let booking = self.booking_repository.load(booking_id)?;
            Self::ensure_same_event(
                "Booking",
                booking_id,
                &new_payment.event_id,
                &booking.event_id,
            )?;
            ensure_same_currency(&booking.currency, &new_payment.currency)?;
        }
        if let Some(item_id) = new_payment.budget_item_id.as_deref() {
            let item = self.budget_repository.load(item_id)?;
            Self::ensure_same_event("Budget item", item_id, &new_payment.event_id, &item.event_id)?;
            ensure_same_currency(&item.currency, &new_payment.currency)?;
        }

        let id = new_payment
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let payment = Payment::new(new_payment, id, Utc::now());
        debug!(
            "Recording {} payment {} of {} {}",
            payment.payment_type.as_str(),
            payment.id,
            payment.amount,
            payment.currency
        );
        let saved = self.payment_repository.save(payment).await?;
        self.event_sink.emit(DomainEvent::payment_created(&saved));
        Ok(saved)
    }

    async fn start_payment_processing(&self, payment_id: &str) -> Result<Payment> {
        self.update_payment(payment_id, |p, now| p.start_processing(now))
            .await
    }

    async fn complete_payment(
        &self,
        payment_id: &str,
        reference: Option<String>,
    ) -> Result<Payment> {
        let reject_overpayment = self.settings().reject_budget_overpayment;
        let payment_id_for_tx = payment_id.to_string();

        let completion = self
            .transaction_executor
            .execute(move |tx| {
                complete_payment_in_transaction(tx, &payment_id_for_tx, reference, reject_overpayment)
            })
            .await?;

        if completion.outcome == CompletionOutcome::AlreadyCompleted {
            debug!(
                "Payment {} was already completed; budget left untouched",
                completion.payment.id
            );
            return Ok(completion.payment);
        }

        let mut events = vec![DomainEvent::payment_status_changed(
            &completion.payment,
            completion.previous_status,
        )];
        if let Some(item) = completion.budget_item.as_ref() {
            debug!(
                "Reconciled payment {} into budget item {} (paid {} of {} {})",
                completion.payment.id,
                item.id,
                item.paid_amount,
                item.effective_amount(),
                item.currency
            );
            events.push(DomainEvent::payment_reconciled(&completion.payment, item));
            events.push(DomainEvent::budget_item_updated(item));
        }
        self.event_sink.emit_batch(events);
        Ok(completion.payment)
    }

    async fn fail_payment(&self, payment_id: &str, notes: Option<String>) -> Result<Payment> {
        self.update_payment(payment_id, move |p, now| p.mark_failed(notes, now))
            .await
    }

    async fn cancel_payment(&self, payment_id: &str, reason: Option<String>) -> Result<Payment> {
        self.update_payment(payment_id, move |p, now| p.cancel(reason, now))
            .await
    }

    fn get_payment(&self, payment_id: &str) -> Result<Payment> {
        self.payment_repository.load(payment_id)
    }

    fn get_payment_totals(&self, event_id: &str) -> Result<PaymentTotals> {
        let payments = self.payment_repository.list_by_event(event_id)?;
        PaymentTotals::from_payments(event_id, &payments, Utc::now().date_naive())
    }
}
