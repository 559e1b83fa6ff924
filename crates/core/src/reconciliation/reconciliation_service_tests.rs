#[cfg(test)]
mod tests {
    use crate::bookings::{
        BookingRepositoryTrait, BookingRequest, BookingStatus, NewBookingRequest, NewMilestone,
    };
    use crate::budget::{BudgetCategory, BudgetItem, BudgetItemRepositoryTrait, NewBudgetItem};
    use crate::errors::{DatabaseError, Error, Result, ValidationError};
    use crate::events::{CollectingDomainEventSink, DomainEvent};
    use crate::payments::{
        NewPayment, Payment, PaymentMethod, PaymentRepositoryTrait, PaymentStatus, PaymentType,
    };
    use crate::reconciliation::{ReconciliationService, ReconciliationServiceTrait};
    use crate::settings::LedgerSettings;
    use crate::store::{LedgerTransaction, TransactionExecutor};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, RwLock};

    // --- Mock ledger store ---

    #[derive(Clone, Default)]
    struct MockTables {
        bookings: HashMap<String, BookingRequest>,
        budget_items: HashMap<String, BudgetItem>,
        payments: HashMap<String, Payment>,
        fail_budget_saves: bool,
    }

    fn next_version(
        entity: &'static str,
        id: &str,
        stored: Option<i64>,
        incoming: i64,
    ) -> Result<i64> {
        let found = stored.unwrap_or(0);
        if found != incoming {
            return Err(Error::ConcurrencyConflict {
                entity,
                id: id.to_string(),
                expected: incoming,
                found,
            });
        }
        Ok(incoming + 1)
    }

    impl LedgerTransaction for MockTables {
        fn load_booking(&mut self, booking_id: &str) -> Result<BookingRequest> {
            self.bookings
                .get(booking_id)
                .cloned()
                .ok_or_else(|| Error::not_found("BookingRequest", booking_id))
        }

        fn save_booking(&mut self, mut booking: BookingRequest) -> Result<BookingRequest> {
            let stored = self.bookings.get(&booking.id).map(|b| b.version);
            booking.version = next_version("BookingRequest", &booking.id, stored, booking.version)?;
            self.bookings.insert(booking.id.clone(), booking.clone());
            Ok(booking)
        }

        fn load_budget_item(&mut self, budget_item_id: &str) -> Result<BudgetItem> {
            self.budget_items
                .get(budget_item_id)
                .cloned()
                .ok_or_else(|| Error::not_found("BudgetItem", budget_item_id))
        }

        fn save_budget_item(&mut self, mut item: BudgetItem) -> Result<BudgetItem> {
            if self.fail_budget_saves {
                return Err(DatabaseError::QueryFailed("disk full".to_string()).into());
            }
            let stored = self.budget_items.get(&item.id).map(|i| i.version);
            item.version = next_version("BudgetItem", &item.id, stored, item.version)?;
            self.budget_items.insert(item.id.clone(), item.clone());
            Ok(item)
        }

        fn load_payment(&mut self, payment_id: &str) -> Result<Payment> {
            self.payments
                .get(payment_id)
                .cloned()
                .ok_or_else(|| Error::not_found("Payment", payment_id))
        }

        fn save_payment(&mut self, mut payment: Payment) -> Result<Payment> {
            let stored = self.payments.get(&payment.id).map(|p| p.version);
            payment.version = next_version("Payment", &payment.id, stored, payment.version)?;
            self.payments.insert(payment.id.clone(), payment.clone());
            Ok(payment)
        }
    }

    #[derive(Clone, Default)]
    struct MockLedger {
        tables: Arc<Mutex<MockTables>>,
    }

    impl MockLedger {
        fn with_tables<T>(&self, f: impl FnOnce(&mut MockTables) -> T) -> T {
            f(&mut self.tables.lock().unwrap())
        }

        fn fail_budget_saves(&self, fail: bool) {
            self.with_tables(|t| t.fail_budget_saves = fail);
        }

        fn budget_item(&self, id: &str) -> BudgetItem {
            self.with_tables(|t| t.budget_items[id].clone())
        }

        fn payment(&self, id: &str) -> Payment {
            self.with_tables(|t| t.payments[id].clone())
        }
    }

    #[async_trait]
    impl BookingRepositoryTrait for MockLedger {
        fn load(&self, booking_id: &str) -> Result<BookingRequest> {
            self.with_tables(|t| t.load_booking(booking_id))
        }

        fn list_by_event(&self, event_id: &str) -> Result<Vec<BookingRequest>> {
            Ok(self.with_tables(|t| {
                t.bookings
                    .values()
                    .filter(|b| b.event_id == event_id)
                    .cloned()
                    .collect()
            }))
        }

        async fn save(&self, booking: BookingRequest) -> Result<BookingRequest> {
            self.with_tables(|t| t.save_booking(booking))
        }
    }

    #[async_trait]
    impl BudgetItemRepositoryTrait for MockLedger {
        fn load(&self, budget_item_id: &str) -> Result<BudgetItem> {
            self.with_tables(|t| t.load_budget_item(budget_item_id))
        }

        fn list_by_event(&self, event_id: &str) -> Result<Vec<BudgetItem>> {
            Ok(self.with_tables(|t| {
                t.budget_items
                    .values()
                    .filter(|i| i.event_id == event_id)
                    .cloned()
                    .collect()
            }))
        }

        async fn save(&self, item: BudgetItem) -> Result<BudgetItem> {
            self.with_tables(|t| t.save_budget_item(item))
        }
    }

    #[async_trait]
    impl PaymentRepositoryTrait for MockLedger {
        fn load(&self, payment_id: &str) -> Result<Payment> {
            self.with_tables(|t| t.load_payment(payment_id))
        }

        fn list_by_event(&self, event_id: &str) -> Result<Vec<Payment>> {
            Ok(self.with_tables(|t| {
                t.payments
                    .values()
                    .filter(|p| p.event_id == event_id)
                    .cloned()
                    .collect()
            }))
        }

        async fn save(&self, payment: Payment) -> Result<Payment> {
            self.with_tables(|t| t.save_payment(payment))
        }
    }

    /// Runs the job on a copy of the tables and swaps it in only on success.
    #[async_trait]
    impl TransactionExecutor for MockLedger {
        async fn execute<F, T>(&self, job: F) -> Result<T>
        where
            F: FnOnce(&mut dyn LedgerTransaction) -> Result<T> + Send + 'static,
            T: Send + 'static,
        {
            let mut tables = self.tables.lock().unwrap();
            let mut working = tables.clone();
            let result = job(&mut working)?;
            *tables = working;
            Ok(result)
        }
    }

    // --- Fixtures ---

    struct Fixture {
        ledger: MockLedger,
        sink: CollectingDomainEventSink,
        service: ReconciliationService<MockLedger>,
    }

    fn fixture_with(settings: LedgerSettings) -> Fixture {
        let ledger = MockLedger::default();
        let sink = CollectingDomainEventSink::new();
        let service = ReconciliationService::new(
            Arc::new(ledger.clone()),
            Arc::new(ledger.clone()),
            Arc::new(ledger.clone()),
            ledger.clone(),
            Arc::new(RwLock::new(settings)),
        )
        .with_event_sink(Arc::new(sink.clone()));
        Fixture {
            ledger,
            sink,
            service,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(LedgerSettings::default())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_booking(id: &str) -> NewBookingRequest {
        NewBookingRequest {
            id: Some(id.to_string()),
            event_id: "evt-1".to_string(),
            vendor_id: "vnd-photo".to_string(),
            planner_id: "pln-1".to_string(),
            function_id: None,
            service_category: BudgetCategory::Photography,
            currency: "INR".to_string(),
            notes: None,
            as_draft: false,
        }
    }

    fn new_budget_item(id: &str, estimated: Decimal) -> NewBudgetItem {
        NewBudgetItem {
            id: Some(id.to_string()),
            event_id: "evt-1".to_string(),
            category: BudgetCategory::Venue,
            description: "Banquet hall".to_string(),
            estimated_amount: estimated,
            actual_amount: None,
            currency: "INR".to_string(),
            vendor_id: None,
            booking_request_id: None,
            notes: None,
        }
    }

    fn new_payment(id: &str, amount: Decimal, budget_item_id: Option<&str>) -> NewPayment {
        NewPayment {
            id: Some(id.to_string()),
            event_id: "evt-1".to_string(),
            booking_request_id: None,
            budget_item_id: budget_item_id.map(str::to_string),
            payment_type: PaymentType::VendorPayment,
            method: PaymentMethod::BankTransfer,
            amount,
            currency: "INR".to_string(),
            paid_by: None,
            paid_to: None,
            due_date: None,
            receipt_url: None,
            notes: None,
        }
    }

    fn schedule() -> Vec<NewMilestone> {
        vec![
            NewMilestone {
                name: "Deposit".to_string(),
                amount: dec!(150000),
                due_date: date(2025, 1, 10),
            },
            NewMilestone {
                name: "Balance".to_string(),
                amount: dec!(350000),
                due_date: date(2025, 3, 1),
            },
        ]
    }

    // --- Bookings ---

    #[tokio::test]
    async fn test_quote_accept_and_deposit_flow() {
        let f = fixture();
        let svc = &f.service;

        let booking = svc.create_booking(new_booking("bk-1")).await.unwrap();
        assert_eq!(booking.status, BookingStatus::QuoteRequested);
        assert_eq!(booking.version, 1);

        svc.submit_quote("bk-1", dec!(500000), Some("Full day".to_string()))
            .await
            .unwrap();
        let confirmed = svc.accept_quote("bk-1", None, schedule()).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(confirmed.agreed_amount, Some(dec!(500000)));
        assert_eq!(confirmed.payment_schedule.len(), 2);
        assert_eq!(confirmed.schedule_discrepancy(), None);

        let deposit_id = confirmed.payment_schedule[0].id.clone();
        let paid = svc.mark_milestone_paid("bk-1", &deposit_id).await.unwrap();
        assert_eq!(paid.status, BookingStatus::DepositPaid);
        assert_eq!(paid.get_total_paid(), dec!(150000));
        assert_eq!(paid.get_outstanding_balance(), dec!(350000));

        let events = f.sink.events();
        assert!(matches!(events[0], DomainEvent::BookingRequested { .. }));
        assert!(events.contains(&DomainEvent::BookingStatusChanged {
            booking_id: "bk-1".to_string(),
            event_id: "evt-1".to_string(),
            from: BookingStatus::Confirmed,
            to: BookingStatus::DepositPaid,
            reason: None,
        }));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, DomainEvent::MilestoneAdded { .. }))
                .count(),
            2
        );
        assert!(matches!(
            events.last(),
            Some(DomainEvent::MilestonePaid { outstanding_balance, .. })
                if *outstanding_balance == dec!(350000)
        ));
    }

    #[tokio::test]
    async fn test_milestone_payment_without_auto_advance_keeps_status() {
        let f = fixture_with(LedgerSettings {
            auto_advance_on_deposit: false,
            ..LedgerSettings::default()
        });
        let svc = &f.service;
        svc.create_booking(new_booking("bk-1")).await.unwrap();
        svc.submit_quote("bk-1", dec!(500000), None).await.unwrap();
        let confirmed = svc.accept_quote("bk-1", None, schedule()).await.unwrap();

        let deposit_id = confirmed.payment_schedule[0].id.clone();
        let paid = svc.mark_milestone_paid("bk-1", &deposit_id).await.unwrap();
        assert_eq!(paid.status, BookingStatus::Confirmed);
        assert!(paid.payment_schedule[0].is_paid());
    }

    #[tokio::test]
    async fn test_terminal_booking_rejects_operations() {
        let f = fixture();
        let svc = &f.service;
        svc.create_booking(new_booking("bk-1")).await.unwrap();
        let cancelled = svc
            .cancel_booking("bk-1", Some("Date moved".to_string()))
            .await
            .unwrap();
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Date moved"));

        let err = svc.submit_quote("bk-1", dec!(1000), None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        let err = svc
            .add_milestone(
                "bk-1",
                NewMilestone {
                    name: "Late".to_string(),
                    amount: dec!(1),
                    due_date: date(2025, 1, 1),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BusinessRuleViolation(_)));

        // The failed operations left the stored booking alone.
        let stored = svc.get_booking("bk-1").unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_accept_quote_in_wrong_status_is_business_rule_violation() {
        let f = fixture();
        f.service.create_booking(new_booking("bk-1")).await.unwrap();
        let err = f
            .service
            .accept_quote("bk-1", Some(dec!(10)), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BusinessRuleViolation(_)));
    }

    #[tokio::test]
    async fn test_unknown_booking_is_not_found() {
        let f = fixture();
        let err = f.service.start_service("missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_stale_booking_save_is_a_conflict() {
        let f = fixture();
        let created = f.service.create_booking(new_booking("bk-1")).await.unwrap();
        f.service
            .submit_quote("bk-1", dec!(100), None)
            .await
            .unwrap();

        let err = BookingRepositoryTrait::save(&f.ledger, created)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ConcurrencyConflict {
                expected: 1,
                found: 2,
                ..
            }
        ));
        assert!(err.is_retryable());
    }

    // --- Budget ---

    #[tokio::test]
    async fn test_budget_actual_and_direct_payment() {
        let f = fixture();
        let svc = &f.service;
        svc.create_budget_item(new_budget_item("b1", dec!(100000)))
            .await
            .unwrap();

        let item = svc.set_budget_actual("b1", Some(dec!(120000))).await.unwrap();
        assert!(item.is_over_budget());
        assert_eq!(item.overage_amount(), dec!(20000));

        let item = svc.add_budget_payment("b1", dec!(30000)).await.unwrap();
        assert_eq!(item.paid_amount, dec!(30000));
        assert_eq!(item.remaining_balance(), dec!(90000));

        let err = svc.add_budget_payment("b1", dec!(-1)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NegativeAmount { .. })
        ));
    }

    #[tokio::test]
    async fn test_budget_summary_without_items_uses_base_currency() {
        let f = fixture();
        let summary = f.service.get_budget_summary("evt-empty").unwrap();
        assert_eq!(summary.currency, "USD");
        assert_eq!(summary.total_estimated, Decimal::ZERO);
        assert_eq!(summary.payment_progress, 100);
    }

    #[tokio::test]
    async fn test_budget_item_linked_to_booking_of_other_currency_is_rejected() {
        let f = fixture();
        f.service.create_booking(new_booking("bk-1")).await.unwrap();
        let mut input = new_budget_item("b1", dec!(10));
        input.booking_request_id = Some("bk-1".to_string());
        input.currency = "USD".to_string();
        let err = f.service.create_budget_item(input).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::CurrencyMismatch { .. })
        ));
    }

    // --- Payments ---

    #[tokio::test]
    async fn test_complete_payment_reconciles_budget_item() {
        let f = fixture();
        let svc = &f.service;
        svc.create_budget_item(new_budget_item("b1", dec!(100000)))
            .await
            .unwrap();
        svc.add_budget_payment("b1", dec!(30000)).await.unwrap();
        svc.create_payment(new_payment("p1", dec!(50000), Some("b1")))
            .await
            .unwrap();

        let payment = svc
            .complete_payment("p1", Some("TXN123".to_string()))
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert!(payment.paid_date.is_some());
        assert_eq!(payment.reference.as_deref(), Some("TXN123"));

        let item = svc.get_budget_item("b1").unwrap();
        assert_eq!(item.paid_amount, dec!(80000));
        assert_eq!(item.payment_progress(), 80);

        let events = f.sink.events();
        assert!(events.contains(&DomainEvent::PaymentReconciled {
            payment_id: "p1".to_string(),
            budget_item_id: "b1".to_string(),
            amount: dec!(50000),
            paid_amount: dec!(80000),
        }));
    }

    #[tokio::test]
    async fn test_completing_twice_applies_amount_once() {
        let f = fixture();
        let svc = &f.service;
        svc.create_budget_item(new_budget_item("b1", dec!(100000)))
            .await
            .unwrap();
        svc.create_payment(new_payment("p1", dec!(50000), Some("b1")))
            .await
            .unwrap();

        let first = svc.complete_payment("p1", None).await.unwrap();
        f.sink.clear();
        let second = svc
            .complete_payment("p1", Some("ignored".to_string()))
            .await
            .unwrap();

        assert_eq!(second.paid_date, first.paid_date);
        assert_eq!(second.reference, None);
        assert_eq!(f.ledger.budget_item("b1").paid_amount, dec!(50000));
        assert!(f.sink.is_empty());
    }

    #[tokio::test]
    async fn test_failed_budget_write_rolls_back_payment() {
        let f = fixture();
        let svc = &f.service;
        svc.create_budget_item(new_budget_item("b1", dec!(100000)))
            .await
            .unwrap();
        svc.create_payment(new_payment("p1", dec!(50000), Some("b1")))
            .await
            .unwrap();
        f.sink.clear();

        f.ledger.fail_budget_saves(true);
        let err = svc.complete_payment("p1", None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::ReconciliationFailure { ref payment_id, ref budget_item_id, .. }
                if payment_id == "p1" && budget_item_id == "b1"
        ));

        let payment = f.ledger.payment("p1");
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.paid_date.is_none());
        assert_eq!(f.ledger.budget_item("b1").paid_amount, Decimal::ZERO);
        assert!(f.sink.is_empty());

        // Retrying after the store recovers succeeds.
        f.ledger.fail_budget_saves(false);
        svc.complete_payment("p1", None).await.unwrap();
        assert_eq!(f.ledger.budget_item("b1").paid_amount, dec!(50000));
    }

    #[tokio::test]
    async fn test_overpayment_is_allowed_by_default() {
        let f = fixture();
        let svc = &f.service;
        svc.create_budget_item(new_budget_item("b1", dec!(100)))
            .await
            .unwrap();
        svc.create_payment(new_payment("p1", dec!(150), Some("b1")))
            .await
            .unwrap();
        svc.complete_payment("p1", None).await.unwrap();

        let item = f.ledger.budget_item("b1");
        assert_eq!(item.paid_amount, dec!(150));
        assert!(item.is_overpaid());
        assert_eq!(item.remaining_balance(), dec!(-50));
    }

    #[tokio::test]
    async fn test_overpayment_rejected_when_configured() {
        let f = fixture_with(LedgerSettings {
            reject_budget_overpayment: true,
            ..LedgerSettings::default()
        });
        let svc = &f.service;
        svc.create_budget_item(new_budget_item("b1", dec!(100)))
            .await
            .unwrap();
        svc.create_payment(new_payment("p1", dec!(150), Some("b1")))
            .await
            .unwrap();

        let err = svc.complete_payment("p1", None).await.unwrap_err();
        assert!(matches!(err, Error::ReconciliationFailure { .. }));
        assert_eq!(f.ledger.payment("p1").status, PaymentStatus::Pending);

        let err = svc.add_budget_payment("b1", dec!(101)).await.unwrap_err();
        assert!(matches!(err, Error::BusinessRuleViolation(_)));
    }

    #[tokio::test]
    async fn test_overflowing_payment_fails_without_touching_ledger() {
        let f = fixture();
        let svc = &f.service;
        svc.create_budget_item(new_budget_item("b1", dec!(100)))
            .await
            .unwrap();
        svc.add_budget_payment("b1", Decimal::MAX).await.unwrap();

        let err = svc.add_budget_payment("b1", dec!(1)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::AmountOverflow(_))
        ));

        svc.create_payment(new_payment("p1", dec!(1), Some("b1")))
            .await
            .unwrap();
        f.sink.clear();
        let err = svc.complete_payment("p1", None).await.unwrap_err();
        assert!(matches!(err, Error::ReconciliationFailure { .. }));
        assert_eq!(f.ledger.payment("p1").status, PaymentStatus::Pending);
        assert_eq!(f.ledger.budget_item("b1").paid_amount, Decimal::MAX);
        assert!(f.sink.is_empty());

        let summary = svc.get_budget_summary("evt-1").unwrap();
        assert_eq!(summary.payment_progress, u32::MAX);
        assert!(svc
            .get_recommended_split(Decimal::MAX)
            .iter()
            .all(|split| split.min_amount <= split.max_amount));
    }

    #[tokio::test]
    async fn test_payment_without_budget_link_completes_alone() {
        let f = fixture();
        f.service
            .create_payment(new_payment("p1", dec!(10), None))
            .await
            .unwrap();
        let payment = f.service.complete_payment("p1", None).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert!(!f
            .sink
            .events()
            .iter()
            .any(|e| matches!(e, DomainEvent::PaymentReconciled { .. })));
    }

    #[tokio::test]
    async fn test_create_payment_checks_references() {
        let f = fixture();
        let svc = &f.service;

        let err = svc
            .create_payment(new_payment("p1", dec!(10), Some("missing")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        svc.create_budget_item(new_budget_item("b1", dec!(100)))
            .await
            .unwrap();
        let mut usd = new_payment("p2", dec!(10), Some("b1"));
        usd.currency = "USD".to_string();
        let err = svc.create_payment(usd).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::CurrencyMismatch { .. })
        ));

        let err = svc
            .create_payment(new_payment("p3", dec!(0), None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_cancelled_payment_cannot_complete() {
        let f = fixture();
        let svc = &f.service;
        svc.create_budget_item(new_budget_item("b1", dec!(100)))
            .await
            .unwrap();
        svc.create_payment(new_payment("p1", dec!(10), Some("b1")))
            .await
            .unwrap();
        let cancelled = svc
            .cancel_payment("p1", Some("duplicate".to_string()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, PaymentStatus::Cancelled);

        let err = svc.complete_payment("p1", None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(f.ledger.budget_item("b1").paid_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_payment_totals_for_event() {
        let f = fixture();
        let svc = &f.service;
        svc.create_payment(new_payment("p1", dec!(100), None))
            .await
            .unwrap();
        svc.create_payment(new_payment("p2", dec!(40), None))
            .await
            .unwrap();
        svc.start_payment_processing("p1").await.unwrap();
        svc.complete_payment("p1", None).await.unwrap();
        svc.fail_payment("p2", Some("card declined".to_string()))
            .await
            .unwrap();

        let totals = svc.get_payment_totals("evt-1").unwrap();
        assert_eq!(totals.payment_count, 2);
        assert_eq!(totals.total_paid, dec!(100));
        assert_eq!(totals.total_failed, dec!(40));
    }
}
