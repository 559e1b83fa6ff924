//! Tests for budget ledger models and read-side views.

#[cfg(test)]
mod tests {
    use crate::budget::{
        get_recommended_split, summarize_by_category, BudgetCategory, BudgetItem, BudgetSummary,
        NewBudgetItem, RECOMMENDED_SPLITS,
    };
    use crate::errors::{Error, ValidationError};
    use crate::money::Money;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, "USD")
    }

    fn create_test_item(
        id: &str,
        category: BudgetCategory,
        estimated: Decimal,
        actual: Option<Decimal>,
    ) -> BudgetItem {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        BudgetItem::new(
            NewBudgetItem {
                id: None,
                event_id: "evt-1".to_string(),
                category,
                description: format!("{} allocation", category),
                estimated_amount: estimated,
                actual_amount: actual,
                currency: "USD".to_string(),
                vendor_id: None,
                booking_request_id: None,
                notes: None,
            },
            id.to_string(),
            now,
        )
    }

    // ==================== Derived values ====================

    #[test]
    fn test_new_item_starts_unpaid() {
        let item = create_test_item("b1", BudgetCategory::Venue, dec!(300000), None);
        assert_eq!(item.paid_amount, Decimal::ZERO);
        assert_eq!(item.effective_amount(), dec!(300000));
        assert_eq!(item.remaining_balance(), dec!(300000));
        assert_eq!(item.payment_progress(), 0);
        assert!(!item.is_over_budget());
    }

    #[test]
    fn test_actual_amount_drives_over_budget() {
        let now = Utc::now();
        let mut item = create_test_item("b1", BudgetCategory::Venue, dec!(300000), None);
        assert!(!item.is_over_budget());
        assert_eq!(item.overage_amount(), Decimal::ZERO);

        item.set_actual_amount(Some(dec!(350000)), now).unwrap();
        assert!(item.is_over_budget());
        assert_eq!(item.overage_amount(), dec!(50000));
        assert_eq!(item.effective_amount(), dec!(350000));
    }

    #[test]
    fn test_full_payment_against_actual() {
        let now = Utc::now();
        let mut item =
            create_test_item("b1", BudgetCategory::Venue, dec!(300000), Some(dec!(350000)));
        item.add_payment(&usd(dec!(350000)), now).unwrap();

        assert_eq!(item.paid_amount, dec!(350000));
        assert_eq!(item.remaining_balance(), Decimal::ZERO);
        assert_eq!(item.payment_progress(), 100);
        assert!(!item.is_overpaid());
    }

    #[test]
    fn test_overpayment_is_allowed_and_visible() {
        let now = Utc::now();
        let mut item = create_test_item("b1", BudgetCategory::Attire, dec!(1000), None);
        item.add_payment(&usd(dec!(1200)), now).unwrap();

        assert_eq!(item.remaining_balance(), dec!(-200));
        assert!(item.is_overpaid());
        assert_eq!(item.payment_progress(), 120);
        // Paying over the estimate does not make the item over budget.
        assert!(!item.is_over_budget());
    }

    #[test]
    fn test_zero_effective_amount_reads_complete() {
        let item = create_test_item("b1", BudgetCategory::Stationery, Decimal::ZERO, None);
        assert_eq!(item.payment_progress(), 100);
    }

    #[test]
    fn test_negative_payment_rejected() {
        let mut item = create_test_item("b1", BudgetCategory::Decor, dec!(500), None);
        let err = item.add_payment(&usd(dec!(-1)), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NegativeAmount { .. })
        ));
        assert_eq!(item.paid_amount, Decimal::ZERO);
    }

    #[test]
    fn test_payment_in_other_currency_rejected() {
        let mut item = create_test_item("b1", BudgetCategory::Decor, dec!(500), None);
        let err = item
            .add_payment(&Money::new(dec!(100), "EUR"), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::CurrencyMismatch { .. })
        ));
        assert_eq!(item.paid_amount, Decimal::ZERO);
    }

    #[test]
    fn test_payment_overflow_leaves_item_untouched() {
        let mut item = create_test_item("b1", BudgetCategory::Venue, dec!(500), None);
        item.add_payment(&usd(Decimal::MAX), Utc::now()).unwrap();

        let err = item.add_payment(&usd(dec!(1)), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::AmountOverflow(_))
        ));
        assert_eq!(item.paid_amount, Decimal::MAX);
    }

    #[test]
    fn test_new_item_validation() {
        let mut input = NewBudgetItem {
            id: None,
            event_id: "evt-1".to_string(),
            category: BudgetCategory::Catering,
            description: "Dinner".to_string(),
            estimated_amount: dec!(100),
            actual_amount: None,
            currency: "USD".to_string(),
            vendor_id: None,
            booking_request_id: None,
            notes: None,
        };
        assert!(input.validate().is_ok());

        input.currency = "usd".to_string();
        assert!(input.validate().is_err());

        input.currency = "USD".to_string();
        input.estimated_amount = dec!(-5);
        assert!(input.validate().is_err());
    }

    // ==================== Category parsing ====================

    #[test]
    fn test_category_round_trips_through_str() {
        for category in BudgetCategory::ALL {
            assert_eq!(BudgetCategory::from_str(category.as_str()).unwrap(), category);
        }
        assert!(BudgetCategory::from_str("fireworks").is_err());
    }

    #[test]
    fn test_category_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&BudgetCategory::Transportation).unwrap(),
            "\"transportation\""
        );
    }

    // ==================== Summaries ====================

    #[test]
    fn test_summarize_by_category_groups_and_sums() {
        let now = Utc::now();
        let mut venue = create_test_item("b1", BudgetCategory::Venue, dec!(1000), Some(dec!(1200)));
        venue.add_payment(&usd(dec!(400)), now).unwrap();
        let ceremony = create_test_item("b2", BudgetCategory::Venue, dec!(500), None);
        let mut food = create_test_item("b3", BudgetCategory::Catering, dec!(2000), None);
        food.add_payment(&usd(dec!(2000)), now).unwrap();

        let rows = summarize_by_category(&[food, venue, ceremony]).unwrap();
        assert_eq!(rows.len(), 2);

        let venue_row = &rows[0];
        assert_eq!(venue_row.category, BudgetCategory::Venue);
        assert_eq!(venue_row.item_count, 2);
        assert_eq!(venue_row.estimated, dec!(1500));
        assert_eq!(venue_row.actual, dec!(1200));
        assert_eq!(venue_row.effective, dec!(1700));
        assert_eq!(venue_row.paid, dec!(400));
        assert_eq!(venue_row.remaining, dec!(1300));
        assert!(venue_row.is_over_budget);

        let food_row = &rows[1];
        assert_eq!(food_row.category, BudgetCategory::Catering);
        assert_eq!(food_row.remaining, Decimal::ZERO);
        assert!(!food_row.is_over_budget);
    }

    #[test]
    fn test_budget_summary_totals() {
        let now = Utc::now();
        let mut a = create_test_item("b1", BudgetCategory::Venue, dec!(1000), Some(dec!(1100)));
        a.add_payment(&usd(dec!(1100)), now).unwrap();
        let mut b = create_test_item("b2", BudgetCategory::Beauty, dec!(100), None);
        b.add_payment(&usd(dec!(150)), now).unwrap();

        let summary = BudgetSummary::from_items("evt-1", "EUR", &[a, b]).unwrap();
        assert_eq!(summary.currency, "USD");
        assert_eq!(summary.total_estimated, dec!(1100));
        assert_eq!(summary.total_effective, dec!(1200));
        assert_eq!(summary.total_paid, dec!(1250));
        assert_eq!(summary.total_remaining, dec!(-50));
        assert_eq!(summary.over_budget_item_ids, vec!["b1".to_string()]);
        assert_eq!(summary.overpaid_item_ids, vec!["b2".to_string()]);
    }

    #[test]
    fn test_budget_summary_empty_event_uses_default_currency() {
        let summary = BudgetSummary::from_items("evt-2", "EUR", &[]).unwrap();
        assert_eq!(summary.currency, "EUR");
        assert!(summary.categories.is_empty());
        assert_eq!(summary.payment_progress, 100);
    }

    #[test]
    fn test_budget_summary_rejects_mixed_currencies() {
        let a = create_test_item("b1", BudgetCategory::Venue, dec!(10), None);
        let mut b = create_test_item("b2", BudgetCategory::Venue, dec!(10), None);
        b.currency = "EUR".to_string();
        assert!(BudgetSummary::from_items("evt-1", "USD", &[a, b]).is_err());
    }

    #[test]
    fn test_budget_summary_progress_saturates_on_tiny_estimate() {
        let mut item = create_test_item("b1", BudgetCategory::Decor, dec!(0.01), None);
        let paid = Decimal::from_i128_with_scale(10_i128.pow(27), 0);
        item.add_payment(&usd(paid), Utc::now()).unwrap();

        let summary = BudgetSummary::from_items("evt-1", "USD", &[item]).unwrap();
        assert_eq!(summary.total_paid, paid);
        assert_eq!(summary.payment_progress, u32::MAX);
    }

    #[test]
    fn test_budget_summary_reports_total_overflow() {
        let a = create_test_item("b1", BudgetCategory::Venue, Decimal::MAX, None);
        let b = create_test_item("b2", BudgetCategory::Catering, Decimal::MAX, None);

        let err = BudgetSummary::from_items("evt-1", "USD", &[a, b]).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::AmountOverflow(_))
        ));
    }

    // ==================== Recommended split ====================

    #[test]
    fn test_recommended_split_of_largest_budget() {
        let split = get_recommended_split(Decimal::MAX);
        let venue = split
            .iter()
            .find(|s| s.category == BudgetCategory::Venue)
            .unwrap();
        assert!(venue.min_amount > Decimal::ZERO);
        assert!(venue.min_amount <= venue.max_amount);
        assert!(venue.max_amount < Decimal::MAX);
    }

    #[test]
    fn test_recommended_split_covers_every_category() {
        let split = get_recommended_split(dec!(1000000));
        assert_eq!(split.len(), RECOMMENDED_SPLITS.len());

        let venue = split
            .iter()
            .find(|s| s.category == BudgetCategory::Venue)
            .unwrap();
        assert_eq!(venue.min_amount, dec!(150000));
        assert_eq!(venue.max_amount, dec!(250000));
        assert!(split.iter().all(|s| s.min_amount <= s.max_amount));
    }

    #[test]
    fn test_recommended_split_rounds_half_up() {
        // 2% of 25 = 0.5, rounds to 1
        let split = get_recommended_split(dec!(25));
        let beauty = split
            .iter()
            .find(|s| s.category == BudgetCategory::Beauty)
            .unwrap();
        assert_eq!(beauty.min_amount, dec!(1));
    }
}
