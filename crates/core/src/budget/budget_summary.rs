//! Read-side budget views: per-category summary and recommended split.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::budget_constants::{category_label, split_range};
use super::budget_model::{BudgetCategory, BudgetItem};
use crate::errors::{Result, ValidationError};
use crate::money::{add_amounts, percentage_of, round_half_up, sum_amounts};

/// Totals for one category across an event's budget items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: BudgetCategory,
    pub label: String,
    pub item_count: usize,
    pub estimated: Decimal,
    /// Sum of actual amounts for items where one is known.
    pub actual: Decimal,
    /// Sum of `actual ?? estimated`.
    pub effective: Decimal,
    pub paid: Decimal,
    pub remaining: Decimal,
    pub is_over_budget: bool,
}

impl CategorySummary {
    fn empty(category: BudgetCategory) -> Self {
        Self {
            category,
            label: category_label(category).to_string(),
            item_count: 0,
            estimated: Decimal::ZERO,
            actual: Decimal::ZERO,
            effective: Decimal::ZERO,
            paid: Decimal::ZERO,
            remaining: Decimal::ZERO,
            is_over_budget: false,
        }
    }
}

/// Groups items by category, in category declaration order.
pub fn summarize_by_category(items: &[BudgetItem]) -> Result<Vec<CategorySummary>> {
    let mut grouped: BTreeMap<BudgetCategory, CategorySummary> = BTreeMap::new();
    for item in items {
        let row = grouped
            .entry(item.category)
            .or_insert_with(|| CategorySummary::empty(item.category));
        row.item_count += 1;
        row.estimated = add_amounts("estimated", row.estimated, item.estimated_amount)?;
        row.actual = add_amounts(
            "actual",
            row.actual,
            item.actual_amount.unwrap_or(Decimal::ZERO),
        )?;
        row.effective = add_amounts("effective", row.effective, item.effective_amount())?;
        row.paid = add_amounts("paid", row.paid, item.paid_amount)?;
        row.remaining = add_amounts("remaining", row.remaining, item.remaining_balance())?;
        row.is_over_budget |= item.is_over_budget();
    }
    Ok(grouped.into_values().collect())
}

/// Dashboard view of an event's budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub event_id: String,
    pub currency: String,
    pub categories: Vec<CategorySummary>,
    pub total_estimated: Decimal,
    pub total_actual: Decimal,
    pub total_effective: Decimal,
    pub total_paid: Decimal,
    pub total_remaining: Decimal,
    pub payment_progress: u32,
    pub over_budget_item_ids: Vec<String>,
    pub overpaid_item_ids: Vec<String>,
}

impl BudgetSummary {
    /// Builds the summary. All items must share one currency; an event without
    /// items reports in `default_currency`.
    pub fn from_items(
        event_id: &str,
        default_currency: &str,
        items: &[BudgetItem],
    ) -> Result<Self> {
        let currency = items
            .first()
            .map(|i| i.currency.clone())
            .unwrap_or_else(|| default_currency.to_string());

        if let Some(odd) = items.iter().find(|i| i.currency != currency) {
            return Err(ValidationError::CurrencyMismatch {
                expected: currency,
                actual: odd.currency.clone(),
            }
            .into());
        }

        let categories = summarize_by_category(items)?;
        let total_estimated = sum_amounts("estimated", categories.iter().map(|c| c.estimated))?;
        let total_actual = sum_amounts("actual", categories.iter().map(|c| c.actual))?;
        let total_effective = sum_amounts("effective", categories.iter().map(|c| c.effective))?;
        let total_paid = sum_amounts("paid", categories.iter().map(|c| c.paid))?;
        let total_remaining = total_effective
            .checked_sub(total_paid)
            .ok_or_else(|| ValidationError::AmountOverflow("remaining".to_string()))?;

        Ok(Self {
            event_id: event_id.to_string(),
            currency,
            categories,
            total_estimated,
            total_actual,
            total_effective,
            total_paid,
            total_remaining,
            payment_progress: percentage_of(total_paid, total_effective),
            over_budget_item_ids: items
                .iter()
                .filter(|i| i.is_over_budget())
                .map(|i| i.id.clone())
                .collect(),
            overpaid_item_ids: items
                .iter()
                .filter(|i| i.is_overpaid())
                .map(|i| i.id.clone())
                .collect(),
        })
    }
}

/// Suggested amount range for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedSplit {
    pub category: BudgetCategory,
    pub label: String,
    pub min_percent: u32,
    pub max_percent: u32,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
}

/// Advisory split of `total_budget` across every category.
pub fn get_recommended_split(total_budget: Decimal) -> Vec<RecommendedSplit> {
    BudgetCategory::ALL
        .iter()
        .map(|&category| {
            let range = split_range(category);
            RecommendedSplit {
                category,
                label: category_label(category).to_string(),
                min_percent: range.min_percent,
                max_percent: range.max_percent,
                min_amount: share(total_budget, range.min_percent),
                max_amount: share(total_budget, range.max_percent),
            }
        })
        .collect()
}

/// `percent`% of `total`, rounded; saturates at the decimal range.
fn share(total: Decimal, percent: u32) -> Decimal {
    let percent = Decimal::from(percent);
    let exact = total
        .checked_mul(percent)
        .map(|scaled| scaled / Decimal::ONE_HUNDRED)
        .or_else(|| (total / Decimal::ONE_HUNDRED).checked_mul(percent));
    match exact {
        Some(value) => round_half_up(value),
        None if total.is_sign_negative() => Decimal::MIN,
        None => Decimal::MAX,
    }
}
