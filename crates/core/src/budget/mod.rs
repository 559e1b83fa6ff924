//! Budget ledger - per-category allocations with estimated, actual and paid amounts.

mod budget_constants;
mod budget_model;
mod budget_summary;
mod budget_traits;

#[cfg(test)]
mod budget_model_tests;

pub use budget_constants::{
    category_label, split_range, SplitRange, CATEGORY_LABELS, RECOMMENDED_SPLITS,
};
pub use budget_model::{BudgetCategory, BudgetItem, NewBudgetItem};
pub(crate) use budget_model::ensure_non_negative;
pub use budget_summary::{
    get_recommended_split, summarize_by_category, BudgetSummary, CategorySummary,
    RecommendedSplit,
};
pub use budget_traits::BudgetItemRepositoryTrait;
