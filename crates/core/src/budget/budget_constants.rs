use super::budget_model::BudgetCategory;

/// Advisory share of a total event budget, in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRange {
    pub min_percent: u32,
    pub max_percent: u32,
}

/// Recommended budget share per category. Advisory only, never enforced.
pub const RECOMMENDED_SPLITS: [(BudgetCategory, SplitRange); 11] = [
    (BudgetCategory::Venue, SplitRange { min_percent: 15, max_percent: 25 }),
    (BudgetCategory::Catering, SplitRange { min_percent: 20, max_percent: 30 }),
    (BudgetCategory::Photography, SplitRange { min_percent: 8, max_percent: 12 }),
    (BudgetCategory::Videography, SplitRange { min_percent: 4, max_percent: 8 }),
    (BudgetCategory::Entertainment, SplitRange { min_percent: 5, max_percent: 10 }),
    (BudgetCategory::Decor, SplitRange { min_percent: 8, max_percent: 12 }),
    (BudgetCategory::Attire, SplitRange { min_percent: 5, max_percent: 10 }),
    (BudgetCategory::Beauty, SplitRange { min_percent: 2, max_percent: 4 }),
    (BudgetCategory::Stationery, SplitRange { min_percent: 2, max_percent: 3 }),
    (BudgetCategory::Transportation, SplitRange { min_percent: 2, max_percent: 3 }),
    (BudgetCategory::Miscellaneous, SplitRange { min_percent: 5, max_percent: 10 }),
];

/// Display labels per category.
pub const CATEGORY_LABELS: [(BudgetCategory, &str); 11] = [
    (BudgetCategory::Venue, "Venue"),
    (BudgetCategory::Catering, "Catering & Bar"),
    (BudgetCategory::Photography, "Photography"),
    (BudgetCategory::Videography, "Videography"),
    (BudgetCategory::Entertainment, "Music & Entertainment"),
    (BudgetCategory::Decor, "Flowers & Decor"),
    (BudgetCategory::Attire, "Attire"),
    (BudgetCategory::Beauty, "Hair & Makeup"),
    (BudgetCategory::Stationery, "Stationery"),
    (BudgetCategory::Transportation, "Transportation"),
    (BudgetCategory::Miscellaneous, "Miscellaneous"),
];

pub fn split_range(category: BudgetCategory) -> SplitRange {
    RECOMMENDED_SPLITS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, range)| *range)
        .unwrap_or(SplitRange {
            min_percent: 0,
            max_percent: 0,
        })
}

pub fn category_label(category: BudgetCategory) -> &'static str {
    CATEGORY_LABELS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, label)| *label)
        .unwrap_or("Other")
}
