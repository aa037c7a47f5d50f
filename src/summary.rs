// 📊 Aggregation Engine - per-category totals and month-over-month deltas
//
// Two reports over the expense collection:
//   - summarize: totals and share of spend per category for this month/year
//   - compare:   current month vs the month before, per category
//
// Both are pure. The reference date is always supplied by the caller.

use crate::entities::{Category, Expense};
use crate::period::{ReportPeriod, YearMonth};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// CATEGORY TOTALS
// ============================================================================

/// Running totals indexed by category, remembering first-seen order
#[derive(Debug, Clone, Default)]
struct CategoryTotals {
    totals: [f64; Category::COUNT],
    seen: Vec<Category>,
}

impl CategoryTotals {
    fn add(&mut self, category: Category, amount: f64) {
        if !self.seen.contains(&category) {
            self.seen.push(category);
        }
        self.totals[category.index()] += amount;
    }

    fn get(&self, category: Category) -> f64 {
        self.totals[category.index()]
    }

    fn grand_total(&self) -> f64 {
        self.seen.iter().map(|c| self.get(*c)).sum()
    }

    fn from_records<'a>(records: impl Iterator<Item = &'a Expense>) -> Self {
        let mut totals = CategoryTotals::default();
        for expense in records {
            totals.add(expense.category, expense.amount);
        }
        totals
    }
}

/// `100 * part / whole`, or 0 when there is nothing to divide by
pub fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Relative change from `prior` to `current`, in percent.
///
/// With no prior spend, any current spend counts as +100%.
pub fn percent_change(current: f64, prior: f64) -> f64 {
    if prior > 0.0 {
        (current - prior) / prior * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    }
}

// ============================================================================
// SINGLE-PERIOD SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
    /// Share of the period's total, 0..=100
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub period: ReportPeriod,
    pub total_amount: f64,
    /// Descending by total; only categories with spend in the period
    pub by_category: Vec<CategoryTotal>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }

    /// e.g. "No expenses for this month."
    pub fn empty_message(&self) -> String {
        format!("No expenses for this {}.", self.period.as_str())
    }
}

/// Totals per category for the month or year containing `today`
pub fn summarize(records: &[Expense], period: ReportPeriod, today: NaiveDate) -> Summary {
    let totals = CategoryTotals::from_records(
        records.iter().filter(|e| period.contains(e.date, today)),
    );
    let total_amount = totals.grand_total();

    let mut by_category: Vec<CategoryTotal> = totals
        .seen
        .iter()
        .map(|&category| {
            let total = totals.get(category);
            CategoryTotal {
                category,
                total,
                percentage: percentage_of(total, total_amount),
            }
        })
        .collect();

    // Stable: equal totals stay in first-encountered order
    by_category.sort_by(|a, b| b.total.total_cmp(&a.total));

    debug!(
        period = %period,
        total_amount,
        categories = by_category.len(),
        "summary computed"
    );

    Summary {
        period,
        total_amount,
        by_category,
    }
}

// ============================================================================
// MONTH-OVER-MONTH COMPARISON
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryComparison {
    pub category: Category,
    pub current_amount: f64,
    pub prior_amount: f64,
    pub delta: f64,
    pub percent_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthComparison {
    pub current_month: YearMonth,
    pub prior_month: YearMonth,
    pub current_total: f64,
    pub prior_total: f64,
    pub total_delta: f64,
    pub total_percent_change: f64,
    /// Descending by current amount; union of both months' categories
    pub by_category: Vec<CategoryComparison>,
}

impl MonthComparison {
    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }

    /// Spending went up, down or stayed flat
    pub fn trend(&self) -> Trend {
        Trend::of(self.total_delta)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn of(delta: f64) -> Trend {
        if delta > 0.0 {
            Trend::Up
        } else if delta < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

/// Compare the month containing `reference` with the month before it
pub fn compare(records: &[Expense], reference: NaiveDate) -> MonthComparison {
    let current_month = YearMonth::containing(reference);
    let prior_month = current_month.previous();

    let current = CategoryTotals::from_records(records.iter().filter(|e| current_month.contains(e.date)));
    let prior = CategoryTotals::from_records(records.iter().filter(|e| prior_month.contains(e.date)));

    let mut categories = current.seen.clone();
    for category in &prior.seen {
        if !categories.contains(category) {
            categories.push(*category);
        }
    }

    let mut by_category: Vec<CategoryComparison> = categories
        .into_iter()
        .map(|category| {
            let current_amount = current.get(category);
            let prior_amount = prior.get(category);
            CategoryComparison {
                category,
                current_amount,
                prior_amount,
                delta: current_amount - prior_amount,
                percent_change: percent_change(current_amount, prior_amount),
            }
        })
        .collect();

    by_category.sort_by(|a, b| b.current_amount.total_cmp(&a.current_amount));

    let current_total = current.grand_total();
    let prior_total = prior.grand_total();

    debug!(
        current_month = %current_month,
        current_total,
        prior_total,
        "month comparison computed"
    );

    MonthComparison {
        current_month,
        prior_month,
        current_total,
        prior_total,
        total_delta: current_total - prior_total,
        total_percent_change: percent_change(current_total, prior_total),
        by_category,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(amount: f64, category: Category, on: NaiveDate) -> Expense {
        Expense {
            id: format!("{}-{}-{}", category.index(), on, amount),
            amount,
            category,
            description: format!("{} expense", category.label()),
            date: on,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_summarize_month() {
        let records = vec![
            expense(10.0, Category::FoodDining, date(2024, 1, 5)),
            expense(20.0, Category::Travel, date(2024, 1, 10)),
        ];

        let summary = summarize(&records, ReportPeriod::Month, date(2024, 1, 15));

        assert_eq!(summary.total_amount, 30.0);
        assert_eq!(summary.by_category.len(), 2);
        assert_eq!(summary.by_category[0].category, Category::Travel);
        assert_eq!(summary.by_category[0].total, 20.0);
        assert!(close(summary.by_category[0].percentage, 200.0 / 3.0));
        assert_eq!(summary.by_category[1].category, Category::FoodDining);
        assert!(close(summary.by_category[1].percentage, 100.0 / 3.0));
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], ReportPeriod::Month, date(2024, 1, 15));
        assert_eq!(summary.total_amount, 0.0);
        assert!(summary.is_empty());
        assert_eq!(summary.empty_message(), "No expenses for this month.");
    }

    #[test]
    fn test_summarize_zero_total_gives_zero_percentages() {
        let records = vec![
            expense(0.0, Category::Other, date(2024, 1, 2)),
            expense(0.0, Category::Shopping, date(2024, 1, 3)),
        ];
        let summary = summarize(&records, ReportPeriod::Month, date(2024, 1, 15));

        assert_eq!(summary.by_category.len(), 2);
        assert!(summary.by_category.iter().all(|c| c.percentage == 0.0));
    }

    #[test]
    fn test_summarize_year_excludes_other_years() {
        let records = vec![
            expense(5.0, Category::Healthcare, date(2024, 2, 1)),
            expense(7.0, Category::Healthcare, date(2024, 11, 30)),
            expense(100.0, Category::Healthcare, date(2023, 12, 31)),
        ];
        let summary = summarize(&records, ReportPeriod::Year, date(2024, 12, 1));

        assert_eq!(summary.total_amount, 12.0);
        assert_eq!(summary.by_category.len(), 1);
        assert_eq!(summary.by_category[0].percentage, 100.0);
    }

    #[test]
    fn test_summarize_ties_keep_first_encountered() {
        let records = vec![
            expense(15.0, Category::Shopping, date(2024, 1, 3)),
            expense(15.0, Category::Entertainment, date(2024, 1, 4)),
            expense(30.0, Category::Other, date(2024, 1, 5)),
        ];
        let summary = summarize(&records, ReportPeriod::Month, date(2024, 1, 15));
        let order: Vec<Category> = summary.by_category.iter().map(|c| c.category).collect();

        assert_eq!(order, vec![Category::Other, Category::Shopping, Category::Entertainment]);
    }

    #[test]
    fn test_summary_totals_and_percentages_add_up() {
        let amounts = [12.34, 0.99, 250.0, 3.33, 47.5, 8.01, 19.99, 1.0];
        let records: Vec<Expense> = Category::ALL
            .iter()
            .zip(amounts)
            .map(|(c, a)| expense(a, *c, date(2024, 5, 2)))
            .collect();

        let summary = summarize(&records, ReportPeriod::Month, date(2024, 5, 20));
        let total: f64 = summary.by_category.iter().map(|c| c.total).sum();
        let percent: f64 = summary.by_category.iter().map(|c| c.percentage).sum();

        assert!(close(total, summary.total_amount));
        assert!((percent - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_compare_prior_zero_is_plus_hundred() {
        let records = vec![expense(100.0, Category::Travel, date(2024, 3, 2))];
        let comparison = compare(&records, date(2024, 3, 20));

        assert_eq!(comparison.current_total, 100.0);
        assert_eq!(comparison.prior_total, 0.0);
        assert_eq!(comparison.total_percent_change, 100.0);
        assert_eq!(comparison.trend(), Trend::Up);
    }

    #[test]
    fn test_compare_january_looks_at_december() {
        let records = vec![
            expense(50.0, Category::BillsUtilities, date(2023, 12, 15)),
            expense(75.0, Category::BillsUtilities, date(2024, 1, 15)),
            expense(999.0, Category::BillsUtilities, date(2024, 12, 15)),
        ];
        let comparison = compare(&records, date(2024, 1, 20));

        assert_eq!(comparison.prior_month, YearMonth { year: 2023, month: 12 });
        assert_eq!(comparison.prior_total, 50.0);
        assert_eq!(comparison.current_total, 75.0);
        assert_eq!(comparison.total_delta, 25.0);
        assert!(close(comparison.total_percent_change, 50.0));
    }

    #[test]
    fn test_compare_union_of_categories() {
        let records = vec![
            expense(40.0, Category::FoodDining, date(2024, 4, 3)),
            expense(10.0, Category::Shopping, date(2024, 4, 9)),
            expense(20.0, Category::FoodDining, date(2024, 3, 3)),
            expense(30.0, Category::Healthcare, date(2024, 3, 12)),
        ];
        let comparison = compare(&records, date(2024, 4, 28));
        let rows: Vec<(Category, f64, f64)> = comparison
            .by_category
            .iter()
            .map(|c| (c.category, c.current_amount, c.prior_amount))
            .collect();

        assert_eq!(
            rows,
            vec![
                (Category::FoodDining, 40.0, 20.0),
                (Category::Shopping, 10.0, 0.0),
                (Category::Healthcare, 0.0, 30.0),
            ]
        );

        let healthcare = &comparison.by_category[2];
        assert_eq!(healthcare.delta, -30.0);
        assert_eq!(healthcare.percent_change, -100.0);

        let shopping = &comparison.by_category[1];
        assert_eq!(shopping.percent_change, 100.0);

        assert_eq!(comparison.total_delta, comparison.current_total - comparison.prior_total);
    }

    #[test]
    fn test_compare_ties_keep_current_first_then_prior_in_encounter_order() {
        let records = vec![
            expense(25.0, Category::Travel, date(2024, 4, 2)),
            expense(5.0, Category::Travel, date(2024, 3, 30)),
            expense(25.0, Category::Shopping, date(2024, 4, 6)),
            expense(12.0, Category::Entertainment, date(2024, 3, 8)),
            expense(40.0, Category::Other, date(2024, 4, 20)),
            expense(9.0, Category::Healthcare, date(2024, 3, 1)),
            expense(3.0, Category::Entertainment, date(2024, 3, 15)),
        ];
        let comparison = compare(&records, date(2024, 4, 28));
        let order: Vec<Category> = comparison.by_category.iter().map(|c| c.category).collect();

        // Travel and Shopping tie at 25 and keep encounter order; the two
        // prior-only categories follow, also in encounter order
        assert_eq!(
            order,
            vec![
                Category::Other,
                Category::Travel,
                Category::Shopping,
                Category::Entertainment,
                Category::Healthcare,
            ]
        );
        assert_eq!(comparison.by_category[3].prior_amount, 15.0);
        assert_eq!(comparison.by_category[4].current_amount, 0.0);
    }

    #[test]
    fn test_compare_empty() {
        let comparison = compare(&[], date(2024, 4, 28));
        assert!(comparison.is_empty());
        assert_eq!(comparison.total_percent_change, 0.0);
        assert_eq!(comparison.trend(), Trend::Flat);
    }

    #[test]
    fn test_percent_change_rules() {
        assert_eq!(percent_change(150.0, 100.0), 50.0);
        assert_eq!(percent_change(50.0, 100.0), -50.0);
        assert_eq!(percent_change(10.0, 0.0), 100.0);
        assert_eq!(percent_change(0.0, 0.0), 0.0);
    }
}
