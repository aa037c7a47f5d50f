// 🔎 Query Pipeline - filter, sort and paginate the expense list
//
// Pure function of (records, params, today). The list view's state lives in
// a plain `QueryParams` value the caller owns and passes on every call.
//
// Pagination never clamps: a page past the end (or page 0) yields an empty
// slice. Callers clamp with `clamp_page` before querying.

use crate::entities::{Category, Expense};
use crate::error::ExpenseError;
use crate::period::TimePeriod;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Page sizes offered by the list view
pub const PAGE_SIZE_CHOICES: [usize; 4] = [5, 10, 20, 50];

pub const DEFAULT_PAGE_SIZE: usize = 5;

// ============================================================================
// PARAMETERS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }

    /// All → first category → ... → last category → All
    pub fn next(&self) -> CategoryFilter {
        match self {
            CategoryFilter::All => CategoryFilter::Only(Category::ALL[0]),
            CategoryFilter::Only(Category::Other) => CategoryFilter::All,
            CategoryFilter::Only(c) => CategoryFilter::Only(c.next()),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(c) => f.write_str(c.label()),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Date,
    Amount,
    Category,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Date => "date",
            SortBy::Amount => "amount",
            SortBy::Category => "category",
        }
    }

    pub fn next(&self) -> SortBy {
        match self {
            SortBy::Date => SortBy::Amount,
            SortBy::Amount => SortBy::Category,
            SortBy::Category => SortBy::Date,
        }
    }

    /// Ascending comparator for this key
    pub fn compare(&self, a: &Expense, b: &Expense) -> Ordering {
        match self {
            SortBy::Date => a.date.cmp(&b.date),
            SortBy::Amount => a.amount.total_cmp(&b.amount),
            SortBy::Category => a.category.cmp_label(&b.category),
        }
    }

    /// How the list view names each direction for this key
    pub fn order_label(&self, order: SortOrder) -> &'static str {
        match (self, order) {
            (SortBy::Date, SortOrder::Desc) => "Newest First",
            (SortBy::Date, SortOrder::Asc) => "Oldest First",
            (SortBy::Amount, SortOrder::Desc) => "Highest First",
            (SortBy::Amount, SortOrder::Asc) => "Lowest First",
            (SortBy::Category, SortOrder::Desc) => "Z to A",
            (SortBy::Category, SortOrder::Asc) => "A to Z",
        }
    }
}

impl FromStr for SortBy {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortBy::Date),
            "amount" => Ok(SortBy::Amount),
            "category" => Ok(SortBy::Category),
            _ => Err(ExpenseError::parse("sort key", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    pub fn toggle(&self) -> SortOrder {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = ExpenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ExpenseError::parse("sort order", s)),
        }
    }
}

/// Everything the list view lets the user choose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub search_term: String,
    pub category: CategoryFilter,
    pub time_period: TimePeriod,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        QueryParams {
            search_term: String::new(),
            category: CategoryFilter::All,
            time_period: TimePeriod::All,
            sort_by: SortBy::Date,
            sort_order: SortOrder::Desc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

// Changing filters, sort or page size sends the list back to page 1.
impl QueryParams {
    pub fn with_search(self, term: impl Into<String>) -> Self {
        QueryParams {
            search_term: term.into(),
            page: 1,
            ..self
        }
    }

    pub fn with_category(self, category: CategoryFilter) -> Self {
        QueryParams {
            category,
            page: 1,
            ..self
        }
    }

    pub fn with_time_period(self, time_period: TimePeriod) -> Self {
        QueryParams {
            time_period,
            page: 1,
            ..self
        }
    }

    pub fn with_sort(self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        QueryParams {
            sort_by,
            sort_order,
            page: 1,
            ..self
        }
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        QueryParams {
            page_size,
            page: 1,
            ..self
        }
    }

    pub fn with_page(self, page: usize) -> Self {
        QueryParams { page, ..self }
    }

    /// Search, category or time filter differs from "show everything"
    pub fn has_active_filters(&self) -> bool {
        !self.search_term.is_empty()
            || self.category != CategoryFilter::All
            || self.time_period != TimePeriod::All
    }

    /// Reset search, category and time filter; keep sort and page size
    pub fn clear_filters(self) -> Self {
        QueryParams {
            search_term: String::new(),
            category: CategoryFilter::All,
            time_period: TimePeriod::All,
            page: 1,
            ..self
        }
    }

    /// Record passes search, category and time filters
    pub fn matches(&self, expense: &Expense, today: NaiveDate) -> bool {
        matches_search(expense, &self.search_term)
            && self.category.matches(expense.category)
            && self.time_period.contains(expense.date, today)
    }
}

fn matches_search(expense: &Expense, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    expense.description.to_lowercase().contains(&term)
        || expense.category.label().to_lowercase().contains(&term)
}

// ============================================================================
// RESULT
// ============================================================================

/// Why a query came back with no rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The collection itself is empty
    NoRecords,
    /// Records exist but the filters excluded all of them
    NoMatches,
    /// Matches exist but the requested page is past the end
    PageOutOfRange,
}

impl EmptyReason {
    pub fn message(&self) -> &'static str {
        match self {
            EmptyReason::NoRecords => "No expenses recorded yet.",
            EmptyReason::NoMatches => "No expenses match your filters.",
            EmptyReason::PageOutOfRange => "No expenses on this page.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub items: Vec<Expense>,
    /// Records that passed the filters, across all pages
    pub total_matches: usize,
    /// Size of the whole collection
    pub total_records: usize,
    pub page: usize,
    pub page_size: usize,
}

impl QueryResult {
    pub fn page_count(&self) -> usize {
        page_count(self.total_matches, self.page_size)
    }

    pub fn empty_reason(&self) -> Option<EmptyReason> {
        if !self.items.is_empty() {
            None
        } else if self.total_records == 0 {
            Some(EmptyReason::NoRecords)
        } else if self.total_matches == 0 {
            Some(EmptyReason::NoMatches)
        } else {
            Some(EmptyReason::PageOutOfRange)
        }
    }

    /// Pagination controls are only shown when there's more than one page
    pub fn has_multiple_pages(&self) -> bool {
        self.page_count() > 1
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Filter and sort without paginating
pub fn filter_and_sort<'a>(records: &'a [Expense], params: &QueryParams, today: NaiveDate) -> Vec<&'a Expense> {
    let mut matches: Vec<&Expense> = records
        .iter()
        .filter(|e| params.matches(e, today))
        .collect();

    // sort_by is stable: equal keys keep collection order in both directions
    matches.sort_by(|a, b| params.sort_order.apply(params.sort_by.compare(a, b)));
    matches
}

/// Filter, sort, then cut out the requested page
pub fn query(records: &[Expense], params: &QueryParams, today: NaiveDate) -> QueryResult {
    let matches = filter_and_sort(records, params, today);
    let total_matches = matches.len();

    let items = page_range(params.page, params.page_size, total_matches)
        .map(|range| matches[range].iter().map(|e| (*e).clone()).collect())
        .unwrap_or_default();

    debug!(
        search = %params.search_term,
        category = %params.category,
        period = %params.time_period,
        total_records = records.len(),
        total_matches,
        page = params.page,
        "expense query"
    );

    QueryResult {
        items,
        total_matches,
        total_records: records.len(),
        page: params.page,
        page_size: params.page_size,
    }
}

/// Index range of `page` within `total` items, or None when it's empty
fn page_range(page: usize, page_size: usize, total: usize) -> Option<std::ops::Range<usize>> {
    if page == 0 || page_size == 0 {
        return None;
    }
    let start = (page - 1).checked_mul(page_size)?;
    if start >= total {
        return None;
    }
    let end = start.saturating_add(page_size).min(total);
    Some(start..end)
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Bring `page` into `1..=page_count` (page 1 when nothing matches)
pub fn clamp_page(page: usize, total: usize, page_size: usize) -> usize {
    page.clamp(1, page_count(total, page_size).max(1))
}

/// Page buttons to show: first, last, and current ± 1.
/// `None` marks a gap between non-consecutive pages.
pub fn page_window(current: usize, page_count: usize) -> Vec<Option<usize>> {
    let mut window = Vec::new();
    let mut last_shown = 0;

    for page in 1..=page_count {
        let shown = page == 1 || page == page_count || page.abs_diff(current) <= 1;
        if !shown {
            continue;
        }
        if last_shown != 0 && page != last_shown + 1 {
            window.push(None);
        }
        window.push(Some(page));
        last_shown = page;
    }

    window
}

// ============================================================================
// TESTS
// ============================================================================
