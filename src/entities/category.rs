// 🏷️ Category - the fixed set of spending classifications
//
// Every expense carries exactly one of these eight labels. There is no
// "uncategorized" value; "Other" is the catch-all.
//
// Aggregation indexes per-category tables by `Category::index()` instead of
// keying maps by label strings.

use crate::error::ExpenseError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Food & Dining")]
    FoodDining,
    #[serde(rename = "Transportation")]
    Transportation,
    #[serde(rename = "Shopping")]
    Shopping,
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "Bills & Utilities")]
    BillsUtilities,
    #[serde(rename = "Healthcare")]
    Healthcare,
    #[serde(rename = "Travel")]
    Travel,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    /// Number of categories; size of per-category tables
    pub const COUNT: usize = 8;

    /// All categories in the order forms and filters present them
    pub const ALL: [Category; Category::COUNT] = [
        Category::FoodDining,
        Category::Transportation,
        Category::Shopping,
        Category::Entertainment,
        Category::BillsUtilities,
        Category::Healthcare,
        Category::Travel,
        Category::Other,
    ];

    /// Display label, also the persisted form
    pub fn label(&self) -> &'static str {
        match self {
            Category::FoodDining => "Food & Dining",
            Category::Transportation => "Transportation",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::BillsUtilities => "Bills & Utilities",
            Category::Healthcare => "Healthcare",
            Category::Travel => "Travel",
            Category::Other => "Other",
        }
    }

    /// Position in `Category::ALL`
    pub fn index(&self) -> usize {
        match self {
            Category::FoodDining => 0,
            Category::Transportation => 1,
            Category::Shopping => 2,
            Category::Entertainment => 3,
            Category::BillsUtilities => 4,
            Category::Healthcare => 5,
            Category::Travel => 6,
            Category::Other => 7,
        }
    }

    /// Optional icon for UI
    pub fn icon(&self) -> &'static str {
        match self {
            Category::FoodDining => "🍽️",
            Category::Transportation => "🚗",
            Category::Shopping => "🛍️",
            Category::Entertainment => "🎬",
            Category::BillsUtilities => "💡",
            Category::Healthcare => "🏥",
            Category::Travel => "✈️",
            Category::Other => "📦",
        }
    }

    /// Compare by label, ignoring case
    pub fn cmp_label(&self, other: &Category) -> Ordering {
        let a = self.label().to_lowercase();
        let b = other.label().to_lowercase();
        a.cmp(&b).then_with(|| self.label().cmp(other.label()))
    }

    /// Next category in `ALL`, wrapping around (TUI filter cycling)
    pub fn next(&self) -> Category {
        Category::ALL[(self.index() + 1) % Category::COUNT]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ExpenseError;

    /// Accepts the label in any letter case ("food & dining", "TRAVEL")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ExpenseError::parse("category", s))
    }
}

// ============================================================================
// TESTS
// ============================================================================
