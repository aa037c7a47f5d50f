// 💸 Expense - one user-entered spending event
//
// Identity: `id` (UUID v4), assigned once at creation and never changed.
// Values: amount, category, description, date (replaced wholesale on edit).

use super::category::Category;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// EXPENSE RECORD
// ============================================================================

/// Persisted shape: `{id, amount, category, description, date}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    pub category: Category,
    pub description: String,
    pub date: NaiveDate,
}

impl Expense {
    /// Create a record with a fresh identity from validated fields
    pub fn from_draft(draft: ExpenseDraft) -> Self {
        Expense {
            id: uuid::Uuid::new_v4().to_string(),
            amount: draft.amount,
            category: draft.category,
            description: draft.description,
            date: draft.date,
        }
    }

    /// Replace every value, keeping the identity
    pub fn apply(&mut self, draft: ExpenseDraft) {
        self.amount = draft.amount;
        self.category = draft.category;
        self.description = draft.description;
        self.date = draft.date;
    }

    #[cfg(test)]
    pub(crate) fn to_draft(&self) -> ExpenseDraft {
        ExpenseDraft {
            amount: self.amount,
            category: self.category,
            description: self.description.clone(),
            date: self.date,
        }
    }
}

// ============================================================================
// DRAFT & RAW INPUT
// ============================================================================

/// Validated values without an identity.
///
/// Only the validation functions build one outside this crate, so anything
/// handed to the store already satisfies the record rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseDraft {
    pub(crate) amount: f64,
    pub(crate) category: Category,
    pub(crate) description: String,
    pub(crate) date: NaiveDate,
}

impl ExpenseDraft {
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Typed request body: a numeric amount, a category label and an optional
/// date (today when missing). Checked by `validate_draft`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpensePayload {
    pub amount: f64,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Unvalidated text as a form or command line supplies it.
/// An empty `date` means today.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseInput {
    pub amount: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub date: String,
}

impl ExpenseInput {
    /// Pre-fill from an existing record (edit form)
    pub fn from_expense(expense: &Expense) -> Self {
        ExpenseInput {
            amount: expense.amount.to_string(),
            category: expense.category.label().to_string(),
            description: expense.description.clone(),
            date: expense.date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(amount: f64, description: &str) -> ExpenseDraft {
        ExpenseDraft {
            amount,
            category: Category::Shopping,
            description: description.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        }
    }

    #[test]
    fn test_from_draft_assigns_unique_ids() {
        let a = Expense::from_draft(draft(5.0, "socks"));
        let b = Expense::from_draft(draft(5.0, "socks"));

        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
        assert_eq!(a.to_draft(), b.to_draft());
    }

    #[test]
    fn test_apply_keeps_identity() {
        let mut expense = Expense::from_draft(draft(5.0, "socks"));
        let id = expense.id.clone();

        expense.apply(draft(12.5, "shoes"));

        assert_eq!(expense.id, id);
        assert_eq!(expense.amount, 12.5);
        assert_eq!(expense.description, "shoes");
    }

    #[test]
    fn test_persisted_shape() {
        let expense = Expense {
            id: "1700000000000".to_string(),
            amount: 10.0,
            category: Category::FoodDining,
            description: "Lunch".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        };

        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "1700000000000",
                "amount": 10.0,
                "category": "Food & Dining",
                "description": "Lunch",
                "date": "2024-01-05",
            })
        );
    }

    #[test]
    fn test_input_from_expense_round_trips_fields() {
        let expense = Expense::from_draft(draft(7.25, "tape"));
        let input = ExpenseInput::from_expense(&expense);

        assert_eq!(input.amount, "7.25");
        assert_eq!(input.category, "Shopping");
        assert_eq!(input.date, "2024-03-02");
    }

    #[test]
    fn test_payload_accepts_numeric_amount_without_date() {
        let payload: ExpensePayload = serde_json::from_str(
            r#"{"amount": 12.5, "category": "Travel", "description": "Taxi"}"#,
        )
        .unwrap();

        assert_eq!(payload.amount, 12.5);
        assert_eq!(payload.category, "Travel");
        assert_eq!(payload.date, None);
    }
}
