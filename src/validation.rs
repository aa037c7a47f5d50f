// 📐 Validation - reject bad record input before it reaches the store
//
// Every field is checked and every failure collected, so a form can show
// all problems at once. Nothing partial is ever produced.

use crate::entities::{Category, Expense, ExpenseDraft, ExpenseInput, ExpensePayload};
use crate::error::{ExpenseError, ValidationError};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate raw form input into a draft.
///
/// An empty `date` means `today`.
pub fn validate_input(input: &ExpenseInput, today: NaiveDate) -> Result<ExpenseDraft, ExpenseError> {
    let mut errors = Vec::new();

    let amount = match parse_amount(&input.amount) {
        Ok(amount) => Some(amount),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    let category = match input.category.parse::<Category>() {
        Ok(category) => Some(category),
        Err(_) => {
            errors.push(ValidationError::new(
                "category",
                format!("Unknown category: {}", input.category.trim()),
            ));
            None
        }
    };

    let description = input.description.trim();
    if description.is_empty() {
        errors.push(ValidationError::new("description", "Required field is empty"));
    }

    let date = match parse_date(&input.date, today) {
        Ok(date) => Some(date),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    match (amount, category, date) {
        (Some(amount), Some(category), Some(date)) if errors.is_empty() => Ok(ExpenseDraft {
            amount,
            category,
            description: description.to_string(),
            date,
        }),
        _ => Err(ExpenseError::Invalid(errors)),
    }
}

/// Validate a typed payload (HTTP API bodies with a numeric amount).
///
/// A missing `date` means `today`.
pub fn validate_draft(payload: ExpensePayload, today: NaiveDate) -> Result<ExpenseDraft, ExpenseError> {
    let mut errors = Vec::new();

    if let Err(e) = check_amount(payload.amount) {
        errors.push(e);
    }

    let category = match payload.category.parse::<Category>() {
        Ok(category) => Some(category),
        Err(_) => {
            errors.push(ValidationError::new(
                "category",
                format!("Unknown category: {}", payload.category.trim()),
            ));
            None
        }
    };

    let description = payload.description.trim();
    if description.is_empty() {
        errors.push(ValidationError::new("description", "Required field is empty"));
    }

    let date = payload.date.unwrap_or(today);
    if let Err(e) = check_date(date, today) {
        errors.push(e);
    }

    match category {
        Some(category) if errors.is_empty() => Ok(ExpenseDraft {
            amount: payload.amount,
            category,
            description: description.to_string(),
            date,
        }),
        _ => Err(ExpenseError::Invalid(errors)),
    }
}

/// Check a stored record against the same rules (used when loading).
pub fn validate_expense(expense: &Expense, today: NaiveDate) -> Result<(), ExpenseError> {
    let mut errors = Vec::new();

    if let Err(e) = check_amount(expense.amount) {
        errors.push(e);
    }
    if expense.description.trim().is_empty() {
        errors.push(ValidationError::new("description", "Required field is empty"));
    }
    if let Err(e) = check_date(expense.date, today) {
        errors.push(e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ExpenseError::Invalid(errors))
    }
}

fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::new("amount", "Required field is empty"));
    }

    let amount: f64 = raw
        .parse()
        .map_err(|_| ValidationError::new("amount", format!("Not a number: {}", raw)))?;

    check_amount(amount)?;
    Ok(amount)
}

fn check_amount(amount: f64) -> Result<(), ValidationError> {
    if !amount.is_finite() {
        return Err(ValidationError::new("amount", "Amount is not a valid number"));
    }
    if amount < 0.0 {
        return Err(ValidationError::new("amount", "Amount must not be negative"));
    }
    Ok(())
}

fn parse_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(today);
    }

    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        ValidationError::new("date", format!("Invalid date format (expected YYYY-MM-DD): {}", raw))
    })?;

    check_date(date, today)?;
    Ok(date)
}

fn check_date(date: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if date > today {
        return Err(ValidationError::new(
            "date",
            format!("Date {} is in the future", date.format(DATE_FORMAT)),
        ));
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
