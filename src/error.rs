// Error types shared by the store, validation and the front-ends

use thiserror::Error;

/// A single rejected field on an expense form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExpenseError {
    /// Record input rejected before reaching the store
    #[error("invalid expense: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    #[error("expense not found: {0}")]
    NotFound(String),

    /// Persistence backend failure
    #[error("storage error: {0}")]
    Storage(String),

    /// A query or CLI value that doesn't name a known option
    #[error("unknown {what}: {value:?}")]
    Parse { what: &'static str, value: String },
}

impl ExpenseError {
    pub fn parse(what: &'static str, value: &str) -> Self {
        ExpenseError::Parse {
            what,
            value: value.to_string(),
        }
    }

    /// Field errors when this is a validation failure
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            ExpenseError::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T, E = ExpenseError> = std::result::Result<T, E>;
