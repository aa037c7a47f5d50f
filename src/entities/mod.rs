// Entity Models
// Expense records and their fixed category set

pub mod category;
pub mod expense;

pub use category::Category;
pub use expense::{Expense, ExpenseDraft, ExpenseInput, ExpensePayload};
