// PocketWatch - Core Library
// Shared by the CLI, the terminal UI, the API server and tests

pub mod config;
pub mod entities;
pub mod error;
pub mod export;
pub mod period;
pub mod persistence;
pub mod query;
pub mod store;
pub mod summary;
pub mod telemetry;
pub mod validation;

// Re-export commonly used types
pub use config::{Backend, Config};
pub use entities::{Category, Expense, ExpenseDraft, ExpenseInput, ExpensePayload};
pub use error::{ExpenseError, ValidationError};
pub use export::{export_csv, import_csv, ImportReport, RejectedRow};
pub use period::{ReportPeriod, TimePeriod, YearMonth};
pub use persistence::{
    load_expenses, save_expenses, FileStorage, KeyValueStore, MemoryStorage, SqliteStorage,
    EXPENSES_KEY,
};
pub use query::{
    clamp_page, filter_and_sort, page_count, page_window, query, CategoryFilter, EmptyReason,
    QueryParams, QueryResult, SortBy, SortOrder, PAGE_SIZE_CHOICES,
};
pub use store::ExpenseStore;
pub use summary::{
    compare, summarize, CategoryComparison, CategoryTotal, MonthComparison, Summary, Trend,
};
pub use validation::{validate_draft, validate_expense, validate_input};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Today's date in local time; the only place the crate reads the clock
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
