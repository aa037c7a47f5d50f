// 📤 CSV exchange - move the collection in and out as spreadsheets
//
// Export writes every record as-is. Import validates each row like a form
// submission; bad rows are reported and skipped, good rows become drafts
// that the store will give fresh ids.

use crate::entities::{Expense, ExpenseDraft, ExpenseInput};
use crate::error::ExpenseError;
use crate::validation::validate_input;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    date: String,
    category: &'a str,
    description: &'a str,
    amount: f64,
}

/// Import reads by header name; `id` is optional and ignored
#[derive(Debug, Deserialize)]
struct CsvInputRow {
    #[serde(default)]
    date: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    amount: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 1-based line in the file, header is line 1
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub drafts: Vec<ExpenseDraft>,
    pub rejected: Vec<RejectedRow>,
}

/// Write `id,date,category,description,amount` rows
pub fn export_csv<W: Write>(expenses: &[Expense], writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);

    for expense in expenses {
        wtr.serialize(CsvRow {
            id: &expense.id,
            date: expense.date.format("%Y-%m-%d").to_string(),
            category: expense.category.label(),
            description: &expense.description,
            amount: expense.amount,
        })
        .context("Failed to write CSV row")?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    debug!(count = expenses.len(), "exported expenses to CSV");
    Ok(expenses.len())
}

/// Parse and validate rows; `today` bounds dates and fills empty ones
pub fn import_csv<R: Read>(reader: R, today: NaiveDate) -> Result<ImportReport> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    let mut report = ImportReport::default();

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            // A row that can't be decoded is rejected like any other bad row
            Err(e) if !e.is_io_error() => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                warn!(line, error = %e, "skipping undecodable CSV row");
                report.rejected.push(RejectedRow {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(e).context("Failed to read CSV record"),
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let row: CsvInputRow = match record.deserialize(Some(&headers)) {
            Ok(row) => row,
            Err(e) => {
                report.rejected.push(RejectedRow {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let input = ExpenseInput {
            amount: row.amount,
            category: row.category,
            description: row.description,
            date: row.date,
        };

        match validate_input(&input, today) {
            Ok(draft) => report.drafts.push(draft),
            Err(e) => {
                warn!(line, error = %e, "skipping invalid CSV row");
                report.rejected.push(RejectedRow {
                    line,
                    reason: reason_for(&e),
                });
            }
        }
    }

    debug!(
        accepted = report.drafts.len(),
        rejected = report.rejected.len(),
        "imported CSV"
    );
    Ok(report)
}

fn reason_for(err: &ExpenseError) -> String {
    let fields = err.validation_errors();
    if fields.is_empty() {
        return err.to_string();
    }
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// TESTS
// ============================================================================
