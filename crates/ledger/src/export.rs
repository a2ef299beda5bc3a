//! CSV serialization of month records.
//!
//! Row schema: `Month,Type,Name,Amount,Date,Note`. Fixed rows leave Date
//! and Note empty. Quoting is the standard minimal style (only fields
//! containing a comma, quote, or newline get wrapped, inner quotes
//! doubled), which the `csv` crate produces by default.

use chrono::NaiveDateTime;

use models::{History, MonthRecord};
use storage::KvStore;

use crate::error::LedgerError;
use crate::month::STORED_FORMAT;
use crate::Ledger;

/// Filename used by the all-history export.
pub const HISTORY_FILENAME: &str = "expense_history.csv";

const HEADER: [&str; 6] = ["Month", "Type", "Name", "Amount", "Date", "Note"];

/// Filename for a single-month export: the label with spaces replaced by
/// underscores, e.g. "March_2025.csv".
pub fn month_filename(label: &str) -> String {
    format!("{}.csv", label.replace(' ', "_"))
}

/// Renders a stored "YYYY-MM-DD HH:MM" timestamp for CSV output.
///
/// The output inserts three spaces and a literal "T" before the time
/// ("2025-03-14   T09:30"). This is a legacy cosmetic quirk preserved
/// bit-for-bit for compatibility with existing consumers of the export.
/// Unparseable dates pass through verbatim.
fn display_date(stored: &str) -> String {
    if stored.is_empty() {
        return String::new();
    }
    match NaiveDateTime::parse_from_str(stored, STORED_FORMAT) {
        Ok(dt) => dt.format("%Y-%m-%d   T%H:%M").to_string(),
        Err(_) => stored.to_string(),
    }
}

fn format_amount(v: f64) -> String {
    format!("{}", v)
}

fn write_month_rows(
    wtr: &mut csv::Writer<Vec<u8>>,
    label: &str,
    record: &MonthRecord,
) -> Result<(), LedgerError> {
    for f in &record.fixed {
        wtr.write_record([label, "Fixed", &f.name, &format_amount(f.amount), "", ""])
            .map_err(|e| LedgerError::Storage(e.into()))?;
    }
    for e in &record.extra {
        wtr.write_record([
            label,
            "Extra",
            &e.name,
            &format_amount(e.amount),
            &display_date(&e.date),
            e.note.as_deref().unwrap_or(""),
        ])
        .map_err(|err| LedgerError::Storage(err.into()))?;
    }
    Ok(())
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, LedgerError> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| LedgerError::Storage(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|e| LedgerError::Storage(e.into()))
}

fn new_writer() -> Result<csv::Writer<Vec<u8>>, LedgerError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(HEADER)
        .map_err(|e| LedgerError::Storage(e.into()))?;
    Ok(wtr)
}

pub(crate) fn render_month(label: &str, record: &MonthRecord) -> Result<String, LedgerError> {
    let mut wtr = new_writer()?;
    write_month_rows(&mut wtr, label, record)?;
    finish(wtr)
}

pub(crate) fn render_history(history: &History) -> Result<String, LedgerError> {
    let mut wtr = new_writer()?;
    for (label, record) in history {
        write_month_rows(&mut wtr, label, record)?;
    }
    finish(wtr)
}

impl<S: KvStore> Ledger<S> {
    /// CSV for one month: the live current month, or an archived one.
    pub fn export_month(&self, label: &str) -> Result<String, LedgerError> {
        if label == self.month_label() {
            return render_month(label, &self.current_record());
        }
        let record = self
            .history()
            .get(label)
            .ok_or_else(|| LedgerError::NotFound(label.to_string()))?;
        render_month(label, record)
    }

    /// CSV for every archived month in insertion order. The current month
    /// is never included.
    pub fn export_all_history(&self) -> Result<String, LedgerError> {
        if self.history().is_empty() {
            return Err(LedgerError::Empty);
        }
        render_history(self.history())
    }
}
