//! Record Store Module
//!
//! The spreadsheet-like backend the cache fronts: named sheets of string rows,
//! with the header row already stripped. Row indices are zero-based.

mod memory;

pub use memory::MemorySheets;

use async_trait::async_trait;

use crate::error::{Result, StudioError};

/// One spreadsheet row, cell by cell.
pub type Row = Vec<String>;

// == Sheet Backend ==
/// Row-oriented record store.
#[async_trait]
pub trait SheetBackend: Send + Sync {
    /// Returns every data row of `sheet`; a sheet that does not exist is empty.
    async fn read_rows(&self, sheet: &str) -> Result<Vec<Row>>;

    async fn append_row(&self, sheet: &str, row: Row) -> Result<()>;

    /// Replaces the row at `index`.
    async fn update_row(&self, sheet: &str, index: usize, row: Row) -> Result<()>;

    /// Removes the row at `index`, shifting later rows up.
    async fn delete_row(&self, sheet: &str, index: usize) -> Result<()>;
}

// == Cell Helpers ==
/// Cell text, or "" when the row is short.
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Parses a cell, treating blank or malformed cells as missing.
pub fn parse_cell<T: std::str::FromStr>(row: &[String], index: usize) -> Option<T> {
    let text = cell(row, index).trim();
    if text.is_empty() {
        None
    } else {
        text.parse().ok()
    }
}

/// Renders an optional value as a cell, blank when absent.
pub fn optional_cell<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Position of the row whose first column holds `id`.
pub fn find_row(rows: &[Row], id: i64) -> Option<usize> {
    rows.iter().position(|row| parse_cell::<i64>(row, 0) == Some(id))
}

// == Upsert / Delete ==
/// Updates the row keyed by `id` in place, or appends it when absent.
pub async fn upsert_row(backend: &dyn SheetBackend, sheet: &str, id: i64, row: Row) -> Result<()> {
    let rows = backend.read_rows(sheet).await?;
    match find_row(&rows, id) {
        Some(index) => backend.update_row(sheet, index, row).await,
        None => backend.append_row(sheet, row).await,
    }
}

/// Deletes the row keyed by `id`.
pub async fn delete_row_by_id(backend: &dyn SheetBackend, sheet: &str, id: i64) -> Result<()> {
    let rows = backend.read_rows(sheet).await?;
    let index = find_row(&rows, id)
        .ok_or_else(|| StudioError::NotFound(format!("{} row with id {}", sheet, id)))?;
    backend.delete_row(sheet, index).await
}
