//! In-memory record store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Row, SheetBackend};
use crate::error::{Result, StudioError};

/// Sheets held in process memory. Counts reads so callers can observe how
/// often the cache lets a request through.
#[derive(Debug, Default)]
pub struct MemorySheets {
    sheets: RwLock<HashMap<String, Vec<Row>>>,
    reads: AtomicU64,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with `sheet` pre-populated.
    pub fn with_rows(mut self, sheet: &str, rows: Vec<Row>) -> Self {
        self.sheets.get_mut().insert(sheet.to_string(), rows);
        self
    }

    /// Number of `read_rows` calls served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

fn out_of_range(sheet: &str, index: usize) -> StudioError {
    StudioError::Backend(format!("row {} out of range in sheet '{}'", index, sheet))
}

#[async_trait]
impl SheetBackend for MemorySheets {
    async fn read_rows(&self, sheet: &str) -> Result<Vec<Row>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.sheets.read().await.get(sheet).cloned().unwrap_or_default())
    }

    async fn append_row(&self, sheet: &str, row: Row) -> Result<()> {
        self.sheets
            .write()
            .await
            .entry(sheet.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    async fn update_row(&self, sheet: &str, index: usize, row: Row) -> Result<()> {
        let mut sheets = self.sheets.write().await;
        let slot = sheets
            .get_mut(sheet)
            .and_then(|rows| rows.get_mut(index))
            .ok_or_else(|| out_of_range(sheet, index))?;
        *slot = row;
        Ok(())
    }

    async fn delete_row(&self, sheet: &str, index: usize) -> Result<()> {
        let mut sheets = self.sheets.write().await;
        let rows = sheets
            .get_mut(sheet)
            .filter(|rows| index < rows.len())
            .ok_or_else(|| out_of_range(sheet, index))?;
        rows.remove(index);
        Ok(())
    }
}
