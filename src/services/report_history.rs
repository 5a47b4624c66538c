//! Sent lesson reports.
//!
//! History is read straight from the record store on every request; it is
//! only looked at per student, so it has no cache entry.

use std::cmp::Reverse;
use std::sync::Arc;

use tracing::{error, info};

use crate::error::Result;
use crate::models::{parse_date, ReportHistory, ReportRequest};
use crate::services::DataCache;
use crate::sheets::{parse_cell, SheetBackend};

const SHEET_NAME: &str = "ReportHistory";

#[derive(Clone)]
pub struct ReportHistoryService {
    backend: Arc<dyn SheetBackend>,
    cache: DataCache,
}

impl ReportHistoryService {
    pub fn new(backend: Arc<dyn SheetBackend>, cache: DataCache) -> Self {
        Self { backend, cache }
    }

    /// Reports newest first, optionally for one student. Reports with an
    /// unreadable date come last.
    pub async fn list(&self, student_id: Option<i64>) -> Vec<ReportHistory> {
        let rows = match self.backend.read_rows(SHEET_NAME).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(error = %err, "failed to fetch report history");
                return Vec::new();
            }
        };

        let mut history: Vec<ReportHistory> = rows
            .iter()
            .map(|row| ReportHistory::from_row(row))
            .filter(|report| student_id.map_or(true, |id| report.student_id == id))
            .collect();
        history.sort_by_key(|report| Reverse(parse_date(&report.date)));
        history
    }

    /// Records a sent report and returns its id, the send time in
    /// milliseconds.
    pub async fn save(&self, request: &ReportRequest) -> Result<i64> {
        let rows = self.backend.read_rows(SHEET_NAME).await?;
        let newest = rows
            .iter()
            .filter_map(|row| parse_cell::<i64>(row, 0))
            .max()
            .unwrap_or(0);
        let now = i64::try_from(self.cache.now_ms()).unwrap_or(i64::MAX);
        let id = now.max(newest + 1);

        let report = ReportHistory {
            id,
            student_id: request.student_id,
            student_name: request.student_name.clone(),
            date: request.date.clone(),
            message: request.message.clone(),
            template_label: request.template_label.clone(),
        };
        self.backend.append_row(SHEET_NAME, report.to_row()).await?;
        info!(id, student_id = report.student_id, "lesson report recorded");
        Ok(id)
    }
}
