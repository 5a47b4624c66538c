//! Sheet-music catalog and the pieces assigned to each student.
//!
//! The catalog is cached; assignments are read from the record store on
//! every call.

use std::sync::Arc;

use tracing::{error, info};

use crate::cache::{read_through, Dataset};
use crate::error::{Result, StudioError};
use crate::models::{AssignmentStatus, SheetMusic, StudentAssignment};
use crate::services::DataCache;
use crate::sheets::{delete_row_by_id, upsert_row, SheetBackend};

const SHEET_NAME: &str = "SheetMusic";
const ASSIGNMENTS_SHEET: &str = "SheetMusicAssignments";

#[derive(Clone)]
pub struct SheetMusicService {
    backend: Arc<dyn SheetBackend>,
    cache: DataCache,
}

impl SheetMusicService {
    pub fn new(backend: Arc<dyn SheetBackend>, cache: DataCache) -> Self {
        Self { backend, cache }
    }

    pub async fn list(&self) -> Vec<SheetMusic> {
        let dataset = Dataset::SheetMusic;
        read_through(
            &self.cache.sheet_music,
            dataset.key(),
            self.cache.ttl_ms(dataset),
            || self.fetch(),
        )
        .await
        .unwrap_or_else(|err| {
            error!(error = %err, "failed to fetch sheet music");
            Vec::new()
        })
    }

    async fn fetch(&self) -> Result<Vec<SheetMusic>> {
        let rows = self.backend.read_rows(SHEET_NAME).await?;
        Ok(rows.iter().map(|row| SheetMusic::from_row(row)).collect())
    }

    /// Pieces belonging to one textbook, in book order.
    pub async fn list_for_textbook(&self, textbook_id: i64) -> Vec<SheetMusic> {
        let mut pieces: Vec<SheetMusic> = self
            .list()
            .await
            .into_iter()
            .filter(|music| music.textbook_id == Some(textbook_id))
            .collect();
        pieces.sort_by_key(|music| music.order_in_textbook.unwrap_or(u32::MAX));
        pieces
    }

    pub async fn save(&self, music: &SheetMusic) -> Result<()> {
        upsert_row(self.backend.as_ref(), SHEET_NAME, music.id, music.to_row()).await?;
        self.cache.invalidate(Dataset::SheetMusic).await;
        info!(id = music.id, title = %music.title, "sheet music saved");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        delete_row_by_id(self.backend.as_ref(), SHEET_NAME, id).await?;
        self.cache.invalidate(Dataset::SheetMusic).await;
        info!(id, "sheet music deleted");
        Ok(())
    }

    // == Assignments ==

    /// Assignments, optionally only those of one piece.
    pub async fn assignments(&self, sheet_music_id: Option<i64>) -> Vec<StudentAssignment> {
        match self.backend.read_rows(ASSIGNMENTS_SHEET).await {
            Ok(rows) => rows
                .iter()
                .map(|row| StudentAssignment::from_row(row))
                .filter(|a| sheet_music_id.map_or(true, |id| a.sheet_music_id == id))
                .collect(),
            Err(err) => {
                error!(error = %err, "failed to fetch sheet music assignments");
                Vec::new()
            }
        }
    }

    /// Gives piece `sheet_music_id` to a student, dated today.
    pub async fn assign(
        &self,
        sheet_music_id: i64,
        student_id: i64,
        student_name: &str,
    ) -> Result<StudentAssignment> {
        let assignment = StudentAssignment {
            sheet_music_id,
            student_id,
            student_name: student_name.to_string(),
            assigned_at: self.cache.today().format("%Y-%m-%d").to_string(),
            status: AssignmentStatus::Practicing,
        };
        self.backend.append_row(ASSIGNMENTS_SHEET, assignment.to_row()).await?;
        info!(sheet_music_id, student_id, "sheet music assigned");
        Ok(assignment)
    }

    /// Removes the first assignment of the piece to the student.
    pub async fn remove_assignment(&self, sheet_music_id: i64, student_id: i64) -> Result<()> {
        let rows = self.backend.read_rows(ASSIGNMENTS_SHEET).await?;
        let index = rows
            .iter()
            .map(|row| StudentAssignment::from_row(row))
            .position(|a| a.sheet_music_id == sheet_music_id && a.student_id == student_id)
            .ok_or_else(|| {
                StudioError::NotFound(format!(
                    "assignment of sheet music {} to student {}",
                    sheet_music_id, student_id
                ))
            })?;
        self.backend.delete_row(ASSIGNMENTS_SHEET, index).await?;
        info!(sheet_music_id, student_id, "assignment removed");
        Ok(())
    }
}
