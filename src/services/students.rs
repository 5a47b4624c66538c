//! Student roster.

use std::sync::Arc;

use tracing::{error, info};

use crate::cache::{read_through, Dataset};
use crate::error::Result;
use crate::models::Student;
use crate::services::DataCache;
use crate::sheets::{delete_row_by_id, upsert_row, SheetBackend};

const SHEET_NAME: &str = "Students";

#[derive(Clone)]
pub struct StudentService {
    backend: Arc<dyn SheetBackend>,
    cache: DataCache,
}

impl StudentService {
    pub fn new(backend: Arc<dyn SheetBackend>, cache: DataCache) -> Self {
        Self { backend, cache }
    }

    /// All students. A backend failure yields an empty roster.
    pub async fn list(&self) -> Vec<Student> {
        let dataset = Dataset::Students;
        read_through(
            &self.cache.students,
            dataset.key(),
            self.cache.ttl_ms(dataset),
            || self.fetch(),
        )
        .await
        .unwrap_or_else(|err| {
            error!(error = %err, "failed to fetch students");
            Vec::new()
        })
    }

    async fn fetch(&self) -> Result<Vec<Student>> {
        let rows = self.backend.read_rows(SHEET_NAME).await?;
        Ok(rows.iter().map(|row| Student::from_row(row)).collect())
    }

    /// Updates the student with the same id, or adds a new one.
    pub async fn save(&self, student: &Student) -> Result<()> {
        upsert_row(self.backend.as_ref(), SHEET_NAME, student.id, student.to_row()?).await?;
        self.cache.invalidate(Dataset::Students).await;
        info!(id = student.id, "student saved");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        delete_row_by_id(self.backend.as_ref(), SHEET_NAME, id).await?;
        self.cache.invalidate(Dataset::Students).await;
        info!(id, "student deleted");
        Ok(())
    }
}
