//! Recital planning.

use std::cmp::Reverse;
use std::sync::Arc;

use tracing::{error, info};

use crate::cache::{read_through, Dataset};
use crate::error::Result;
use crate::models::Recital;
use crate::services::DataCache;
use crate::sheets::{delete_row_by_id, upsert_row, SheetBackend};

const SHEET_NAME: &str = "Recitals";

#[derive(Clone)]
pub struct RecitalService {
    backend: Arc<dyn SheetBackend>,
    cache: DataCache,
}

impl RecitalService {
    pub fn new(backend: Arc<dyn SheetBackend>, cache: DataCache) -> Self {
        Self { backend, cache }
    }

    /// All recitals, most recent first; undated ones go last.
    pub async fn list(&self) -> Vec<Recital> {
        let dataset = Dataset::Recitals;
        read_through(
            &self.cache.recitals,
            dataset.key(),
            self.cache.ttl_ms(dataset),
            || self.fetch(),
        )
        .await
        .unwrap_or_else(|err| {
            error!(error = %err, "failed to fetch recitals");
            Vec::new()
        })
    }

    async fn fetch(&self) -> Result<Vec<Recital>> {
        let rows = self.backend.read_rows(SHEET_NAME).await?;
        let mut recitals: Vec<Recital> = rows.iter().map(|row| Recital::from_row(row)).collect();
        recitals.sort_by_key(|recital| Reverse(recital.parsed_date()));
        Ok(recitals)
    }

    pub async fn save(&self, recital: &Recital) -> Result<()> {
        upsert_row(self.backend.as_ref(), SHEET_NAME, recital.id, recital.to_row()?).await?;
        self.cache.invalidate(Dataset::Recitals).await;
        info!(id = recital.id, participants = recital.participants.len(), "recital saved");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        delete_row_by_id(self.backend.as_ref(), SHEET_NAME, id).await?;
        self.cache.invalidate(Dataset::Recitals).await;
        info!(id, "recital deleted");
        Ok(())
    }
}
