//! Response DTOs for the studio API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheStats, Dataset};

/// Response body for create/update/delete endpoints
#[derive(Debug, Clone, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    /// Id of the affected record
    pub id: i64,
}

impl MutationResponse {
    pub fn ok(id: i64) -> Self {
        Self { success: true, id }
    }
}

/// Response body for POST /templates/:id/render
#[derive(Debug, Clone, Serialize)]
pub struct RenderResponse {
    pub text: String,
}

/// Income and spending for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// `YYYY/M`
    pub month: String,
    pub income: i64,
    pub expense: i64,
    pub profit: i64,
}

/// Per-dataset statistics in the stats response
#[derive(Debug, Clone, Serialize)]
pub struct DatasetStats {
    pub dataset: Dataset,
    pub ttl_ms: u64,
    #[serde(flatten)]
    pub stats: CacheStats,
}

/// Response body for GET /cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    pub datasets: Vec<DatasetStats>,
}

impl StatsResponse {
    /// Totals the per-dataset figures.
    pub fn new(datasets: Vec<DatasetStats>) -> Self {
        let mut total = CacheStats::default();
        for entry in &datasets {
            total.merge(&entry.stats);
        }
        Self {
            hits: total.hits,
            misses: total.misses,
            invalidations: total.invalidations,
            total_entries: total.total_entries,
            hit_rate: total.hit_rate(),
            datasets,
        }
    }
}

/// Response body for DELETE /cache and DELETE /cache/:dataset
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    /// Entries dropped
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(scope: impl std::fmt::Display, removed: usize) -> Self {
        Self {
            message: format!("Invalidated {}", scope),
            removed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
