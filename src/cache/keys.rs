//! Dataset Keys
//!
//! The fixed set of logical datasets the cache fronts, their keys, and their
//! conventional freshness windows.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

// == Dataset ==
/// A logical dataset held in the cache under a stable key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Students,
    StudentsAll,
    Textbooks,
    Templates,
    Transactions,
    /// Base of the per-date-range lesson keys
    Lessons,
    Recitals,
    SheetMusic,
}

impl Dataset {
    pub const ALL: [Dataset; 8] = [
        Dataset::Students,
        Dataset::StudentsAll,
        Dataset::Textbooks,
        Dataset::Templates,
        Dataset::Transactions,
        Dataset::Lessons,
        Dataset::Recitals,
        Dataset::SheetMusic,
    ];

    /// Cache key for this dataset.
    pub fn key(self) -> &'static str {
        match self {
            Dataset::Students => "students",
            Dataset::StudentsAll => "students_all",
            Dataset::Textbooks => "textbooks",
            Dataset::Templates => "templates",
            Dataset::Transactions => "transactions",
            Dataset::Lessons => "lessons",
            Dataset::Recitals => "recitals",
            Dataset::SheetMusic => "sheet_music",
        }
    }

    /// Conventional TTL in milliseconds, scaled to how often the data changes.
    pub fn default_ttl_ms(self) -> u64 {
        match self {
            Dataset::Students
            | Dataset::StudentsAll
            | Dataset::Textbooks
            | Dataset::Transactions => 60 * 1000,
            Dataset::Lessons => 30 * 1000,
            Dataset::Recitals => 120 * 1000,
            Dataset::SheetMusic | Dataset::Templates => 300 * 1000,
        }
    }

    /// Looks a dataset up by its cache key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dataset| dataset.key() == key)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// == Lesson Keys ==
/// Builds the key for lessons between two RFC 3339 instants, e.g.
/// `lessons_2024-04-01_2024-04-07`. Dates are taken in UTC.
pub fn lessons_cache_key(time_min: &str, time_max: &str) -> Result<String> {
    let min = utc_date(time_min)?;
    let max = utc_date(time_max)?;
    Ok(format!("{}_{}_{}", Dataset::Lessons.key(), min, max))
}

fn utc_date(instant: &str) -> Result<String> {
    let parsed = DateTime::parse_from_rfc3339(instant).map_err(|e| {
        StudioError::InvalidRequest(format!("Invalid RFC 3339 time '{}': {}", instant, e))
    })?;
    Ok(parsed
        .with_timezone(&Utc)
        .date_naive()
        .format("%Y-%m-%d")
        .to_string())
}

// == TTL Policy ==
/// Per-dataset freshness windows: the conventional TTL unless configuration
/// overrides it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TtlPolicy {
    overrides: HashMap<Dataset, u64>,
}

impl TtlPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the conventional TTL of one dataset.
    pub fn with_override(mut self, dataset: Dataset, ttl_ms: u64) -> Self {
        self.overrides.insert(dataset, ttl_ms);
        self
    }

    /// TTL a reader of `dataset` should apply.
    pub fn ttl_ms(&self, dataset: Dataset) -> u64 {
        self.overrides
            .get(&dataset)
            .copied()
            .unwrap_or_else(|| dataset.default_ttl_ms())
    }
}
