//! Typed cache registry.
//!
//! One store per cached dataset, built once at startup and handed to every
//! service. Holding a separate `CacheStore<T>` per dataset means a reader can
//! only get back the record type that was written under that key.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::cache::{
    shared, CacheStore, Clock, Dataset, SharedStore, SystemClock, TtlPolicy, DEFAULT_TTL_MS,
};
use crate::models::{DatasetStats, Recital, ReportTemplate, SheetMusic, Student, Transaction};

#[derive(Debug, Clone)]
pub struct DataCache {
    pub students: SharedStore<Vec<Student>>,
    pub transactions: SharedStore<Vec<Transaction>>,
    pub recitals: SharedStore<Vec<Recital>>,
    pub sheet_music: SharedStore<Vec<SheetMusic>>,
    pub templates: SharedStore<Vec<ReportTemplate>>,
    policy: TtlPolicy,
    clock: Arc<dyn Clock>,
}

impl DataCache {
    /// Datasets that have a store here.
    pub const CACHED: [Dataset; 5] = [
        Dataset::Students,
        Dataset::Recitals,
        Dataset::SheetMusic,
        Dataset::Templates,
        Dataset::Transactions,
    ];

    pub fn new(policy: TtlPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    /// Builds every store on the given clock.
    pub fn with_clock(policy: TtlPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            students: shared(CacheStore::with_clock(clock.clone(), DEFAULT_TTL_MS)),
            transactions: shared(CacheStore::with_clock(clock.clone(), DEFAULT_TTL_MS)),
            recitals: shared(CacheStore::with_clock(clock.clone(), DEFAULT_TTL_MS)),
            sheet_music: shared(CacheStore::with_clock(clock.clone(), DEFAULT_TTL_MS)),
            templates: shared(CacheStore::with_clock(clock.clone(), DEFAULT_TTL_MS)),
            policy,
            clock,
        }
    }

    /// TTL readers of `dataset` apply.
    pub fn ttl_ms(&self, dataset: Dataset) -> u64 {
        self.policy.ttl_ms(dataset)
    }

    /// Current time on the cache's clock, in Unix milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Today's date in UTC on the cache's clock.
    pub fn today(&self) -> NaiveDate {
        let now = i64::try_from(self.now_ms()).unwrap_or(i64::MAX);
        DateTime::<Utc>::from_timestamp_millis(now)
            .unwrap_or_default()
            .date_naive()
    }

    /// Whether `dataset` has a store here.
    pub fn is_cached(dataset: Dataset) -> bool {
        Self::CACHED.contains(&dataset)
    }

    /// Drops the cached copy of one dataset. Datasets without a store here
    /// (see [`DataCache::is_cached`]) hold nothing, so nothing is removed.
    pub async fn invalidate(&self, dataset: Dataset) -> usize {
        let key = Some(dataset.key());
        let removed = match dataset {
            Dataset::Students => self.students.write().await.invalidate(key),
            Dataset::Transactions => self.transactions.write().await.invalidate(key),
            Dataset::Recitals => self.recitals.write().await.invalidate(key),
            Dataset::SheetMusic => self.sheet_music.write().await.invalidate(key),
            Dataset::Templates => self.templates.write().await.invalidate(key),
            Dataset::StudentsAll | Dataset::Textbooks | Dataset::Lessons => 0,
        };
        debug!(%dataset, removed, "cache invalidated");
        removed
    }

    /// Clears every store.
    pub async fn invalidate_all(&self) -> usize {
        let removed = self.students.write().await.invalidate(None)
            + self.transactions.write().await.invalidate(None)
            + self.recitals.write().await.invalidate(None)
            + self.sheet_music.write().await.invalidate(None)
            + self.templates.write().await.invalidate(None);
        debug!(removed, "cache cleared");
        removed
    }

    pub async fn stats(&self) -> Vec<DatasetStats> {
        let mut out = Vec::with_capacity(Self::CACHED.len());
        for dataset in Self::CACHED {
            let stats = match dataset {
                Dataset::Students => self.students.read().await.stats(),
                Dataset::Transactions => self.transactions.read().await.stats(),
                Dataset::Recitals => self.recitals.read().await.stats(),
                Dataset::SheetMusic => self.sheet_music.read().await.stats(),
                Dataset::Templates => self.templates.read().await.stats(),
                Dataset::StudentsAll | Dataset::Textbooks | Dataset::Lessons => continue,
            };
            out.push(DatasetStats {
                dataset,
                ttl_ms: self.ttl_ms(dataset),
                stats,
            });
        }
        out
    }
}

impl Default for DataCache {
    fn default() -> Self {
        Self::new(TtlPolicy::default())
    }
}
