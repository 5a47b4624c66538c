//! Cache Store Module
//!
//! Typed key-value store with read-time TTL checks and explicit invalidation.
//! Entries are never swept; a stale entry stays until it is overwritten or
//! invalidated.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::stats::StatCounters;
use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock, DEFAULT_TTL_MS};

// == Entry State ==
/// Read-time classification of a key under a given TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    Fresh,
    /// Present but older than the TTL applied by the reader
    Stale,
}

// == Cache Store ==
/// In-memory store mapping string keys to values of one type.
#[derive(Debug)]
pub struct CacheStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Time source for stamping and ageing entries
    clock: Arc<dyn Clock>,
    /// TTL applied by `get_default`
    default_ttl_ms: u64,
    /// Performance statistics
    counters: StatCounters,
    /// Bumped by every invalidation
    generation: u64,
}

impl<T: Clone> CacheStore<T> {
    // == Constructor ==
    /// Creates an empty store on the system clock with the stock default TTL.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), DEFAULT_TTL_MS)
    }

    /// Creates an empty store with an explicit clock and default TTL.
    pub fn with_clock(clock: Arc<dyn Clock>, default_ttl_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
            default_ttl_ms,
            counters: StatCounters::default(),
            generation: 0,
        }
    }

    // == Get ==
    /// Returns a copy of the value under `key` if it is younger than `ttl_ms`.
    ///
    /// A stale entry is reported as a miss but left in place, so a later read
    /// with a longer TTL can still see it.
    pub fn get(&self, key: &str, ttl_ms: u64) -> Option<T> {
        let now = self.clock.now_ms();
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now, ttl_ms) => {
                self.counters.record_hit();
                Some(entry.value.clone())
            }
            _ => {
                self.counters.record_miss();
                None
            }
        }
    }

    /// `get` with the store's default TTL.
    pub fn get_default(&self, key: &str) -> Option<T> {
        self.get(key, self.default_ttl_ms)
    }

    // == Set ==
    /// Stores `value` under `key` stamped with the current time, replacing any
    /// previous entry.
    pub fn set(&mut self, key: impl Into<String>, value: T) {
        let entry = CacheEntry::new(value, self.clock.now_ms());
        self.entries.insert(key.into(), entry);
    }

    // == Invalidate ==
    /// Removes one key, or every key when `key` is `None`.
    ///
    /// Returns the number of entries removed. The generation moves on even
    /// when nothing was removed.
    pub fn invalidate(&mut self, key: Option<&str>) -> usize {
        let removed = match key {
            Some(key) => usize::from(self.entries.remove(key).is_some()),
            None => {
                let count = self.entries.len();
                self.entries.clear();
                count
            }
        };
        self.generation += 1;
        self.counters.record_invalidations(removed);
        removed
    }

    /// Removes every key starting with `prefix`.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - self.entries.len();
        self.generation += 1;
        self.counters.record_invalidations(removed);
        removed
    }

    /// Number of invalidations so far. A fetch started before an
    /// invalidation compares this before caching its result.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // == State ==
    /// Classifies `key` under `ttl_ms` without touching the counters.
    pub fn state(&self, key: &str, ttl_ms: u64) -> EntryState {
        match self.entries.get(key) {
            None => EntryState::Absent,
            Some(entry) if entry.is_fresh(self.clock.now_ms(), ttl_ms) => EntryState::Fresh,
            Some(_) => EntryState::Stale,
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.entries.len())
    }

    // == Length ==
    /// Returns the number of entries held, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for CacheStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
