//! Cache Entry Module
//!
//! A stored value plus the moment it was captured. Freshness is not a property
//! of the entry; the reader decides it by supplying a TTL.

// == Cache Entry ==
/// Represents a single cache entry with value and capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Capture timestamp (Unix milliseconds)
    pub stored_at: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new entry captured at `stored_at`.
    pub fn new(value: T, stored_at: u64) -> Self {
        Self { value, stored_at }
    }

    // == Age ==
    /// Milliseconds elapsed since capture. A clock that went backwards reads as 0.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.stored_at)
    }

    // == Is Fresh ==
    /// Checks the entry against a reader-supplied TTL.
    ///
    /// Boundary condition: an entry whose age equals the TTL is stale.
    pub fn is_fresh(&self, now: u64, ttl_ms: u64) -> bool {
        self.age_ms(now) < ttl_ms
    }
}
