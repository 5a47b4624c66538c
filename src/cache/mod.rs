//! Cache Module
//!
//! In-memory read-through cache with reader-supplied TTLs and explicit
//! invalidation.

mod clock;
mod entry;
mod keys;
mod read_through;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use keys::{lessons_cache_key, Dataset, TtlPolicy};
pub use read_through::{read_through, shared, SharedStore};
pub use stats::CacheStats;
pub use store::{CacheStore, EntryState};

// == Public Constants ==
/// TTL applied when a reader does not supply one
pub const DEFAULT_TTL_MS: u64 = 30 * 1000;
