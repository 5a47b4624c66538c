//! Read-Through Helper
//!
//! Serves a key from the cache when fresh, otherwise fetches it from the
//! source of truth and stores the result.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::CacheStore;

/// A store shared between request handlers.
pub type SharedStore<T> = Arc<RwLock<CacheStore<T>>>;

/// Wraps a store for sharing.
pub fn shared<T: Clone>(store: CacheStore<T>) -> SharedStore<T> {
    Arc::new(RwLock::new(store))
}

/// Returns the cached value under `key` if younger than `ttl_ms`; otherwise
/// awaits `fetch`, caches its value and returns it.
///
/// No lock is held while `fetch` runs. Two concurrent misses may both fetch;
/// the later `set` wins. A fetch that overlaps an invalidation of the store
/// returns its value without caching it, so the next read fetches again. A
/// failed fetch leaves the cache untouched.
pub async fn read_through<T, E, F, Fut>(
    store: &SharedStore<T>,
    key: &str,
    ttl_ms: u64,
    fetch: F,
) -> Result<T, E>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let (cached, generation) = {
        let store = store.read().await;
        (store.get(key, ttl_ms), store.generation())
    };
    if let Some(value) = cached {
        debug!(key, "cache hit");
        return Ok(value);
    }

    debug!(key, ttl_ms, "cache miss, fetching");
    let value = fetch().await?;

    let mut store = store.write().await;
    if store.generation() == generation {
        store.set(key, value.clone());
    } else {
        debug!(key, "invalidated during fetch, result not cached");
    }
    Ok(value)
}
