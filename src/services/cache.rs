//! Memoized search results.
//!
//! Entries are tagged with the usage generation they were computed at. A
//! lookup with a different generation misses, so a result ordered by stale
//! ranks is never served even if it was inserted after the last clear.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;

/// Default number of memoized filters.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

struct CachedResult {
    generation: u64,
    emojis: Arc<[String]>,
}

/// Bounded LRU map from normalized filter to ordered result.
pub struct ResultCache {
    entries: Mutex<LruCache<String, CachedResult>>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, CachedResult>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached result for `filter`, if it was computed at `generation`.
    pub fn get(&self, filter: &str, generation: u64) -> Option<Arc<[String]>> {
        // LRU lookups reorder entries and need the lock even for reads
        let mut entries = self.entries();
        let stale = match entries.get(filter) {
            Some(cached) if cached.generation == generation => {
                return Some(Arc::clone(&cached.emojis))
            }
            Some(_) => true,
            None => false,
        };
        if stale {
            entries.pop(filter);
        }
        None
    }

    pub fn insert(&self, filter: String, generation: u64, emojis: Arc<[String]>) {
        self.entries().put(filter, CachedResult { generation, emojis });
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries().cap().get()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
