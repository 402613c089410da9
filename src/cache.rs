//! Bounded LRU cache for per-page native resources

use std::num::NonZeroUsize;

use lru::LruCache;

/// Fixed-capacity LRU cache mapping a page index to an owned resource.
///
/// The cache exclusively owns every resource it holds. Whenever an entry
/// is displaced (capacity eviction, same-key replacement, explicit removal
/// or teardown) the supplied callback runs before the value is dropped, so
/// callers can log or account for the release of the underlying native
/// memory. Callbacks are infallible; release problems are reported through
/// logging by the caller rather than propagated.
pub struct BoundedCache<V> {
    entries: LruCache<i32, V>,
}

impl<V> BoundedCache<V> {
    /// Create a cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).expect("1 is non-zero")),
            ),
        }
    }

    /// Get a cached resource, promoting it to most-recently-used.
    pub fn get(&mut self, key: i32) -> Option<&V> {
        self.entries.get(&key)
    }

    /// Check for a key without touching recency order.
    #[must_use]
    pub fn contains(&self, key: i32) -> bool {
        self.entries.contains(&key)
    }

    /// Insert or replace a resource, moving the key to most-recently-used.
    ///
    /// If the key was already present, or the insertion pushes the cache
    /// past capacity, the displaced entry is handed to `on_evict` before
    /// being dropped. At most one entry can be displaced per call.
    pub fn insert(&mut self, key: i32, value: V, on_evict: impl FnOnce(i32, V)) {
        if let Some((evicted_key, evicted)) = self.entries.push(key, value) {
            on_evict(evicted_key, evicted);
        }
    }

    /// Remove a single entry, invoking `on_remove` if it was present.
    pub fn remove(&mut self, key: i32, on_remove: impl FnOnce(i32, V)) -> bool {
        match self.entries.pop(&key) {
            Some(value) => {
                on_remove(key, value);
                true
            }
            None => false,
        }
    }

    /// Release every entry through `on_clear`, leaving the cache empty.
    ///
    /// Entries are surrendered in least-recently-used order.
    pub fn clear(&mut self, mut on_clear: impl FnMut(i32, V)) {
        while let Some((key, value)) = self.entries.pop_lru() {
            on_clear(key, value);
        }
    }

    /// Number of resident entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of resident entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}
