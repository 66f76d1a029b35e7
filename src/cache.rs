//! Schema cache - bounded memoization of compiled validators.
//!
//! Keys are the canonical JSON serialization of the metadata document.
//! The cache is a pure performance layer: validation behavior must be
//! identical with the cache disabled (capacity 0).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::schema::CompiledValidator;

/// Default number of compiled forms kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Bounded LRU cache of compiled validators.
///
/// Interior mutability behind a mutex so a shared compiler handle stays
/// `Sync`; recency bookkeeping is not safe under unsynchronized access.
pub struct SchemaCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Arc<CompiledValidator>>,
    /// Keys ordered least- to most-recently used.
    recency: VecDeque<String>,
}

impl SchemaCache {
    /// Create a cache holding at most `capacity` compiled forms.
    ///
    /// Capacity 0 disables caching entirely.
    pub fn new(capacity: usize) -> Self {
        SchemaCache {
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Look up a compiled validator; a hit is promoted to most recent.
    pub fn get(&self, key: &str) -> Option<Arc<CompiledValidator>> {
        let mut inner = self.lock();
        let hit = inner.entries.get(key).cloned()?;
        promote(&mut inner.recency, key);
        Some(hit)
    }

    /// Insert a compiled validator, evicting the least recent past capacity.
    pub fn insert(&self, key: String, validator: Arc<CompiledValidator>) {
        if self.capacity == 0 {
            return;
        }

        let mut inner = self.lock();
        if inner.entries.insert(key.clone(), validator).is_some() {
            promote(&mut inner.recency, &key);
        } else {
            inner.recency.push_back(key);
        }

        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.recency.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            debug!(key = %oldest, "evicted compiled form from schema cache");
        }
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.recency.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panic mid-bookkeeping; dropping the
        // stale entries is always safe for a memoization layer.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                let mut guard = poisoned.into_inner();
                guard.entries.clear();
                guard.recency.clear();
                guard
            }
        }
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        SchemaCache::new(DEFAULT_CACHE_CAPACITY)
    }
}

fn promote(recency: &mut VecDeque<String>, key: &str) {
    if let Some(pos) = recency.iter().position(|k| k == key) {
        if let Some(k) = recency.remove(pos) {
            recency.push_back(k);
        }
    }
}
