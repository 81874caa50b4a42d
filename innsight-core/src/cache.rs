//! Bounded TTL cache shared by the analytics engines.
//!
//! The cache is a pure performance optimization: losing it never changes
//! forecast results, only latency. Entries expire after a per-cache TTL
//! and the oldest insertions are evicted FIFO once the cache exceeds its
//! size bound. Readers and writers go through a `Mutex`; no transactional
//! semantics are needed (at-most-stale-by-one-entry is acceptable).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Cache handle shared by all analytics engines.
///
/// Values are stored as JSON so one cache instance can hold forecasts,
/// lifetime values, and BI reports side by side under distinct keys.
pub type SharedCache = std::sync::Arc<ForecastCache<serde_json::Value>>;

/// Build the process-wide shared cache from configuration.
pub fn shared_from_config(config: &crate::config::CacheConfig) -> SharedCache {
    std::sync::Arc::new(ForecastCache::from_config(config))
}

struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
}

struct CacheInner<T> {
    entries: HashMap<String, CacheEntry<T>>,
    // Insertion order for FIFO eviction
    order: VecDeque<String>,
}

/// Bounded, TTL-based cache keyed by opaque strings
/// (e.g. `property:service:period`).
pub struct ForecastCache<T> {
    inner: Mutex<CacheInner<T>>,
    ttl: Duration,
    max_size: usize,
}

impl<T: Clone> ForecastCache<T> {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            ttl,
            max_size: max_size.max(1),
        }
    }

    /// Build a cache from the configured TTL and size bound.
    pub fn from_config(config: &crate::config::CacheConfig) -> Self {
        Self::new(Duration::from_millis(config.ttl_ms), config.max_size)
    }

    /// Fetch a live entry. Expired entries miss and are removed.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        match inner.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                inner.entries.remove(key);
                inner.order.retain(|k| k != key);
                None
            }
            None => None,
        }
    }

    /// Insert a value, evicting the oldest insertions past `max_size`.
    pub fn insert(&self, key: &str, value: T) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");

        if inner.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        ).is_none()
        {
            inner.order.push_back(key.to_string());
        }

        while inner.entries.len() > self.max_size {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
        }
    }

    /// Number of entries currently held, including not-yet-purged expired ones.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let ttl = self.ttl;
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        let removed = before - inner.entries.len();
        if removed > 0 {
            let live: std::collections::HashSet<String> =
                inner.entries.keys().cloned().collect();
            inner.order.retain(|k| live.contains(k));
            tracing::debug!(removed, "Purged expired cache entries");
        }
        removed
    }
}
