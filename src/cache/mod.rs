//! Generic TTL-expiring, LRU-evicting cache.
//!
//! All state sits behind one mutex: `get` updates access bookkeeping and
//! `set` sweeps expired entries and evicts, so both are serialized.
//! Expiry is lazy; nothing runs in the background.
//!
//! When several entries share the oldest access time, the first one found
//! while iterating the map is evicted.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::CacheConfig;
use crate::metrics::CacheMetrics;

/// A cached value with its bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub ttl: Duration,
    pub access_count: u64,
    pub last_accessed: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            ttl,
            access_count: 0,
            last_accessed: now,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > self.ttl
    }
}

/// Point-in-time cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Hits as a percentage of lookups
    pub hit_rate: f64,
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

pub struct TtlCache<K, V> {
    name: &'static str,
    state: Mutex<CacheState<K, V>>,
    max_size: usize,
    default_ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache. A `max_size` of zero is treated as one.
    pub fn new(name: &'static str, max_size: usize, default_ttl: Duration) -> Self {
        Self {
            name,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
            max_size: max_size.max(1),
            default_ttl,
        }
    }

    pub fn from_config(name: &'static str, config: &CacheConfig) -> Self {
        Self::new(name, config.max_size, config.default_ttl())
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a value, sweeping expired entries and evicting the least
    /// recently accessed one if the cache is still full.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let mut guard = self.lock();
        let state = &mut *guard;
        let now = Instant::now();

        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now));
        let expired = (before - state.entries.len()) as u64;
        if expired > 0 {
            state.expirations += expired;
            CacheMetrics::record_expirations(self.name, expired);
            tracing::debug!(cache = self.name, expired, "Swept expired cache entries");
        }

        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_size {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
                state.evictions += 1;
                CacheMetrics::record_eviction(self.name);
                tracing::debug!(cache = self.name, "Evicted least recently used entry");
            }
        }

        state.entries.insert(key, CacheEntry::new(value, ttl));
    }

    /// Fetch a live value. An expired entry is removed and reported as absent.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let now = Instant::now();

        let expired = match state.entries.get_mut(key) {
            None => {
                state.misses += 1;
                return None;
            }
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                entry.access_count += 1;
                entry.last_accessed = now;
                let value = entry.value.clone();
                state.hits += 1;
                return Some(value);
            }
        };

        if expired {
            state.entries.remove(key);
            state.expirations += 1;
            state.misses += 1;
            CacheMetrics::record_expirations(self.name, 1);
        }
        None
    }

    /// True if a live entry exists. Does not count as an access.
    pub fn has(&self, key: &K) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;
        let expired = match state.entries.get(key) {
            None => return false,
            Some(entry) => entry.is_expired(Instant::now()),
        };
        if expired {
            state.entries.remove(key);
            state.expirations += 1;
            CacheMetrics::record_expirations(self.name, 1);
        }
        !expired
    }

    pub fn delete(&self, key: &K) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    /// Remove every entry and reset statistics
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
        state.evictions = 0;
        state.expirations = 0;
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Access count of a live entry
    pub fn access_count(&self, key: &K) -> Option<u64> {
        let state = self.lock();
        state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.access_count)
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let lookups = state.hits + state.misses;
        CacheStats {
            size: state.entries.len(),
            max_size: self.max_size,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            expirations: state.expirations,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                state.hits as f64 / lookups as f64 * 100.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_and_get() {
        let cache = TtlCache::new("test", 10, Duration::from_secs(60));
        cache.set("k", 1, None);

        assert_eq!(cache.get(&"k"), Some(1));
        assert_eq!(cache.get(&"missing"), None);
        assert!(cache.has(&"k"));
        assert_eq!(cache.access_count(&"k"), Some(1));
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = TtlCache::new("test", 10, Duration::from_secs(60));
        cache.set("k", "v", Some(Duration::from_millis(100)));
        assert_eq!(cache.get(&"k"), Some("v"));

        thread::sleep(Duration::from_millis(150));

        assert_eq!(cache.get(&"k"), None);
        assert!(!cache.has(&"k"));
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_lru_eviction() {
        let max_size = 3;
        let cache = TtlCache::new("test", max_size, Duration::from_secs(60));
        cache.set(1, "a", None);
        thread::sleep(Duration::from_millis(2));
        cache.set(2, "b", None);
        thread::sleep(Duration::from_millis(2));
        cache.set(3, "c", None);
        thread::sleep(Duration::from_millis(2));

        // Touch 1 so 2 becomes the least recently accessed
        assert_eq!(cache.get(&1), Some("a"));

        cache.set(4, "d", None);

        assert_eq!(cache.len(), max_size);
        assert_eq!(cache.stats().evictions, 1);
        assert!(!cache.has(&2));
        assert!(cache.has(&1));
        assert!(cache.has(&3));
        assert!(cache.has(&4));
    }

    #[test]
    fn test_size_never_exceeds_max() {
        let cache = TtlCache::new("test", 5, Duration::from_secs(60));
        for i in 0..50 {
            cache.set(i, i, None);
            assert!(cache.len() <= 5);
        }
        assert_eq!(cache.stats().evictions, 45);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = TtlCache::new("test", 2, Duration::from_secs(60));
        cache.set("a", 1, None);
        cache.set("b", 2, None);
        cache.set("a", 3, None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.get(&"a"), Some(3));
    }

    #[test]
    fn test_expired_entries_swept_before_eviction() {
        let cache = TtlCache::new("test", 2, Duration::from_secs(60));
        cache.set("short", 1, Some(Duration::from_millis(20)));
        cache.set("long", 2, None);
        thread::sleep(Duration::from_millis(40));

        cache.set("new", 3, None);

        assert_eq!(cache.stats().evictions, 0);
        assert!(cache.has(&"long"));
        assert!(cache.has(&"new"));
    }

    #[test]
    fn test_delete_clear_and_stats() {
        let cache = TtlCache::new("test", 10, Duration::from_secs(60));
        cache.set("a", 1, None);
        cache.set("b", 2, None);
        cache.get(&"a");
        cache.get(&"zzz");

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 50.0);

        assert!(cache.delete(&"a"));
        assert!(!cache.delete(&"a"));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats { max_size: 10, ..CacheStats::default() });
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(TtlCache::new("test", 64, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..100 {
                        cache.set((t, i), i, None);
                        cache.get(&(t, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 64);
    }
}
