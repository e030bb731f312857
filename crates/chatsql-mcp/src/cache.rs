//! TTL resource cache
//!
//! Expired entries are evicted lazily by `get` and in bulk by
//! `cleanup_expired`, which an external scheduler is expected to call.
//! One mutex covers the entry map and the counters, so every operation
//! observes a consistent snapshot.

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Time source for entry ages
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests and simulations
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    /// Clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    stored_at: Instant,
    hit_count: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries removed for being older than the TTL
    pub evictions: u64,
    /// `hits + misses`
    pub total_requests: u64,
    /// Hit percentage with two decimals, e.g. `"75.00%"`
    pub hit_rate: String,
    /// Entries currently stored
    pub cached_items: usize,
}

/// TTL cache for resource payloads, keyed by an opaque string
#[derive(Debug)]
pub struct ResourceCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState>,
}

impl ResourceCache {
    /// Cache on the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Cache on an explicit clock
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Entry time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) > self.ttl
    }

    /// Look up a live entry
    ///
    /// An expired entry is removed and counted as both a miss and an eviction.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(entry) = state.entries.get_mut(key) else {
            state.misses += 1;
            return None;
        };

        if self.is_expired(entry, now) {
            state.entries.remove(key);
            state.misses += 1;
            state.evictions += 1;
            debug!(key, "Evicted expired cache entry");
            return None;
        }

        entry.hit_count += 1;
        state.hits += 1;
        Some(entry.data.clone())
    }

    /// Store `data`, replacing any existing entry with a fresh timestamp
    pub fn set(&self, key: impl Into<String>, data: Value) {
        let entry = CacheEntry {
            data,
            stored_at: self.clock.now(),
            hit_count: 0,
        };
        self.state.lock().entries.insert(key.into(), entry);
    }

    /// Remove one entry, or every entry when `key` is `None`
    pub fn invalidate(&self, key: Option<&str>) {
        let mut state = self.state.lock();
        match key {
            Some(key) => {
                state.entries.remove(key);
            }
            None => state.entries.clear(),
        }
    }

    /// Remove every entry older than the TTL, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !self.is_expired(entry, now));
        let removed = before - state.entries.len();
        state.evictions += removed as u64;
        if removed > 0 {
            debug!(removed, "Swept expired cache entries");
        }
        removed
    }

    /// Times the entry under `key` has been served
    pub fn hit_count(&self, key: &str) -> Option<u64> {
        self.state.lock().entries.get(key).map(|e| e.hit_count)
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        *self.state.lock() = CacheState::default();
    }

    /// Current statistics
    pub fn get_stats(&self) -> CacheStats {
        let state = self.state.lock();
        let total_requests = state.hits + state.misses;
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            total_requests,
            hit_rate: format_hit_rate(state.hits, total_requests),
            cached_items: state.entries.len(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_hit_rate(hits: u64, total: u64) -> String {
    let rate = if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64 * 100.0
    };
    format!("{rate:.2}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn cache(ttl_secs: u64) -> (ResourceCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = ResourceCache::with_clock(Duration::from_secs(ttl_secs), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_get_after_set() {
        let (cache, _) = cache(60);
        cache.set("db://schema", json!({"tables": 3}));
        assert_eq!(cache.get("db://schema"), Some(json!({"tables": 3})));
        assert_eq!(cache.hit_count("db://schema"), Some(1));
    }

    #[test]
    fn test_expired_entry_is_evicted_on_get() {
        let (cache, clock) = cache(60);
        cache.set("k", json!(1));
        clock.advance(Duration::from_secs(61));

        assert_eq!(cache.get("k"), None);
        let stats = cache.get_stats();
        assert_eq!(stats.cached_items, 0);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_entry_alive_at_exact_ttl() {
        let (cache, clock) = cache(60);
        cache.set("k", json!(1));
        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!(1)));
    }

    #[test]
    fn test_set_refreshes_timestamp() {
        let (cache, clock) = cache(60);
        cache.set("k", json!(1));
        clock.advance(Duration::from_secs(50));
        cache.set("k", json!(2));
        clock.advance(Duration::from_secs(50));
        assert_eq!(cache.get("k"), Some(json!(2)));
    }

    #[test]
    fn test_cleanup_expired_counts_removed() {
        let (cache, clock) = cache(10);
        cache.set("old-a", json!(1));
        cache.set("old-b", json!(2));
        clock.advance(Duration::from_secs(11));
        cache.set("fresh", json!(3));

        assert_eq!(cache.cleanup_expired(), 2);
        assert_eq!(cache.cleanup_expired(), 0);
        assert_eq!(cache.get_stats().cached_items, 1);
    }

    #[test]
    fn test_invalidate_one_or_all() {
        let (cache, _) = cache(60);
        cache.set("a", json!(1));
        cache.set("b", json!(2));

        cache.invalidate(Some("a"));
        assert_eq!(cache.get_stats().cached_items, 1);
        cache.invalidate(None);
        assert_eq!(cache.get_stats().cached_items, 0);
    }

    #[test]
    fn test_stats_format() {
        let (cache, _) = cache(60);
        assert_eq!(cache.get_stats().hit_rate, "0.00%");

        cache.set("k", json!(1));
        cache.get("k");
        cache.get("k");
        cache.get("k");
        cache.get("missing");

        let stats = cache.get_stats();
        assert_eq!(stats.hit_rate, "75.00%");
        assert_eq!(stats.total_requests, 4);
    }

    #[test]
    fn test_clear_resets_counters() {
        let (cache, _) = cache(60);
        cache.set("k", json!(1));
        cache.get("k");
        cache.clear();
        let stats = cache.get_stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.cached_items, 0);
    }

    proptest! {
        #[test]
        fn prop_stats_consistent(hits in 0u64..50, misses in 0u64..50) {
            let (cache, _) = cache(60);
            cache.set("live", json!(true));
            for _ in 0..hits {
                cache.get("live");
            }
            for _ in 0..misses {
                cache.get("absent");
            }

            let stats = cache.get_stats();
            prop_assert_eq!(stats.total_requests, hits + misses);
            prop_assert_eq!(stats.hit_rate, format_hit_rate(hits, hits + misses));
        }
    }
}
