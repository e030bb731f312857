//! Adapter runtime metrics
//!
//! Lock-free counters updated on every adapter call.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::cache::CacheStats;
use crate::config::AdapterMode;

/// Counters accumulated over the adapter's lifetime
#[derive(Debug, Default)]
pub struct AdapterMetrics {
    total_requests: AtomicU64,
    errors: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    latency_total_us: AtomicU64,
    latency_samples: AtomicU64,
}

impl AdapterMetrics {
    /// All counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request
    pub fn inc_requests(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one backend failure
    pub fn inc_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one resource read answered from the cache
    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one resource read that went to a server
    pub fn inc_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the wall-clock latency of one tool call
    pub fn record_latency(&self, elapsed: Duration) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.latency_total_us.fetch_add(us, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Zero every counter
    pub fn reset(&self) {
        for counter in [
            &self.total_requests,
            &self.errors,
            &self.cache_hits,
            &self.cache_misses,
            &self.latency_total_us,
            &self.latency_samples,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Requests counted so far
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Failures counted so far
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Reset the cache hit/miss counters
    pub fn reset_cache_counters(&self) {
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
    }

    /// `hits / (hits + misses)`, 0 before any cache lookup
    pub fn cache_hit_ratio(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let total = hits + self.cache_misses.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Mean recorded tool-call latency in milliseconds, 0 without samples
    pub fn average_latency_ms(&self) -> f64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0.0;
        }
        self.latency_total_us.load(Ordering::Relaxed) as f64 / samples as f64 / 1000.0
    }
}

/// Adapter-level statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeStats {
    /// Active mode; `None` before initialization
    pub mode: Option<AdapterMode>,
    /// Connected servers
    pub active_servers: usize,
    /// Tools exposed
    pub total_tools: usize,
    /// Resources exposed
    pub total_resources: usize,
    /// Fraction of resource reads answered from the cache
    pub cache_hit_ratio: f64,
    /// Mean tool-call latency in milliseconds
    pub average_latency: f64,
    /// Tool calls and resource reads attempted
    pub total_requests: u64,
    /// Failed backend operations
    pub error_count: u64,
    /// Resource cache statistics, in multi-server mode with caching enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}
