//! Metrics collection module
//!
//! Tracks cache effectiveness, rate limiting, and per-engine performance.

use crate::engines::EngineKind;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Response times kept per engine for the rolling average
const LATENCY_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct EngineCounters {
    searches: u64,
    successes: u64,
    errors: u64,
    response_times_ms: VecDeque<u64>,
}

/// Service-wide metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    total_searches: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    rate_limited: AtomicU64,
    engines: RwLock<HashMap<EngineKind, EngineCounters>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an incoming search request
    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed provider call
    pub fn record_engine_call(&self, engine: EngineKind, elapsed: Duration, success: bool) {
        let mut engines = self
            .engines
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let counters = engines.entry(engine).or_default();

        counters.searches += 1;
        if success {
            counters.successes += 1;
        } else {
            counters.errors += 1;
        }

        if counters.response_times_ms.len() >= LATENCY_WINDOW {
            counters.response_times_ms.pop_front();
        }
        counters
            .response_times_ms
            .push_back(elapsed.as_millis() as u64);
    }

    pub fn total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let engines = self.engines.read().unwrap_or_else(PoisonError::into_inner);

        let engines = engines
            .iter()
            .map(|(kind, counters)| {
                let times = &counters.response_times_ms;
                let avg_response_time_ms = if times.is_empty() {
                    None
                } else {
                    Some(times.iter().sum::<u64>() / times.len() as u64)
                };
                let finished = counters.successes + counters.errors;
                let reliability = if finished == 0 {
                    100.0
                } else {
                    counters.successes as f64 / finished as f64 * 100.0
                };

                (
                    *kind,
                    EngineStats {
                        searches: counters.searches,
                        successes: counters.successes,
                        errors: counters.errors,
                        avg_response_time_ms,
                        reliability,
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            total_searches: self.total_searches(),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            engines,
        }
    }
}

/// Serializable view of [`Metrics`]
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub rate_limited: u64,
    pub engines: BTreeMap<EngineKind, EngineStats>,
}

/// Statistics for a single engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub searches: u64,
    pub successes: u64,
    pub errors: u64,
    pub avg_response_time_ms: Option<u64>,
    /// Percentage of calls that succeeded
    pub reliability: f64,
}
