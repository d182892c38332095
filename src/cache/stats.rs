//! Cache Statistics Module
//!
//! Tracks cache performance metrics: hits, misses, and cumulative backend
//! operation time. Counters are process-wide, reset only on restart, and are
//! read as point-in-time snapshots merged with live backend info on demand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

// == Cache Stats ==
/// Running cache performance counters.
///
/// Atomic so the store can record from `&self` under concurrent callers.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    op_time_micros: AtomicU64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Time ==
    /// Accumulates elapsed wall-clock time for one backend operation.
    ///
    /// Recorded for every get/set regardless of hit, miss, or failure, so
    /// operators can derive average backend latency.
    pub fn record_time(&self, elapsed: Duration) {
        self.op_time_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Returns a point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        StatsSnapshot {
            hits,
            misses,
            hit_ratio: hit_ratio(hits, misses),
            op_time_seconds: self.op_time_micros.load(Ordering::Relaxed) as f64 / 1e6,
        }
    }
}

/// Hit ratio as a percentage rounded to two decimals; 0 before any request.
fn hit_ratio(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        return 0.0;
    }
    let ratio = hits as f64 / total as f64 * 100.0;
    (ratio * 100.0).round() / 100.0
}

// == Stats Snapshot ==
/// Read model of the counters at one instant.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatsSnapshot {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals
    pub misses: u64,
    /// hits / (hits + misses) as a percentage, two decimals
    pub hit_ratio: f64,
    /// Cumulative backend operation time in seconds
    pub op_time_seconds: f64,
}

// == Backend Info ==
/// Live metrics reported by the backend itself, present only while connected.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackendInfo {
    /// Human-readable memory usage (e.g. "1.04M")
    pub memory_used: String,
    /// Number of clients connected to the backend
    pub connected_clients: u64,
    /// Backend uptime in seconds
    pub uptime_seconds: u64,
    /// Number of keys under this tenant's namespace
    pub total_keys: u64,
}

impl BackendInfo {
    /// Parses the fields this crate reports out of an INFO response.
    ///
    /// Unknown or absent fields degrade to empty/zero rather than failing;
    /// the INFO format is line-oriented `name:value` with `#` section
    /// headers.
    pub fn from_info(info: &str, total_keys: u64) -> Self {
        let mut memory_used = String::new();
        let mut connected_clients = 0;
        let mut uptime_seconds = 0;

        for line in info.lines() {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            match name {
                "used_memory_human" => memory_used = value.trim().to_string(),
                "connected_clients" => connected_clients = value.trim().parse().unwrap_or(0),
                "uptime_in_seconds" => uptime_seconds = value.trim().parse().unwrap_or(0),
                _ => {}
            }
        }

        Self {
            memory_used,
            connected_clients,
            uptime_seconds,
            total_keys,
        }
    }
}

// == Stats Report ==
/// Snapshot merged with backend-reported metrics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    #[serde(flatten)]
    pub snapshot: StatsSnapshot,
    /// Present only when the store is connected
    pub backend: Option<BackendInfo>,
}
