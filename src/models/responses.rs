//! Response DTOs for the ops API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::cache::StatsReport;
use crate::config::Config;

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// The fully-qualified key that was addressed
    pub key: String,
    /// Whether the write landed
    pub stored: bool,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, stored: bool) -> Self {
        Self {
            key: key.into(),
            stored,
        }
    }
}

/// Response body for the GET operation (GET /get/:kind/:id)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The fully-qualified key that was read
    pub key: String,
    /// The stored value
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:kind/:id)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// The fully-qualified key that was addressed
    pub key: String,
    /// True only if a key was actually removed
    pub removed: bool,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, removed: bool) -> Self {
        Self {
            key: key.into(),
            removed,
        }
    }
}

/// Response body for the bulk read operation (POST /mget)
#[derive(Debug, Clone, Serialize)]
pub struct MultiGetResponse {
    /// Values found, keyed by fully-qualified key; absent keys are omitted
    pub found: HashMap<String, Value>,
}

/// Response body for the bulk write operation (POST /warm)
#[derive(Debug, Clone, Serialize)]
pub struct WarmResponse {
    /// Number of entries in the batch
    pub entries: usize,
    /// Whether the whole batch applied
    pub stored: bool,
}

/// Response body for the flush operation (POST /flush)
#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    /// Number of keys removed across the tenant namespace
    pub removed: u64,
}

/// Response body for the invalidate operation (POST /invalidate)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Number of keys removed by the event's plan
    pub removed: u64,
}

/// Which cache categories the deployment has switched on.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheCategories {
    pub object: bool,
    pub session: bool,
    pub transient: bool,
    pub full_page: bool,
}

impl From<&Config> for CacheCategories {
    fn from(config: &Config) -> Self {
        Self {
            object: config.enable_object_cache,
            session: config.enable_session_cache,
            transient: config.enable_transient_cache,
            full_page: config.enable_full_page_cache,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Counters merged with backend metrics when connected
    #[serde(flatten)]
    pub report: StatsReport,
    /// Enabled cache categories
    pub categories: CacheCategories,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" when the backend answers the liveness probe, else "degraded"
    pub status: String,
    /// Result of the liveness probe
    pub connected: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Builds the health report for a probe result.
    pub fn from_probe(connected: bool) -> Self {
        Self {
            status: if connected { "healthy" } else { "degraded" }.to_string(),
            connected,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
