//! Cache Store Module
//!
//! The get/set/delete/bulk contract against the Redis backend. Owns the
//! single backend connection, converts every internal failure into a
//! well-defined sentinel (fail-soft), and feeds the stats counters on every
//! operation.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use redis::aio::MultiplexedConnection;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::stats::{BackendInfo, CacheStats, StatsReport, StatsSnapshot};
use crate::config::Config;
use crate::error::{CacheError, Result};

/// SCAN page size for pattern enumeration.
const SCAN_BATCH: usize = 100;

/// Connection state guarded together with the read timeout it was dialed with.
struct StoreState {
    conn: Option<MultiplexedConnection>,
    read_timeout: Duration,
}

impl std::fmt::Debug for StoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreState")
            .field("connected", &self.conn.is_some())
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

// == Redis Store ==
/// Fail-soft cache store over a single multiplexed Redis connection.
///
/// Every public operation has a total, defined return value for every input,
/// including "not connected": failures are logged and mapped to the
/// miss/false/0/empty sentinel, never raised to the caller.
#[derive(Debug)]
pub struct RedisStore {
    state: RwLock<StoreState>,
    stats: CacheStats,
}

impl RedisStore {
    // == Constructor ==
    /// Creates a disconnected store. Call [`connect`](Self::connect) before use;
    /// operations on a disconnected store fail soft.
    pub fn new(config: &Config) -> Self {
        Self {
            state: RwLock::new(StoreState {
                conn: None,
                read_timeout: config.read_timeout(),
            }),
            stats: CacheStats::new(),
        }
    }

    // == Connect ==
    /// Dials the backend described by `config`, replacing any existing
    /// connection. Returns whether the store ended up connected.
    ///
    /// Configuration changes reconnect through this same call; connection
    /// errors leave the store disconnected and are only visible in the log.
    pub async fn connect(&self, config: &Config) -> bool {
        match self.dial(config).await {
            Ok(conn) => {
                let mut state = self.state.write().await;
                state.conn = Some(conn);
                state.read_timeout = config.read_timeout();
                info!(
                    url = %redact_url(&connection_url(config)),
                    persistent = config.redis_persistent,
                    "connected to cache backend"
                );
                true
            }
            Err(e) => {
                self.state.write().await.conn = None;
                warn!(error = %e, "cache backend connection failed");
                false
            }
        }
    }

    /// Drops the backend connection. Subsequent operations fail soft.
    pub async fn disconnect(&self) {
        self.state.write().await.conn = None;
        info!("cache backend connection dropped");
    }

    async fn dial(&self, config: &Config) -> Result<MultiplexedConnection> {
        let url = connection_url(config);
        let client = redis::Client::open(url.as_str())
            .map_err(|e| CacheError::Connection(format!("invalid backend address: {}", e)))?;

        let conn = tokio::time::timeout(
            config.connect_timeout(),
            client.get_multiplexed_tokio_connection(),
        )
        .await
        .map_err(|_| {
            CacheError::Timeout(format!(
                "connect to {}:{} exceeded {}s",
                config.redis_host, config.redis_port, config.connect_timeout
            ))
        })?
        .map_err(|e| CacheError::Connection(e.to_string()))?;

        // Verify the link (and any AUTH/SELECT in the URL) before accepting it.
        let mut probe = conn.clone();
        let pong: String =
            tokio::time::timeout(config.read_timeout(), redis::cmd("PING").query_async(&mut probe))
                .await
                .map_err(|_| CacheError::Timeout("liveness probe".to_string()))?
                .map_err(|e| CacheError::Connection(format!("liveness probe failed: {}", e)))?;
        if pong != "PONG" {
            return Err(CacheError::Connection(format!(
                "unexpected liveness reply: {}",
                pong
            )));
        }

        Ok(conn)
    }

    // == Liveness ==
    /// Probes the backend with PING. Any probe error reads as "not connected";
    /// this never hides the difference between a missing value and a missing
    /// backend.
    pub async fn is_connected(&self) -> bool {
        let cmd = redis::cmd("PING");
        match self.run::<String>(&cmd).await {
            Ok(pong) => pong == "PONG",
            Err(_) => false,
        }
    }

    // == Get ==
    /// Retrieves and deserializes a value. `None` is a miss: absent key,
    /// undecodable payload, backend error, or no connection.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let start = Instant::now();
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        let outcome = self.run::<Option<String>>(&cmd).await;
        self.stats.record_time(start.elapsed());

        match outcome {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    self.stats.record_hit();
                    debug!(key, "cache hit");
                    Some(value)
                }
                Err(e) => {
                    // Corrupt payloads read as a miss; callers assume any
                    // returned value is well-formed.
                    self.stats.record_miss();
                    warn!(key, error = %e, "discarding undecodable cache value");
                    None
                }
            },
            Ok(None) => {
                self.stats.record_miss();
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                self.stats.record_miss();
                warn!(key, error = %e, "cache get failed");
                None
            }
        }
    }

    // == Set ==
    /// Serializes and stores a value. `ttl` of 0 stores without expiry;
    /// anything else becomes a SETEX. Returns whether the write landed.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: u64) -> bool {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "value failed to serialize, write dropped");
                return false;
            }
        };

        let start = Instant::now();
        let mut cmd;
        if ttl > 0 {
            cmd = redis::cmd("SETEX");
            cmd.arg(key).arg(ttl).arg(payload);
        } else {
            cmd = redis::cmd("SET");
            cmd.arg(key).arg(payload);
        }
        let outcome = self.run::<()>(&cmd).await;
        self.stats.record_time(start.elapsed());

        match outcome {
            Ok(()) => {
                debug!(key, ttl, "cache set");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "cache set failed");
                false
            }
        }
    }

    // == Delete ==
    /// Removes a key. True only if a key was actually removed; deleting an
    /// absent key is a quiet false.
    pub async fn delete(&self, key: &str) -> bool {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        match self.run::<u64>(&cmd).await {
            Ok(removed) => {
                debug!(key, removed, "cache delete");
                removed > 0
            }
            Err(e) => {
                warn!(key, error = %e, "cache delete failed");
                false
            }
        }
    }

    // == Delete By Pattern ==
    /// Removes every key matching a glob pattern, returning the count.
    ///
    /// Enumerates with cursored SCAN and deletes in batches, so the caller
    /// never paginates. The scan still walks the entire keyspace under the
    /// matching prefix: O(total keys), not O(matches).
    pub async fn delete_by_pattern(&self, pattern: &str) -> u64 {
        let mut deleted: u64 = 0;
        let mut cursor: u64 = 0;

        loop {
            let mut scan = redis::cmd("SCAN");
            scan.arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH);
            let (next, keys) = match self.run::<(u64, Vec<String>)>(&scan).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(pattern, deleted, error = %e, "pattern delete aborted");
                    return deleted;
                }
            };

            if !keys.is_empty() {
                let mut del = redis::cmd("DEL");
                del.arg(&keys);
                match self.run::<u64>(&del).await {
                    Ok(removed) => deleted += removed,
                    Err(e) => {
                        warn!(pattern, deleted, error = %e, "pattern delete aborted");
                        return deleted;
                    }
                }
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern, deleted, "cache pattern delete");
        deleted
    }

    // == Get Multi ==
    /// Fetches many keys in one MGET. Absent keys are omitted from the map
    /// and counted as one miss each; present keys count one hit each.
    /// Disconnected or failed reads yield an empty map.
    pub async fn get_multi<T: DeserializeOwned>(&self, keys: &[String]) -> HashMap<String, T> {
        if keys.is_empty() {
            return HashMap::new();
        }

        let start = Instant::now();
        let mut cmd = redis::cmd("MGET");
        cmd.arg(keys);
        let outcome = self.run::<Vec<Option<String>>>(&cmd).await;
        self.stats.record_time(start.elapsed());

        let values = match outcome {
            Ok(values) => values,
            Err(e) => {
                warn!(requested = keys.len(), error = %e, "cache multi-get failed");
                return HashMap::new();
            }
        };

        let mut found = HashMap::new();
        for (key, raw) in keys.iter().zip(values) {
            match raw {
                Some(raw) => match serde_json::from_str(&raw) {
                    Ok(value) => {
                        self.stats.record_hit();
                        found.insert(key.clone(), value);
                    }
                    Err(e) => {
                        self.stats.record_miss();
                        warn!(key = %key, error = %e, "discarding undecodable cache value");
                    }
                },
                None => self.stats.record_miss(),
            }
        }
        debug!(requested = keys.len(), found = found.len(), "cache multi-get");
        found
    }

    // == Set Multi ==
    /// Stores a batch of (key, value, ttl) entries as one pipeline.
    ///
    /// True only when the whole batch applied. Best-effort: the pipeline is
    /// not a transaction, so on failure some entries may still have landed
    /// and no compensating deletes are issued.
    pub async fn set_multi<T: Serialize>(&self, entries: &[(String, T, u64)]) -> bool {
        if entries.is_empty() {
            return false;
        }

        let mut pipe = redis::pipe();
        for (key, value, ttl) in entries {
            let payload = match serde_json::to_string(value) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(key = %key, error = %e, "batch value failed to serialize, batch dropped");
                    return false;
                }
            };
            if *ttl > 0 {
                pipe.cmd("SETEX").arg(key).arg(*ttl).arg(payload).ignore();
            } else {
                pipe.cmd("SET").arg(key).arg(payload).ignore();
            }
        }

        let start = Instant::now();
        let outcome = self.run_pipe(&pipe).await;
        self.stats.record_time(start.elapsed());

        match outcome {
            Ok(()) => {
                debug!(entries = entries.len(), "cache batch set");
                true
            }
            Err(e) => {
                warn!(entries = entries.len(), error = %e, "cache batch set failed");
                false
            }
        }
    }

    // == Stats ==
    /// Point-in-time counters for this store.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Counters merged with live backend metrics. The backend half is absent
    /// when the store is disconnected or INFO fails.
    pub async fn stats_report(&self, namespace_pattern: &str) -> StatsReport {
        let backend = match self.backend_info(namespace_pattern).await {
            Ok(info) => Some(info),
            Err(e) => {
                debug!(error = %e, "backend metrics unavailable");
                None
            }
        };
        StatsReport {
            snapshot: self.stats.snapshot(),
            backend,
        }
    }

    async fn backend_info(&self, namespace_pattern: &str) -> Result<BackendInfo> {
        let cmd = redis::cmd("INFO");
        let info = self.run::<String>(&cmd).await?;
        let total_keys = self.count_keys(namespace_pattern).await?;
        Ok(BackendInfo::from_info(&info, total_keys))
    }

    /// Counts keys matching a pattern via cursored SCAN.
    async fn count_keys(&self, pattern: &str) -> Result<u64> {
        let mut total: u64 = 0;
        let mut cursor: u64 = 0;
        loop {
            let mut scan = redis::cmd("SCAN");
            scan.arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH);
            let (next, keys) = self.run::<(u64, Vec<String>)>(&scan).await?;
            total += keys.len() as u64;
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(total)
    }

    // == Internals ==
    /// Clones out the live connection, or errors if there is none.
    async fn connection(&self) -> Result<(MultiplexedConnection, Duration)> {
        let state = self.state.read().await;
        match &state.conn {
            Some(conn) => Ok((conn.clone(), state.read_timeout)),
            None => Err(CacheError::Connection("not connected".to_string())),
        }
    }

    /// Runs one command against the backend under the read timeout.
    async fn run<T: redis::FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T> {
        let (mut conn, read_timeout) = self.connection().await?;
        tokio::time::timeout(read_timeout, cmd.query_async(&mut conn))
            .await
            .map_err(|_| CacheError::Timeout("backend read".to_string()))?
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    /// Runs a pipeline against the backend under the read timeout.
    async fn run_pipe(&self, pipe: &redis::Pipeline) -> Result<()> {
        let (mut conn, read_timeout) = self.connection().await?;
        tokio::time::timeout(read_timeout, pipe.query_async(&mut conn))
            .await
            .map_err(|_| CacheError::Timeout("backend pipeline".to_string()))?
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}

/// Renders the backend URL from configuration.
fn connection_url(config: &Config) -> String {
    match &config.redis_password {
        Some(password) => format!(
            "redis://:{}@{}:{}/{}",
            password, config.redis_host, config.redis_port, config.redis_database
        ),
        None => format!(
            "redis://{}:{}/{}",
            config.redis_host, config.redis_port, config.redis_database
        ),
    }
}

/// Redacts credentials from a backend URL for logging.
fn redact_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let prefix = &url[..=colon_pos];
            let suffix = &url[at_pos..];
            return format!("{}***{}", prefix, suffix);
        }
    }
    url.to_string()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn disconnected_store() -> RedisStore {
        RedisStore::new(&Config::default())
    }

    #[tokio::test]
    async fn test_new_store_is_disconnected() {
        let store = disconnected_store();
        assert!(!store.is_connected().await);
    }

    #[tokio::test]
    async fn test_get_fails_soft_when_disconnected() {
        let store = disconnected_store();
        let value: Option<String> = store.get("store:v1:1:product:1").await;
        assert!(value.is_none());
        assert_eq!(store.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_set_fails_soft_when_disconnected() {
        let store = disconnected_store();
        assert!(!store.set("store:v1:1:product:1", &json!({"id": 1}), 60).await);
    }

    #[tokio::test]
    async fn test_delete_fails_soft_when_disconnected() {
        let store = disconnected_store();
        assert!(!store.delete("store:v1:1:product:1").await);
    }

    #[tokio::test]
    async fn test_delete_by_pattern_fails_soft_when_disconnected() {
        let store = disconnected_store();
        assert_eq!(store.delete_by_pattern("store:v1:1:product:*").await, 0);
    }

    #[tokio::test]
    async fn test_get_multi_fails_soft_when_disconnected() {
        let store = disconnected_store();
        let keys = vec!["a".to_string(), "b".to_string()];
        let found: HashMap<String, serde_json::Value> = store.get_multi(&keys).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_get_multi_empty_keys_is_empty() {
        let store = disconnected_store();
        let found: HashMap<String, serde_json::Value> = store.get_multi(&[]).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_set_multi_fails_soft_when_disconnected() {
        let store = disconnected_store();
        let entries = vec![("k".to_string(), json!(1), 60)];
        assert!(!store.set_multi(&entries).await);
    }

    #[tokio::test]
    async fn test_set_multi_empty_batch_is_false() {
        let store = disconnected_store();
        let entries: Vec<(String, serde_json::Value, u64)> = Vec::new();
        assert!(!store.set_multi(&entries).await);
    }

    #[tokio::test]
    async fn test_set_unserializable_value_is_failed_write() {
        let store = disconnected_store();
        // Non-string map keys cannot be rendered as JSON objects.
        let mut bad = HashMap::new();
        bad.insert((1u8, 2u8), "x");
        assert!(!store.set("store:v1:1:transient:bad", &bad, 60).await);
    }

    #[tokio::test]
    async fn test_stats_report_has_no_backend_when_disconnected() {
        let store = disconnected_store();
        let report = store.stats_report("store:*:1:*").await;
        assert!(report.backend.is_none());
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_backend_returns_false() {
        let store = disconnected_store();
        let config = Config {
            redis_host: "127.0.0.1".to_string(),
            redis_port: 1, // nothing listens here
            connect_timeout: 1,
            ..Config::default()
        };
        assert!(!store.connect(&config).await);
        assert!(!store.is_connected().await);
    }

    #[test]
    fn test_connection_url_without_password() {
        let config = Config::default();
        assert_eq!(connection_url(&config), "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn test_connection_url_with_password() {
        let config = Config {
            redis_password: Some("secret".to_string()),
            redis_database: 2,
            ..Config::default()
        };
        assert_eq!(connection_url(&config), "redis://:secret@127.0.0.1:6379/2");
    }

    #[test]
    fn test_redact_url_with_password() {
        assert_eq!(
            redact_url("redis://:secret@127.0.0.1:6379/0"),
            "redis://:***@127.0.0.1:6379/0"
        );
    }

    #[test]
    fn test_redact_url_without_password() {
        assert_eq!(
            redact_url("redis://127.0.0.1:6379/0"),
            "redis://127.0.0.1:6379/0"
        );
    }
}
