//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Invalid values never abort startup; they fall back to defaults here and, for
/// unreachable backends, surface as a failed `connect()`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis server hostname or IP
    pub redis_host: String,
    /// Redis server port
    pub redis_port: u16,
    /// Optional Redis AUTH password
    pub redis_password: Option<String>,
    /// Redis logical database index
    pub redis_database: i64,
    /// Connect timeout in seconds
    pub connect_timeout: u64,
    /// Per-command read timeout in seconds
    pub read_timeout: u64,
    /// Keep the backend connection across requests
    pub redis_persistent: bool,
    /// Schema version segment baked into every key (bumped on framework upgrades)
    pub schema_version: u32,
    /// Tenant/site identifier for multi-tenant deployments
    pub tenant: u64,
    /// TTL in seconds for product and product-derived entries
    pub product_ttl: u64,
    /// TTL in seconds for category/tag/terms entries
    pub category_ttl: u64,
    /// TTL in seconds for cart entries
    pub cart_ttl: u64,
    /// TTL in seconds for session and customer entries
    pub session_ttl: u64,
    /// TTL in seconds for transient entries
    pub transient_ttl: u64,
    /// Log every cache operation
    pub debug_mode: bool,
    /// Object (product/category/query) caching enabled
    pub enable_object_cache: bool,
    /// Session caching enabled
    pub enable_session_cache: bool,
    /// Transient caching enabled
    pub enable_transient_cache: bool,
    /// Full-page caching enabled
    pub enable_full_page_cache: bool,
    /// HTTP port for the ops API
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_HOST` - Redis hostname (default: 127.0.0.1)
    /// - `REDIS_PORT` - Redis port (default: 6379)
    /// - `REDIS_PASSWORD` - Redis password (default: none)
    /// - `REDIS_DATABASE` - Redis database index (default: 0)
    /// - `CONNECT_TIMEOUT` - Connect timeout in seconds (default: 5)
    /// - `READ_TIMEOUT` - Read timeout in seconds (default: 5)
    /// - `REDIS_PERSISTENT` - Persistent connection flag (default: false)
    /// - `SCHEMA_VERSION` - Key schema version segment (default: 1)
    /// - `TENANT_ID` - Tenant identifier (default: 1)
    /// - `PRODUCT_TTL`, `CATEGORY_TTL`, `CART_TTL`, `SESSION_TTL`,
    ///   `TRANSIENT_TTL` - Per-kind TTLs in seconds
    /// - `DEBUG_MODE` - Per-operation logging (default: false)
    /// - `ENABLE_OBJECT_CACHE`, `ENABLE_SESSION_CACHE`,
    ///   `ENABLE_TRANSIENT_CACHE`, `ENABLE_FULL_PAGE_CACHE` - Category flags
    /// - `SERVER_PORT` - Ops API port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_host: env::var("REDIS_HOST").unwrap_or(defaults.redis_host),
            redis_port: parse_env("REDIS_PORT", defaults.redis_port),
            redis_password: env::var("REDIS_PASSWORD").ok().filter(|p| !p.is_empty()),
            redis_database: parse_env("REDIS_DATABASE", defaults.redis_database),
            connect_timeout: parse_env("CONNECT_TIMEOUT", defaults.connect_timeout),
            read_timeout: parse_env("READ_TIMEOUT", defaults.read_timeout),
            redis_persistent: parse_env("REDIS_PERSISTENT", defaults.redis_persistent),
            schema_version: parse_env("SCHEMA_VERSION", defaults.schema_version),
            tenant: parse_env("TENANT_ID", defaults.tenant),
            product_ttl: parse_env("PRODUCT_TTL", defaults.product_ttl),
            category_ttl: parse_env("CATEGORY_TTL", defaults.category_ttl),
            cart_ttl: parse_env("CART_TTL", defaults.cart_ttl),
            session_ttl: parse_env("SESSION_TTL", defaults.session_ttl),
            transient_ttl: parse_env("TRANSIENT_TTL", defaults.transient_ttl),
            debug_mode: parse_env("DEBUG_MODE", defaults.debug_mode),
            enable_object_cache: parse_env("ENABLE_OBJECT_CACHE", defaults.enable_object_cache),
            enable_session_cache: parse_env("ENABLE_SESSION_CACHE", defaults.enable_session_cache),
            enable_transient_cache: parse_env(
                "ENABLE_TRANSIENT_CACHE",
                defaults.enable_transient_cache,
            ),
            enable_full_page_cache: parse_env(
                "ENABLE_FULL_PAGE_CACHE",
                defaults.enable_full_page_cache,
            ),
            server_port: parse_env("SERVER_PORT", defaults.server_port),
        }
    }

    /// Connect timeout as a Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Read timeout as a Duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            redis_password: None,
            redis_database: 0,
            connect_timeout: 5,
            read_timeout: 5,
            redis_persistent: false,
            schema_version: 1,
            tenant: 1,
            product_ttl: 86_400,
            category_ttl: 86_400,
            cart_ttl: 3_600,
            session_ttl: 86_400,
            transient_ttl: 86_400,
            debug_mode: false,
            enable_object_cache: true,
            enable_session_cache: true,
            enable_transient_cache: true,
            enable_full_page_cache: false,
            server_port: 3000,
        }
    }
}

/// Parses an environment variable, falling back to the default on absence
/// or parse failure.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
