//! Storefront Cache - A namespaced Redis cache core for e-commerce stores
//!
//! Provides deterministic key construction with version and tenant isolation,
//! per-kind TTL policy, a fail-soft Redis store with hit/miss/latency
//! accounting, and typed change-event invalidation.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{
    ChangeEvent, ContentKind, Identifier, InvalidationEngine, KeyBuilder, RedisStore, TtlPolicy,
};
pub use config::Config;
pub use tasks::DeferredInvalidator;
