//! API Handlers
//!
//! HTTP request handlers for each ops endpoint. Each handler builds keys
//! through the shared [`KeyBuilder`], resolves TTLs through the shared
//! [`TtlPolicy`], and leans on the store's fail-soft contract: a degraded
//! backend shows up as `stored: false` / `removed: 0` responses, never as a
//! handler crash.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{
    ChangeEvent, ContentKind, InvalidationEngine, KeyBuilder, RedisStore, TtlPolicy,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    requests::parse_identifier, CacheCategories, DeleteResponse, FlushResponse, GetResponse,
    HealthResponse, InvalidateResponse, MultiGetRequest, MultiGetResponse, SetRequest,
    SetResponse, StatsResponse, WarmRequest, WarmResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The single store instance this process owns
    pub store: Arc<RedisStore>,
    /// Key constructor for this tenant and schema version
    pub keys: KeyBuilder,
    /// Per-kind TTL policy
    pub ttl: TtlPolicy,
    /// Change-event translator
    pub engine: InvalidationEngine,
    /// Enabled cache categories, surfaced in stats
    pub categories: CacheCategories,
}

impl AppState {
    /// Wires the state around an existing store.
    pub fn new(store: Arc<RedisStore>, config: &Config) -> Self {
        let keys = KeyBuilder::from_config(config);
        Self {
            engine: InvalidationEngine::new(keys, Arc::clone(&store)),
            store,
            keys,
            ttl: TtlPolicy::from_config(config),
            categories: CacheCategories::from(config),
        }
    }

    /// Creates a state with a fresh, not-yet-connected store.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(RedisStore::new(config)), config)
    }
}

/// Handler for PUT /set
///
/// Stores one value under a (kind, id) address with policy-resolved TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let key = state.keys.key(req.kind, &req.identifier());
    let ttl = state.ttl.resolve(req.kind, req.ttl);
    let stored = state.store.set(&key, &req.value, ttl).await;

    Ok(Json(SetResponse::new(key, stored)))
}

/// Handler for GET /get/:kind/:id
///
/// Retrieves one value; a miss (including a degraded backend) is a 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    let kind = parse_kind(&kind)?;
    let key = state.keys.key(kind, &parse_identifier(&id));

    match state.store.get(&key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:kind/:id
///
/// Deletes one key. Idempotent: deleting an absent key reports
/// `removed: false` rather than an error.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let kind = parse_kind(&kind)?;
    let key = state.keys.key(kind, &parse_identifier(&id));
    let removed = state.store.delete(&key).await;

    Ok(Json(DeleteResponse::new(key, removed)))
}

/// Handler for POST /mget
///
/// Bulk read; absent keys are omitted from the response map.
pub async fn mget_handler(
    State(state): State<AppState>,
    Json(req): Json<MultiGetRequest>,
) -> Json<MultiGetResponse> {
    let keys: Vec<String> = req
        .entries
        .iter()
        .map(|r| state.keys.key(r.kind, &r.identifier()))
        .collect();
    let found = state.store.get_multi(&keys).await;

    Json(MultiGetResponse { found })
}

/// Handler for POST /warm
///
/// Bulk write as a single pipeline, for reindex-style warm-ups.
pub async fn warm_handler(
    State(state): State<AppState>,
    Json(req): Json<WarmRequest>,
) -> Result<Json<WarmResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let entries: Vec<(String, serde_json::Value, u64)> = req
        .entries
        .iter()
        .map(|e| {
            (
                state.keys.key(e.kind, &e.identifier()),
                e.value.clone(),
                state.ttl.resolve(e.kind, e.ttl),
            )
        })
        .collect();
    let stored = state.store.set_multi(&entries).await;

    Ok(Json(WarmResponse {
        entries: entries.len(),
        stored,
    }))
}

/// Handler for POST /flush
///
/// Whole-namespace flush for this tenant, across schema versions.
pub async fn flush_handler(State(state): State<AppState>) -> Json<FlushResponse> {
    let removed = state
        .store
        .delete_by_pattern(&state.keys.namespace_pattern())
        .await;

    Json(FlushResponse { removed })
}

/// Handler for POST /invalidate
///
/// Accepts a typed change event and runs its invalidation plan.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(event): Json<ChangeEvent>,
) -> Json<InvalidateResponse> {
    let removed = state.engine.handle(&event).await;
    Json(InvalidateResponse { removed })
}

/// Handler for GET /stats
///
/// Counters merged with live backend metrics when connected.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let report = state
        .store
        .stats_report(&state.keys.namespace_pattern())
        .await;

    Json(StatsResponse {
        report,
        categories: state.categories,
    })
}

/// Handler for GET /health
///
/// Liveness probe; a degraded backend is still a 200, the body says so.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.store.is_connected().await;
    Json(HealthResponse::from_probe(connected))
}

fn parse_kind(segment: &str) -> Result<ContentKind> {
    ContentKind::parse(segment)
        .ok_or_else(|| CacheError::InvalidRequest(format!("Unknown content kind: {}", segment)))
}
