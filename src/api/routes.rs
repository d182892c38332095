//! API Routes
//!
//! Configures the Axum router with all ops endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, flush_handler, get_handler, health_handler, invalidate_handler, mget_handler,
    set_handler, stats_handler, warm_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store one value under a (kind, id) address
/// - `GET /get/:kind/:id` - Retrieve a value
/// - `DELETE /del/:kind/:id` - Delete a key
/// - `POST /mget` - Bulk read
/// - `POST /warm` - Bulk pipelined write
/// - `POST /flush` - Whole-namespace flush
/// - `POST /invalidate` - Run a change event's invalidation plan
/// - `GET /stats` - Counters merged with backend metrics
/// - `GET /health` - Liveness probe
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:kind/:id", get(get_handler))
        .route("/del/:kind/:id", delete(delete_handler))
        .route("/mget", post(mget_handler))
        .route("/warm", post(warm_handler))
        .route("/flush", post(flush_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
