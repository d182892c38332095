//! API Module
//!
//! HTTP handlers and routing for the ops REST API, the thin collaborator
//! surface over the cache core.
//!
//! # Endpoints
//! - `PUT /set` - Store one value under a (kind, id) address
//! - `GET /get/:kind/:id` - Retrieve a value by address
//! - `DELETE /del/:kind/:id` - Delete a key
//! - `POST /mget` - Bulk read
//! - `POST /warm` - Bulk pipelined write
//! - `POST /flush` - Whole-namespace flush
//! - `POST /invalidate` - Run a change event's invalidation plan
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Liveness probe

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
