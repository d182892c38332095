//! Request and Response models for the ops API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{KeyRef, MultiGetRequest, SetRequest, WarmEntry, WarmRequest};
pub use responses::{
    CacheCategories, DeleteResponse, ErrorResponse, FlushResponse, GetResponse, HealthResponse,
    InvalidateResponse, MultiGetResponse, SetResponse, StatsResponse, WarmResponse,
};
