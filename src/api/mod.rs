//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /v1/stats` - Get cache statistics
//! - `GET /metrics` - Prometheus metrics
//! - `GET /v1/cache/*key` - Retrieve a value by key
//! - `PUT|POST /v1/cache/*key?ttl=ms` - Store a value
//! - `DELETE /v1/cache/*key` - Delete a key

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
