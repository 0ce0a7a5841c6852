//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, metrics_handler, missing_key_handler,
    not_found_handler, panic_response, set_handler, stats_handler, track_latency, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /v1/stats` - Cache statistics snapshot
/// - `GET /metrics` - Prometheus exposition
/// - `GET|PUT|POST|DELETE /v1/cache/*key` - Read, write and delete entries
/// - `/v1/cache/` - 400 `{"error":"key required"}` for any method
///
/// Unknown paths and unsupported methods answer 404 `{"error":"not found"}`.
///
/// # Middleware
/// - Latency: observes matched routes into `zencache_http_seconds`
/// - Panics: converted to 500 `{"error":"internal","detail":...}`
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/stats", get(stats_handler))
        .route("/metrics", get(metrics_handler))
        .route("/v1/cache/", any(missing_key_handler))
        .route(
            "/v1/cache/*key",
            get(get_handler)
                .put(set_handler)
                .post(set_handler)
                .delete(delete_handler)
                .fallback(not_found_handler),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), track_latency))
        .fallback(not_found_handler)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
