//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint, plus the latency
//! middleware and the panic responder wired in by the router.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{MatchedPath, Path, Query, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::cache::{Cache, CacheStats, SetOutcome};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::metrics::{Metrics, CONTENT_TYPE};
use crate::models::{value_from_body, HealthResponse, SetQuery, SetResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache engine
    pub cache: Arc<Cache>,
    /// Process-wide metrics registry
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Creates a new AppState over an existing cache and registry.
    pub fn new(cache: Arc<Cache>, metrics: Arc<Metrics>) -> Self {
        Self { cache, metrics }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the cache from the Config, which starts its sweeper; must run
    /// inside a Tokio runtime.
    pub fn from_config(config: &Config) -> Self {
        let cache = Cache::new(config.cache_options());
        Self::new(Arc::new(cache), Arc::new(Metrics::new()))
    }
}

const KEY_REQUIRED: &str = "key required";

fn require_key(key: String) -> Result<String> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest(KEY_REQUIRED.to_string()));
    }
    Ok(key)
}

/// Builds the `Location` path for a key, percent-encoding each segment.
fn location_for(key: &str) -> String {
    let segments: Vec<_> = key.split('/').map(urlencoding::encode).collect();
    format!("/v1/cache/{}", segments.join("/"))
}

/// Handler for GET /v1/cache/*key
///
/// Returns the stored value as JSON with `X-Cache-Hit`, plus
/// `X-TTL-Remaining` (milliseconds) when the key expires.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response> {
    let key = require_key(key)?;
    let value = state.cache.get(&key).ok_or(CacheError::NotFound)?;

    let mut headers = HeaderMap::new();
    if let Some(remaining) = state.cache.ttl_remaining_ms(&key) {
        headers.insert("x-ttl-remaining", HeaderValue::from(remaining));
    }
    headers.insert("x-cache-hit", HeaderValue::from_static("true"));

    Ok((headers, Json(value)).into_response())
}

/// Handler for PUT and POST /v1/cache/*key
///
/// 201 with `Location` for a new key, 204 for a replaced one, 507 when
/// admission control turns the key away.
pub async fn set_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SetQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let key = require_key(key)?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let value = value_from_body(content_type, &body);

    match state.cache.set(key.clone(), value, query.set_options()) {
        SetOutcome::Created => {
            let location = HeaderValue::from_str(&location_for(&key))
                .map_err(|err| CacheError::Internal(err.to_string()))?;
            Ok((
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(SetResponse::admitted()),
            )
                .into_response())
        }
        SetOutcome::Updated => Ok(StatusCode::NO_CONTENT.into_response()),
        SetOutcome::Rejected => Err(CacheError::AdmissionRejected),
    }
}

/// Handler for DELETE /v1/cache/*key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    let key = require_key(key)?;
    if state.cache.del(&key) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(CacheError::NotFound)
    }
}

/// Handler for any method on /v1/cache/ with no key.
pub async fn missing_key_handler() -> CacheError {
    CacheError::InvalidRequest(KEY_REQUIRED.to_string())
}

/// Handler for GET /v1/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics.render(&state.cache.stats());
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Fallback for unknown paths and unsupported methods.
pub async fn not_found_handler() -> CacheError {
    CacheError::NotFound
}

/// Records each matched request's latency under its method and route
/// template.
pub async fn track_latency(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    state.metrics.observe_http(&method, &route, start.elapsed());
    response
}

/// Turns a handler panic into the internal-error response.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(detail = %detail, "Handler panicked");
    CacheError::Internal(detail).into_response()
}
