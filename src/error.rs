//! Error types for the cache server
//!
//! Provides unified error handling for the HTTP adapter using thiserror. The
//! cache engine itself never fails; absence and rejection are plain values
//! that handlers turn into these errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::{ErrorResponse, RejectedResponse};

// == Cache Error Enum ==
/// Unified error type for the HTTP adapter.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent or expired, or an unknown route
    #[error("not found")]
    NotFound,

    /// Invalid request data
    #[error("{0}")]
    InvalidRequest(String),

    /// New key refused by admission control
    #[error("admission rejected")]
    AdmissionRejected,

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl CacheError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::NotFound => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::AdmissionRejected => StatusCode::INSUFFICIENT_STORAGE,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            CacheError::NotFound => (status, Json(ErrorResponse::new("not found"))).into_response(),
            CacheError::InvalidRequest(msg) => (status, Json(ErrorResponse::new(msg))).into_response(),
            CacheError::AdmissionRejected => {
                (status, Json(RejectedResponse::admission_rejected())).into_response()
            }
            CacheError::Internal(detail) => (
                status,
                Json(ErrorResponse::new("internal").with_detail(detail)),
            )
                .into_response(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn render(error: CacheError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let (status, body) = render(CacheError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "not found"}));
    }

    #[tokio::test]
    async fn test_invalid_request_response() {
        let (status, body) = render(CacheError::InvalidRequest("key required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "key required"}));
    }

    #[tokio::test]
    async fn test_admission_rejected_response() {
        let (status, body) = render(CacheError::AdmissionRejected).await;
        assert_eq!(status, StatusCode::INSUFFICIENT_STORAGE);
        assert_eq!(
            body,
            json!({"ok": false, "admitted": false, "reason": "admission-rejected"})
        );
    }

    #[tokio::test]
    async fn test_internal_response() {
        let (status, body) = render(CacheError::Internal("boom".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "internal", "detail": "boom"}));
    }
}
