//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies. Stats are served
//! straight from [`crate::cache::CacheStats`].

use serde::Serialize;

/// Response body for a write that created a key (201)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    pub ok: bool,
    pub admitted: bool,
}

impl SetResponse {
    pub fn admitted() -> Self {
        Self {
            ok: true,
            admitted: true,
        }
    }
}

/// Response body for a write refused by admission control (507)
#[derive(Debug, Clone, Serialize)]
pub struct RejectedResponse {
    pub ok: bool,
    pub admitted: bool,
    /// Always `admission-rejected`
    pub reason: String,
}

impl RejectedResponse {
    pub fn admission_rejected() -> Self {
        Self {
            ok: false,
            admitted: false,
            reason: "admission-rejected".to_string(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            ok: true,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
    /// Extra context, only set for internal failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_response_serialize() {
        let json = serde_json::to_value(SetResponse::admitted()).unwrap();
        assert_eq!(json, json!({"ok": true, "admitted": true}));
    }

    #[test]
    fn test_rejected_response_serialize() {
        let json = serde_json::to_value(RejectedResponse::admission_rejected()).unwrap();
        assert_eq!(
            json,
            json!({"ok": false, "admitted": false, "reason": "admission-rejected"})
        );
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_value(HealthResponse::healthy()).unwrap();
        assert_eq!(json["ok"], true);
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_error_response_serialize() {
        let json = serde_json::to_value(ErrorResponse::new("not found")).unwrap();
        assert_eq!(json, json!({"error": "not found"}));
    }

    #[test]
    fn test_error_response_with_detail() {
        let json = serde_json::to_value(ErrorResponse::new("internal").with_detail("boom")).unwrap();
        assert_eq!(json, json!({"error": "internal", "detail": "boom"}));
    }
}
