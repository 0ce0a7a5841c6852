//! Request DTOs for the cache server API
//!
//! Defines the query parameters and body decoding for writes to
//! `PUT|POST /v1/cache/{key}`.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{parse_ttl_ms, CacheValue, SetOptions};

/// Query string of a cache write (`?ttl=<millis>`)
///
/// `ttl` is kept as a string so that a malformed value degrades to "no TTL"
/// instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetQuery {
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl: Option<String>,
}

impl SetQuery {
    /// Parsed TTL in milliseconds, read from the leading digits. Missing,
    /// digitless, negative and zero all mean none.
    pub fn ttl_ms(&self) -> Option<u64> {
        self.ttl.as_deref().and_then(parse_ttl_ms)
    }

    pub fn set_options(&self) -> SetOptions {
        match self.ttl_ms() {
            Some(ttl) => SetOptions::new().with_ttl_ms(ttl),
            None => SetOptions::new(),
        }
    }
}

/// Decodes a write body into the value to store.
///
/// JSON bodies contribute their `value` field when it is present and not
/// null, otherwise the whole document. Everything else, including JSON that
/// fails to parse, is stored as the raw body text.
pub fn value_from_body(content_type: Option<&str>, body: &[u8]) -> CacheValue {
    let raw = String::from_utf8_lossy(body);
    let is_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);
    if !is_json {
        return CacheValue::from(raw.into_owned());
    }

    match serde_json::from_str::<Value>(&raw) {
        Ok(document) => match document.get("value") {
            Some(inner) if !inner.is_null() => CacheValue::from(inner.clone()),
            _ => CacheValue::from(document),
        },
        Err(_) => CacheValue::from(raw.into_owned()),
    }
}
