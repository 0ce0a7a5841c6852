//! Cache Value Module
//!
//! Defines the payload type stored in the cache.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

// == Cache Value ==
/// A stored payload.
///
/// Scalars get their own variants so the size estimator can account for them
/// without serializing; arrays and objects are kept as a structured blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    Structured(Value),
}

impl CacheValue {
    // == To JSON ==
    /// Converts the payload into a `serde_json::Value`.
    pub fn to_json(&self) -> Value {
        match self {
            CacheValue::Null => Value::Null,
            CacheValue::Bool(b) => Value::Bool(*b),
            CacheValue::Number(n) => Value::Number(n.clone()),
            CacheValue::Text(s) => Value::String(s.clone()),
            CacheValue::Structured(v) => v.clone(),
        }
    }
}

impl From<Value> for CacheValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CacheValue::Null,
            Value::Bool(b) => CacheValue::Bool(b),
            Value::Number(n) => CacheValue::Number(n),
            Value::String(s) => CacheValue::Text(s),
            other => CacheValue::Structured(other),
        }
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::Text(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::Text(value.to_string())
    }
}

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        CacheValue::Bool(value)
    }
}

impl From<i64> for CacheValue {
    fn from(value: i64) -> Self {
        CacheValue::Number(value.into())
    }
}

impl From<f64> for CacheValue {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(CacheValue::Number)
            .unwrap_or(CacheValue::Null)
    }
}

/// Text renders raw; everything else renders as compact JSON.
impl fmt::Display for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheValue::Text(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_picks_scalar_variants() {
        assert_eq!(CacheValue::from(json!(null)), CacheValue::Null);
        assert_eq!(CacheValue::from(json!(true)), CacheValue::Bool(true));
        assert_eq!(CacheValue::from(json!(3)), CacheValue::Number(3.into()));
        assert_eq!(CacheValue::from(json!("hi")), CacheValue::Text("hi".to_string()));
        assert!(matches!(
            CacheValue::from(json!({"a": 1})),
            CacheValue::Structured(_)
        ));
        assert!(matches!(CacheValue::from(json!([1, 2])), CacheValue::Structured(_)));
    }

    #[test]
    fn test_serializes_without_tag() {
        let text = serde_json::to_string(&CacheValue::from("y")).unwrap();
        assert_eq!(text, r#""y""#);

        let blob = serde_json::to_string(&CacheValue::from(json!({"a": [1, 2]}))).unwrap();
        assert_eq!(blob, r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_display_text_is_raw() {
        assert_eq!(CacheValue::from("plain").to_string(), "plain");
        assert_eq!(CacheValue::from(7i64).to_string(), "7");
        assert_eq!(CacheValue::Null.to_string(), "null");
    }

    #[test]
    fn test_nan_becomes_null() {
        assert_eq!(CacheValue::from(f64::NAN), CacheValue::Null);
    }
}
