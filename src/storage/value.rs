//! Stored Values
//!
//! Every entry in the datastore holds a [`Value`]: a small closed set of
//! types that can be rendered on the wire and encoded into a snapshot.
//!
//! ## Snapshot Encoding
//!
//! Values are serialized as adjacently tagged objects so the snapshot schema
//! stays readable from any language:
//!
//! ```text
//! {"type": "string",  "value": "hello"}
//! {"type": "integer", "value": 42}
//! {"type": "float",   "value": 2.5}
//! {"type": "bytes",   "value": [0, 159, 146]}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value stored in the datastore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// UTF-8 text. Everything written over the wire lands here.
    String(String),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// Opaque binary payload
    Bytes(Vec<u8>),
}

/// Textual rendering used in protocol replies.
///
/// Binary payloads are rendered lossily; invalid UTF-8 becomes U+FFFD.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::from("hello").to_string(), "hello");
        assert_eq!(Value::from(42i64).to_string(), "42");
        assert_eq!(Value::from(-7i64).to_string(), "-7");
        assert_eq!(Value::from(2.5f64).to_string(), "2.5");
        assert_eq!(Value::from(b"raw".to_vec()).to_string(), "raw");
    }

    #[test]
    fn test_display_invalid_utf8_bytes() {
        let value = Value::Bytes(vec![b'a', 0xff, b'b']);
        assert_eq!(value.to_string(), "a\u{fffd}b");
    }

    #[test]
    fn test_snapshot_tagging() {
        let json = serde_json::to_string(&Value::from(42i64)).unwrap();
        assert_eq!(json, r#"{"type":"integer","value":42}"#);

        let json = serde_json::to_string(&Value::from("hi")).unwrap();
        assert_eq!(json, r#"{"type":"string","value":"hi"}"#);

        let parsed: Value = serde_json::from_str(r#"{"type":"bytes","value":[1,2,3]}"#).unwrap();
        assert_eq!(parsed, Value::Bytes(vec![1, 2, 3]));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let parsed: Result<Value, _> = serde_json::from_str(r#"{"type":"list","value":[]}"#);
        assert!(parsed.is_err());
    }
}
