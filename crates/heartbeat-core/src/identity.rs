//! Stable probe fingerprints.
//!
//! A probe's identity is the SHA-256 of its user-supplied fields serialized
//! as canonical JSON: object keys sorted at every depth, `", "` and `": "`
//! separators, and every character outside printable ASCII written as a
//! `\uXXXX` escape. State files written by earlier heartbeat releases use
//! the same encoding, so their history carries over.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 fingerprint of a probe's configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeIdentity(String);

impl ProbeIdentity {
    /// Fingerprint the raw fields of a probe entry.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let mut canonical = String::new();
        write_canonical_object(fields, &mut canonical);
        ProbeIdentity(hex::encode(Sha256::digest(canonical.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProbeIdentity {
    fn from(value: String) -> Self {
        ProbeIdentity(value)
    }
}

impl From<&str> for ProbeIdentity {
    fn from(value: &str) -> Self {
        ProbeIdentity(value.to_string())
    }
}

impl fmt::Display for ProbeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialize a JSON value in the canonical form used for hashing.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_canonical_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_ascii_string(s, out),
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_canonical_object(map: &Map<String, Value>, out: &mut String) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_ascii_string(key, out);
        out.push_str(": ");
        write_canonical(value, out);
    }
    out.push('}');
}

fn write_ascii_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{unit:04x}");
                }
            }
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn canonical_json_sorts_nested_keys() {
        let value = json!({
            "url": "http://localhost",
            "headers": { "x-b": "2", "x-a": "1" },
            "name": "web",
        });
        assert_eq!(
            canonical_json(&value),
            r#"{"headers": {"x-a": "1", "x-b": "2"}, "name": "web", "url": "http://localhost"}"#
        );
    }

    #[test]
    fn canonical_json_escapes_non_ascii() {
        let value = json!({ "msg": "caf\u{e9} \u{1F600}\n\"q\"" });
        assert_eq!(
            canonical_json(&value),
            r#"{"msg": "caf\u00e9 \ud83d\ude00\n\"q\""}"#
        );
    }

    #[test]
    fn identity_matches_existing_state_files() {
        let simple = object(json!({ "name": "db", "command": "true" }));
        assert_eq!(
            ProbeIdentity::from_fields(&simple).as_str(),
            "897a7649aa27507b2b3f8acfbfdf0e3540550b3a252673fd6e83f7e91ca0d981"
        );

        let nested = object(json!({
            "name": "caf\u{e9} \u{1F600}",
            "port": 5432,
            "headers": { "b": 1, "a": [1, 2.5, null, true] },
        }));
        assert_eq!(
            ProbeIdentity::from_fields(&nested).as_str(),
            "7bfb9a6a1ec484580bcef8447317b50c2d73b60f3bc6c9162f136fc293a33993"
        );
    }

    #[test]
    fn identity_ignores_key_order() {
        let a: Map<String, Value> =
            serde_json::from_str(r#"{"name":"db","host":"10.0.0.5","port":5432}"#).unwrap();
        let b: Map<String, Value> =
            serde_json::from_str(r#"{"port":5432,"host":"10.0.0.5","name":"db"}"#).unwrap();
        assert_eq!(ProbeIdentity::from_fields(&a), ProbeIdentity::from_fields(&b));
    }

    #[test]
    fn identity_is_stable_hex_sha256() {
        let fields = object(json!({ "name": "db", "command": "true" }));
        let id = ProbeIdentity::from_fields(&fields);
        assert_eq!(id.as_str().len(), 64);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, ProbeIdentity::from_fields(&fields.clone()));
    }

    #[test]
    fn identity_changes_with_any_field() {
        let base = object(json!({ "name": "db", "command": "true" }));
        let renamed = object(json!({ "name": "db2", "command": "true" }));
        let tuned = object(json!({ "name": "db", "command": "true", "ignore_fail_count": 0 }));
        let id = ProbeIdentity::from_fields(&base);
        assert_ne!(id, ProbeIdentity::from_fields(&renamed));
        assert_ne!(id, ProbeIdentity::from_fields(&tuned));
    }

    #[test]
    fn identity_serializes_as_plain_string() {
        let id = ProbeIdentity::from("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""abc123""#);
        assert_eq!(id.to_string(), "abc123");
    }
}
