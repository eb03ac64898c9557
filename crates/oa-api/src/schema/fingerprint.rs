use std::fmt;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Content hash of a canonicalised schema document.
///
/// Object keys are sorted recursively before hashing, so two documents that
/// differ only in key order share a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaFingerprint([u8; 32]);

impl SchemaFingerprint {
    /// Fingerprints a schema document.
    #[must_use]
    pub fn of(document: &Value) -> Self {
        let canonical = canonicalize(document).to_string();
        Self(Sha256::digest(canonical.as_bytes()).into())
    }

    /// Raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for SchemaFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Rebuilds a document with every object's keys in sorted order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|left, right| left.0.cmp(right.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, inner)| (key.clone(), canonicalize(inner)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn key_order_does_not_change_fingerprint() {
        let first = json!({"type": "object", "id": "urn:a", "properties": {"b": {"type": "string"}, "a": {"type": "integer"}}});
        let second = json!({"properties": {"a": {"type": "integer"}, "b": {"type": "string"}}, "id": "urn:a", "type": "object"});
        assert_eq!(SchemaFingerprint::of(&first), SchemaFingerprint::of(&second));
    }

    #[test]
    fn content_changes_fingerprint() {
        let first = json!({"type": "string"});
        let second = json!({"type": "integer"});
        assert_ne!(SchemaFingerprint::of(&first), SchemaFingerprint::of(&second));
    }

    #[test]
    fn array_order_is_significant() {
        let first = json!({"implements": ["urn:a", "urn:b"]});
        let second = json!({"implements": ["urn:b", "urn:a"]});
        assert_ne!(SchemaFingerprint::of(&first), SchemaFingerprint::of(&second));
    }

    #[test]
    fn displays_as_lowercase_hex() {
        let rendered = SchemaFingerprint::of(&json!({})).to_string();
        assert_eq!(rendered.len(), 64);
        assert!(rendered.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
