//! Opaque attribute payload carried by a passport.
//!
//! The lifecycle core never interprets attributes field by field. It only
//! needs to parse them, enumerate and remove top-level keys for redaction,
//! and serialize them deterministically for content hashing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema-validated JSON tree with a deliberately narrow interface.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeTree(Value);

impl AttributeTree {
    /// Parse raw payload bytes.
    pub fn parse(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw).map(Self)
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Whether the payload is a JSON object (the only shape redaction acts on).
    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }

    /// Top-level property names, or an empty list for non-object payloads.
    pub fn top_level_keys(&self) -> Vec<&str> {
        match &self.0 {
            Value::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.as_object().is_some_and(|map| map.contains_key(key))
    }

    /// Remove a top-level property, returning its value if it was present.
    pub fn remove_key(&mut self, key: &str) -> Option<Value> {
        self.0.as_object_mut().and_then(|map| map.remove(key))
    }

    /// Compact JSON with object keys sorted at every depth.
    ///
    /// The output is independent of the order keys were submitted in, so two
    /// semantically equal payloads always hash to the same digest.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&canonicalize(&self.0))
    }
}

impl From<Value> for AttributeTree {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
