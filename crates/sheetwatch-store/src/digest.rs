//! Snapshot digest canonicalization
//!
//! Object keys are sorted recursively before hashing so that two documents
//! differing only in key order share a digest.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// `sha256:<hex>` of the canonical JSON form of `value`.
pub fn snapshot_digest(value: &Value) -> String {
    let canonical = canonicalize(value);
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::with_capacity(map.len());
            for key in keys {
                if let Some(v) = map.get(key) {
                    out.insert(key.clone(), canonicalize(v));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
