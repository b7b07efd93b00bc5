//! Value model and key normalization.
//!
//! Responsibilities:
//! - Define the [`Aggregate`] alias used for every configuration tree.
//! - Normalize map keys (trim + lowercase) at every nesting depth so that
//!   differently-cased keys from different sources collide into one leaf.
//!
//! Invariants:
//! - Normalization runs before merging, never only at read time.
//! - Scalars pass through untouched; arrays are normalized element-wise.
//! - If two keys in one fragment differ only by case, they collapse into a
//!   single entry; which value survives is unspecified.

use serde_json::Value;

/// One level of the configuration tree: string keys to arbitrary values.
pub type Aggregate = serde_json::Map<String, Value>;

/// Recursively lowercase and trim every map key in `value`.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, nested)| (normalize_key(&key), normalize(nested)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        scalar => scalar,
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
