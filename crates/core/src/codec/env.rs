//! Environment-variable folding codec.
//!
//! Responsibilities:
//! - Fold a block of `KEY=VALUE` lines into a nested mapping, splitting keys
//!   on `_` so `DB_USER_NAME=admin` becomes `{db: {user: {name: "admin"}}}`.
//!
//! Does NOT handle:
//! - Reading the OS environment or prefix filtering (see source/env.rs).
//! - Casting; every folded value is a raw trimmed string until accessed.
//!
//! Invariants:
//! - Lines without `=` are skipped, never an error.
//! - Empty segments from consecutive underscores are dropped, so `A__B` and
//!   `A_B` fold to the same path.
//! - A scalar already sitting at an intermediate segment is overwritten by a
//!   fresh map; the last processed line wins on such collisions.

use serde_json::{Map, Value};
use tracing::warn;

use super::{CodecError, Decode};

pub struct EnvCodec;

impl Decode for EnvCodec {
    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(data).map_err(|e| CodecError::Decode {
            format: "env_var",
            message: e.to_string(),
        })?;

        let mut root = Map::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((raw_key, raw_value)) = line.split_once('=') else {
                warn!("skipping malformed environment entry without '='");
                continue;
            };

            let key = raw_key.to_lowercase();
            let segments: Vec<&str> = key.split('_').filter(|s| !s.is_empty()).collect();
            let Some((last, parents)) = segments.split_last() else {
                continue;
            };

            let mut current = &mut root;
            for segment in parents {
                current = child_map(current, segment);
            }
            current.insert((*last).to_string(), Value::String(raw_value.trim().to_string()));
        }

        Ok(Value::Object(root))
    }
}

/// Fetch the nested map at `key`, replacing any non-map value sitting there.
fn child_map<'a>(parent: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut()
        .expect("slot was just ensured to be an object")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fold(lines: &str) -> Value {
        EnvCodec.decode(lines.as_bytes()).unwrap()
    }

    #[test]
    fn test_single_entry_folds_into_nested_maps() {
        assert_eq!(
            fold("DB_USER_NAME=admin"),
            json!({ "db": { "user": { "name": "admin" } } })
        );
    }

    #[test]
    fn test_double_underscore_segments_are_dropped() {
        assert_eq!(fold("A__B=v"), json!({ "a": { "b": "v" } }));
        assert_eq!(fold("_LEADING=v"), json!({ "leading": "v" }));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        assert_eq!(
            fold("GOOD=1\nMALFORMED-NO-EQUALS\nALSO_GOOD=2"),
            json!({ "good": "1", "also": { "good": "2" } })
        );
    }

    #[test]
    fn test_value_keeps_equals_signs_and_is_trimmed() {
        assert_eq!(
            fold("TOKEN=abc=def==  "),
            json!({ "token": "abc=def==" })
        );
    }

    #[test]
    fn test_scalar_collision_is_overwritten_by_map() {
        assert_eq!(
            fold("A=scalar\nA_B=nested"),
            json!({ "a": { "b": "nested" } })
        );
    }

    #[test]
    fn test_sibling_keys_share_parents() {
        assert_eq!(
            fold("DB_HOST=h\nDB_PORT=5432"),
            json!({ "db": { "host": "h", "port": "5432" } })
        );
    }
}
