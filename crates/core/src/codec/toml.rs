//! TOML codec backed by the `toml` crate.
//!
//! TOML's value space does not line up with the engine's JSON-shaped values
//! one to one: datetimes are carried over as strings, and `null` has no TOML
//! representation at all, so encoding a `null` fails.

use serde_json::Value;

use super::{CodecError, Decode, Encode};

pub struct TomlCodec;

impl Decode for TomlCodec {
    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(data).map_err(|e| CodecError::Decode {
            format: "toml",
            message: e.to_string(),
        })?;
        let table: toml::Table = toml::from_str(text).map_err(|e| CodecError::Decode {
            format: "toml",
            message: e.to_string(),
        })?;
        Ok(toml_to_json(toml::Value::Table(table)))
    }
}

impl Encode for TomlCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let table = match json_to_toml(value)? {
            toml::Value::Table(table) => table,
            other => {
                return Err(CodecError::Encode {
                    format: "toml",
                    message: format!("top-level value must be a table, got {}", other.type_str()),
                });
            }
        };
        toml::to_string_pretty(&table)
            .map(String::into_bytes)
            .map_err(|e| CodecError::Encode {
                format: "toml",
                message: e.to_string(),
            })
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, nested)| (key, toml_to_json(nested)))
                .collect(),
        ),
    }
}

fn json_to_toml(value: &Value) -> Result<toml::Value, CodecError> {
    let unrepresentable = |message: String| CodecError::Encode {
        format: "toml",
        message,
    };
    match value {
        Value::Null => Err(unrepresentable("null has no TOML representation".to_string())),
        Value::Bool(b) => Ok(toml::Value::Boolean(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(toml::Value::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(toml::Value::Float(f))
            } else {
                Err(unrepresentable(format!("number {n} exceeds TOML's integer range")))
            }
        }
        Value::String(s) => Ok(toml::Value::String(s.clone())),
        Value::Array(items) => Ok(toml::Value::Array(
            items.iter().map(json_to_toml).collect::<Result<_, _>>()?,
        )),
        Value::Object(map) => Ok(toml::Value::Table(
            map.iter()
                .map(|(key, nested)| Ok((key.clone(), json_to_toml(nested)?)))
                .collect::<Result<_, CodecError>>()?,
        )),
    }
}
