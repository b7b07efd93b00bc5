//! YAML codec backed by `serde_yaml`.
//!
//! Documents are parsed as `serde_yaml::Value` and converted through
//! `serde_json::to_value`, so only string-keyed mappings survive the
//! conversion; anything else is a decode error.

use serde_json::Value;

use super::{CodecError, Decode, Encode, require_mapping};

pub struct YamlCodec;

impl Decode for YamlCodec {
    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_slice(data).map_err(|e| CodecError::Decode {
                format: "yaml",
                message: e.to_string(),
            })?;
        let value = serde_json::to_value(yaml).map_err(|e| CodecError::Decode {
            format: "yaml",
            message: e.to_string(),
        })?;
        require_mapping("yaml", value)
    }
}

impl Encode for YamlCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| CodecError::Encode {
                format: "yaml",
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_nested_mapping() {
        let value = YamlCodec
            .decode(b"server:\n  host: localhost\n  port: 8080\n")
            .unwrap();
        assert_eq!(value, json!({ "server": { "host": "localhost", "port": 8080 } }));
    }

    #[test]
    fn test_decode_rejects_sequence_document() {
        assert!(matches!(
            YamlCodec.decode(b"- one\n- two\n"),
            Err(CodecError::NotAMapping { .. })
        ));
    }

    #[test]
    fn test_encode_round_trips() {
        let value = json!({ "db": { "name": "prod" }, "tags": ["a", "b"] });
        let bytes = YamlCodec.encode(&value).unwrap();
        assert_eq!(YamlCodec.decode(&bytes).unwrap(), value);
    }
}
