//! JSON codec backed by `serde_json`.

use serde_json::Value;

use super::{CodecError, Decode, Encode, require_mapping};

pub struct JsonCodec;

impl Decode for JsonCodec {
    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        let value = serde_json::from_slice(data).map_err(|e| CodecError::Decode {
            format: "json",
            message: e.to_string(),
        })?;
        require_mapping("json", value)
    }
}

impl Encode for JsonCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec_pretty(value).map_err(|e| CodecError::Encode {
            format: "json",
            message: e.to_string(),
        })
    }
}
