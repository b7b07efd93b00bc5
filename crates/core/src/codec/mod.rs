//! Byte ⇄ structured-value conversion.
//!
//! Responsibilities:
//! - Define the [`Decode`]/[`Encode`] capability traits consumed by sources
//!   and dumpers.
//! - Expose the process-wide codec registry (see registry.rs) and the
//!   built-in JSON, YAML, TOML, and environment-variable codecs.
//!
//! Invariants:
//! - Every decoder yields a top-level mapping; a scalar or sequence document
//!   is a decode error, never a silent wrap.
//! - Registration is explicit (`register_defaults` or `register_decoder`/
//!   `register_encoder` in the entry point); there are no import-time side
//!   effects, so initialization order stays deterministic.

mod env;
mod json;
mod registry;
mod toml;
mod yaml;

pub use env::EnvCodec;
pub use json::JsonCodec;
pub use registry::{decoder, encoder, register_decoder, register_defaults, register_encoder};
pub use toml::TomlCodec;
pub use yaml::YamlCodec;

use serde_json::Value;
use thiserror::Error;

/// Format identifier for JSON documents.
pub const JSON: &str = "json";
/// Format identifier for YAML documents.
pub const YAML: &str = "yaml";
/// Format identifier for TOML documents.
pub const TOML: &str = "toml";
/// Format identifier for `KEY=VALUE` environment-variable blocks.
pub const ENV_VAR: &str = "env_var";

/// Decodes raw bytes into a structured value.
pub trait Decode: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<Value, CodecError>;
}

/// Encodes a structured value into raw bytes.
pub trait Encode: Send + Sync {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;
}

/// Errors produced by registry lookups and codec implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("no decoder registered for format {0:?}")]
    NoDecoder(String),

    #[error("no encoder registered for format {0:?}")]
    NoEncoder(String),

    #[error("failed to decode {format} data: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    #[error("failed to encode {format} data: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    #[error("top-level {format} value must be a mapping, got {actual}")]
    NotAMapping {
        format: &'static str,
        actual: &'static str,
    },
}

/// Reject non-mapping documents at the decode boundary.
fn require_mapping(format: &'static str, value: Value) -> Result<Value, CodecError> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(CodecError::NotAMapping {
            format,
            actual: match value {
                Value::Null => "null",
                Value::Bool(_) => "bool",
                Value::Number(_) => "number",
                Value::String(_) => "string",
                Value::Array(_) => "array",
                Value::Object(_) => "object",
            },
        })
    }
}
