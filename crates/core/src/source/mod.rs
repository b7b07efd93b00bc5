//! Pluggable configuration sources.
//!
//! A source produces one aggregate fragment per `load`; the engine merges
//! fragments in declared order. Implementations must be idempotent for a
//! given backing state, since `load` may be called repeatedly.

mod content;
mod env;
mod file;

pub use content::ContentSource;
pub use env::OsEnvSource;
pub use file::FileSource;

use async_trait::async_trait;
use serde_json::Value;

use crate::codec::CodecError;
use crate::error::ConfigError;
use crate::value::Aggregate;

/// Produces one configuration fragment.
///
/// Cancellation follows the usual async contract: dropping the future
/// returned by `load` abandons the operation.
#[async_trait]
pub trait Source: Send + Sync {
    /// Load and decode this source's fragment.
    async fn load(&self) -> Result<Aggregate, ConfigError>;

    /// Human-readable origin label, used in errors and logs.
    fn name(&self) -> String;
}

/// Unwrap a decoded document into an aggregate fragment.
///
/// Registered decoders already reject non-mapping documents; this guards
/// against third-party decoders that do not.
pub(crate) fn into_aggregate(value: Value, origin: &str) -> Result<Aggregate, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ConfigError::new(
            origin,
            "decode",
            CodecError::NotAMapping {
                format: "decoded",
                actual: match other {
                    Value::Null => "null",
                    Value::Bool(_) => "bool",
                    Value::Number(_) => "number",
                    Value::String(_) => "string",
                    Value::Array(_) => "array",
                    Value::Object(_) => "object",
                },
            },
        )),
    }
}
