//! Pluggable configuration sinks.
//!
//! Dumpers persist the committed aggregate. They run in registration order
//! and fail fast: the first sink error aborts the remaining dumpers, and
//! writes already made to earlier sinks are not rolled back.

mod file;

pub use file::FileDumper;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ConfigError;

/// Persists one snapshot of the committed aggregate.
#[async_trait]
pub trait Dumper: Send + Sync {
    /// Write the aggregate to this sink.
    async fn dump(&self, values: &Value) -> Result<(), ConfigError>;

    /// Human-readable sink label, used in errors and logs.
    fn name(&self) -> String;
}
