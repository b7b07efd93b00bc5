//! File-backed configuration dumper.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::Dumper;
use crate::codec::Encode;
use crate::error::ConfigError;

/// Encodes the aggregate and writes it to a file, replacing any previous
/// contents.
pub struct FileDumper {
    path: PathBuf,
    encoder: Arc<dyn Encode>,
}

impl FileDumper {
    pub fn new(path: impl Into<PathBuf>, encoder: Arc<dyn Encode>) -> Self {
        Self {
            path: path.into(),
            encoder,
        }
    }
}

#[async_trait]
impl Dumper for FileDumper {
    async fn dump(&self, values: &Value) -> Result<(), ConfigError> {
        let data = self
            .encoder
            .encode(values)
            .map_err(|e| ConfigError::new(self.name(), "encode", e))?;

        tokio::fs::write(&self.path, &data)
            .await
            .map_err(|e| ConfigError::new(self.name(), "write", e))?;
        debug!(path = %self.path.display(), bytes = data.len(), "dumped configuration");
        Ok(())
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
