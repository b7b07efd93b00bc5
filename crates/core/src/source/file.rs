//! File-backed configuration source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Source, into_aggregate};
use crate::codec::Decode;
use crate::error::ConfigError;
use crate::value::Aggregate;

/// Reads a file and decodes its contents on every `load`.
pub struct FileSource {
    path: PathBuf,
    decoder: Arc<dyn Decode>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, decoder: Arc<dyn Decode>) -> Self {
        Self {
            path: path.into(),
            decoder,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Source for FileSource {
    async fn load(&self) -> Result<Aggregate, ConfigError> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| ConfigError::new(self.name(), "read", e))?;
        debug!(path = %self.path.display(), bytes = data.len(), "read configuration file");

        let value = self
            .decoder
            .decode(&data)
            .map_err(|e| ConfigError::new(self.name(), "decode", e))?;
        into_aggregate(value, &self.name())
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
