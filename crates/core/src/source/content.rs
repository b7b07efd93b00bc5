//! In-memory byte-buffer configuration source.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Source, into_aggregate};
use crate::codec::Decode;
use crate::error::ConfigError;
use crate::value::Aggregate;

/// Decodes a fixed byte buffer, e.g. embedded defaults.
pub struct ContentSource {
    data: Vec<u8>,
    decoder: Arc<dyn Decode>,
}

impl ContentSource {
    pub fn new(data: impl Into<Vec<u8>>, decoder: Arc<dyn Decode>) -> Self {
        Self {
            data: data.into(),
            decoder,
        }
    }
}

#[async_trait]
impl Source for ContentSource {
    async fn load(&self) -> Result<Aggregate, ConfigError> {
        let value = self
            .decoder
            .decode(&self.data)
            .map_err(|e| ConfigError::new(self.name(), "decode", e))?;
        into_aggregate(value, &self.name())
    }

    fn name(&self) -> String {
        "content".to_string()
    }
}
