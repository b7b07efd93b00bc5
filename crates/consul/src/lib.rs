//! Consul key-value store source for `strata-core`.
//!
//! Responsibilities:
//! - Fetch one key from Consul's KV HTTP API and decode its value with a
//!   registered codec, producing an aggregate fragment for the merge engine.
//!
//! Does NOT handle:
//! - Watching/blocking queries or any other hot-reload mechanism.
//!
//! Invariants:
//! - A missing key (HTTP 404 or an empty result set) yields an empty
//!   fragment, not an error.
//! - Connection settings come from `CONSUL_HTTP_ADDR` and
//!   `CONSUL_HTTP_TOKEN` at construction time, matching the conventional
//!   Consul client environment.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use strata_core::codec::{self, Decode};
use strata_core::source::Source;
use strata_core::{Aggregate, ConfigError, Value};

const DEFAULT_ADDR: &str = "http://127.0.0.1:8500";

/// Loads one key from Consul's KV store.
pub struct ConsulSource {
    client: reqwest::Client,
    address: String,
    token: Option<String>,
    path: String,
    decoder: Arc<dyn Decode>,
}

// The token must never appear in logs or error output.
impl fmt::Debug for ConsulSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsulSource")
            .field("address", &self.address)
            .field("path", &self.path)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// One entry of Consul's KV read response; values arrive base64-encoded.
#[derive(Deserialize)]
struct KvPair {
    #[serde(rename = "Value")]
    value: Option<String>,
}

impl ConsulSource {
    /// Create a source reading `path`, decoding the stored value with the
    /// registered codec for `format`.
    ///
    /// The server address is taken from `CONSUL_HTTP_ADDR` (default
    /// `http://127.0.0.1:8500`) and the access token, if any, from
    /// `CONSUL_HTTP_TOKEN`.
    pub fn new(path: impl Into<String>, format: &str) -> Result<Self, ConfigError> {
        let path = path.into();
        let decoder = codec::decoder(format)
            .map_err(|e| ConfigError::new(format!("consul:{path}"), "init", e))?;

        let address = std::env::var("CONSUL_HTTP_ADDR")
            .ok()
            .filter(|addr| !addr.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let token = std::env::var("CONSUL_HTTP_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(Self {
            client: reqwest::Client::new(),
            address: address.trim_end_matches('/').to_string(),
            token,
            path,
            decoder,
        })
    }

    /// Override the server address, e.g. for pointing at a test server.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into().trim_end_matches('/').to_string();
        self
    }

    fn load_error(&self, cause: impl Into<strata_core::BoxError>) -> ConfigError {
        ConfigError::new(self.name(), "load", cause)
    }
}

#[async_trait]
impl Source for ConsulSource {
    async fn load(&self) -> Result<Aggregate, ConfigError> {
        let url = format!("{}/v1/kv/{}", self.address, self.path);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.header("X-Consul-Token", token);
        }

        let response = request.send().await.map_err(|e| self.load_error(e))?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(path = %self.path, "consul key absent, contributing empty fragment");
            return Ok(Aggregate::new());
        }
        let response = response
            .error_for_status()
            .map_err(|e| self.load_error(e))?;

        let pairs: Vec<KvPair> = response.json().await.map_err(|e| self.load_error(e))?;
        let Some(encoded) = pairs.into_iter().next().and_then(|pair| pair.value) else {
            return Ok(Aggregate::new());
        };

        let raw = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| self.load_error(e))?;
        let value = self
            .decoder
            .decode(&raw)
            .map_err(|e| ConfigError::new(self.name(), "decode", e))?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(self.load_error(std::io::Error::other(format!(
                "consul value decoded to {other:?}, expected a mapping"
            )))),
        }
    }

    fn name(&self) -> String {
        format!("consul:{}", self.path)
    }
}
