//! OS environment-variable configuration source.
//!
//! Responsibilities:
//! - Select environment entries by literal (case-sensitive) prefix, strip
//!   the prefix, and hand the remainder to the env-var folding codec.
//!
//! Invariants:
//! - Matched entries are sorted by key before folding, so scalar/nested
//!   collisions resolve deterministically regardless of the OS environment's
//!   iteration order.
//! - Values stay raw strings; casting happens at access time.

use async_trait::async_trait;
use tracing::debug;

use super::{Source, into_aggregate};
use crate::codec::{Decode, EnvCodec};
use crate::error::ConfigError;
use crate::value::Aggregate;

/// Loads every environment entry whose key starts with a configured prefix.
pub struct OsEnvSource {
    prefix: String,
}

impl OsEnvSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl Source for OsEnvSource {
    async fn load(&self) -> Result<Aggregate, ConfigError> {
        let mut entries: Vec<String> = std::env::vars()
            .filter(|(key, _)| key.starts_with(&self.prefix))
            .map(|(key, value)| format!("{}={value}", &key[self.prefix.len()..]))
            .collect();
        entries.sort();
        debug!(prefix = %self.prefix, matched = entries.len(), "collected environment entries");

        let value = EnvCodec
            .decode(entries.join("\n").as_bytes())
            .map_err(|e| ConfigError::new(self.name(), "decode", e))?;
        into_aggregate(value, &self.name())
    }

    fn name(&self) -> String {
        format!("env:{}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn test_prefix_is_stripped_and_keys_fold() {
        temp_env::async_with_vars(
            [
                ("STRATA_TEST_DB_USER_NAME", Some("admin")),
                ("STRATA_TEST_PORT", Some("8080")),
                ("UNRELATED_KEY", Some("ignored")),
            ],
            async {
                let source = OsEnvSource::new("STRATA_TEST_");
                let fragment = source.load().await.unwrap();
                assert_eq!(fragment["db"]["user"]["name"], "admin");
                assert_eq!(fragment["port"], "8080");
                assert!(!fragment.contains_key("unrelated"));
            },
        )
        .await;
    }

    #[tokio::test]
    #[serial]
    async fn test_prefix_match_is_case_sensitive() {
        temp_env::async_with_vars(
            [("strata_lower_KEY", Some("v"))],
            async {
                let source = OsEnvSource::new("STRATA_LOWER_");
                let fragment = source.load().await.unwrap();
                assert!(fragment.is_empty());
            },
        )
        .await;
    }

    #[tokio::test]
    #[serial]
    async fn test_no_matches_yields_empty_fragment() {
        let source = OsEnvSource::new("STRATA_NO_SUCH_PREFIX_");
        let fragment = source.load().await.unwrap();
        assert!(fragment.is_empty());
    }
}
