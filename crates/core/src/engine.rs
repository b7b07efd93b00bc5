//! The aggregate controller: owns the committed configuration tree.
//!
//! Responsibilities:
//! - Orchestrate `load`: sources in declared order → normalize → deep merge
//!   → schema validation → custom validators → bind → atomic commit.
//! - Serve path-addressed reads and typed casts against the committed tree.
//! - Fan the committed tree out to registered dumpers on `dump`.
//!
//! Does NOT handle:
//! - Construction; see [`crate::builder::StrataBuilder`].
//!
//! Invariants:
//! - `load` is all-or-nothing: any source, validation, or binding failure
//!   leaves the previously committed aggregate untouched.
//! - Only `load` writes the committed pointer, exactly once per successful
//!   call; readers take a shared lock to fetch the pointer and never observe
//!   a partially merged tree.
//! - Sources run sequentially in declared order; the merge is
//!   order-sensitive and later sources override earlier ones.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::{debug, info};

use crate::bind::ErasedBinding;
use crate::cast;
use crate::dumper::Dumper;
use crate::error::{ConfigError, KeyNotFound, Result, SchemaViolation, ValidatorPanic};
use crate::merge::deep_merge;
use crate::source::Source;
use crate::value::{Aggregate, normalize};

/// Custom validator invoked against the merged, not-yet-committed aggregate.
pub type ValidatorFn = Box<dyn Fn(&Aggregate) -> anyhow::Result<()> + Send + Sync>;

/// A layered configuration instance.
///
/// Safe for shared multi-threaded use: `load`, the getters, and `dump` may
/// all be called concurrently. A `load` in progress never blocks readers
/// from seeing the previously committed values.
pub struct Strata {
    pub(crate) committed: RwLock<Arc<Aggregate>>,
    pub(crate) sources: Vec<Box<dyn Source>>,
    pub(crate) dumpers: Vec<Box<dyn Dumper>>,
    pub(crate) schema: Option<JSONSchema>,
    pub(crate) validators: Vec<ValidatorFn>,
    pub(crate) binding: Option<Box<dyn ErasedBinding>>,
}

// Sources, dumpers, and validators are trait objects, so Debug summarizes
// component counts instead of contents.
impl fmt::Debug for Strata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strata")
            .field("sources", &self.sources.len())
            .field("dumpers", &self.dumpers.len())
            .field("validators", &self.validators.len())
            .field("schema", &self.schema.is_some())
            .field("binding", &self.binding.is_some())
            .finish()
    }
}

impl Strata {
    /// Load all sources, merge, validate, bind, and commit the result.
    ///
    /// On failure the previously committed aggregate (or the initial empty
    /// one) remains visible to readers and to the bound record.
    pub async fn load(&self) -> Result<()> {
        let mut working = Aggregate::new();
        for source in &self.sources {
            let fragment = source.load().await?;
            let Value::Object(fragment) = normalize(Value::Object(fragment)) else {
                continue;
            };
            debug!(source = %source.name(), keys = fragment.len(), "merging source fragment");
            deep_merge(&mut working, fragment);
        }

        if let Some(schema) = &self.schema {
            let instance = Value::Object(working.clone());
            if let Err(violations) = schema.validate(&instance) {
                let message = violations
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(ConfigError::new(
                    "schema",
                    "validate",
                    SchemaViolation(message),
                ));
            }
        }

        for (index, validator) in self.validators.iter().enumerate() {
            // A panicking validator must not crash the caller; it is caught
            // here and turned into an ordinary load failure.
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| validator(&working)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    return Err(ConfigError::with_field(
                        "validator",
                        index.to_string(),
                        "validate",
                        err,
                    ));
                }
                Err(payload) => {
                    return Err(ConfigError::with_field(
                        "validator",
                        index.to_string(),
                        "validate",
                        ValidatorPanic(panic_message(payload)),
                    ));
                }
            }
        }

        if let Some(binding) = &self.binding {
            binding.rebind(&Value::Object(working.clone()))?;
        }

        let mut committed = self.committed.write().unwrap_or_else(|e| e.into_inner());
        *committed = Arc::new(working);
        drop(committed);
        info!(sources = self.sources.len(), "configuration committed");
        Ok(())
    }

    /// Write the committed aggregate to every registered dumper, in
    /// registration order. Fails fast on the first sink error; earlier
    /// writes are not rolled back.
    pub async fn dump(&self) -> Result<()> {
        let snapshot = Value::Object((*self.values()).clone());
        for dumper in &self.dumpers {
            dumper.dump(&snapshot).await?;
        }
        Ok(())
    }

    /// Shared snapshot of the committed aggregate.
    pub fn values(&self) -> Arc<Aggregate> {
        self.committed
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Resolve a dot-notation path against the committed aggregate.
    ///
    /// An exact top-level key match wins first (supporting keys that contain
    /// dots), then segment-by-segment traversal. Lookup is case-insensitive.
    pub fn get(&self, path: &str) -> Option<Value> {
        let values = self.values();
        let path = path.trim().to_lowercase();

        if let Some(found) = values.get(&path) {
            return Some(found.clone());
        }

        let mut current: &Aggregate = &values;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let found = current.get(segment)?;
            if segments.peek().is_none() {
                return Some(found.clone());
            }
            current = found.as_object()?;
        }
        None
    }

    fn require(&self, path: &str) -> Result<Value> {
        self.get(path).ok_or_else(|| {
            ConfigError::with_field("config", path, "get", KeyNotFound(path.to_string()))
        })
    }

    fn cast_err(path: &str, err: cast::CastError) -> ConfigError {
        ConfigError::with_field("config", path, "cast", err)
    }

    pub fn get_string(&self, path: &str) -> String {
        self.try_get_string(path).unwrap_or_default()
    }

    pub fn try_get_string(&self, path: &str) -> Result<String> {
        let value = self.require(path)?;
        cast::to_string(&value).map_err(|e| Self::cast_err(path, e))
    }

    pub fn get_bool(&self, path: &str) -> bool {
        self.try_get_bool(path).unwrap_or_default()
    }

    pub fn try_get_bool(&self, path: &str) -> Result<bool> {
        let value = self.require(path)?;
        cast::to_bool(&value).map_err(|e| Self::cast_err(path, e))
    }

    pub fn get_int(&self, path: &str) -> i64 {
        self.try_get_int(path).unwrap_or_default()
    }

    pub fn try_get_int(&self, path: &str) -> Result<i64> {
        let value = self.require(path)?;
        cast::to_i64(&value).map_err(|e| Self::cast_err(path, e))
    }

    pub fn get_uint(&self, path: &str) -> u64 {
        self.try_get_uint(path).unwrap_or_default()
    }

    pub fn try_get_uint(&self, path: &str) -> Result<u64> {
        let value = self.require(path)?;
        cast::to_u64(&value).map_err(|e| Self::cast_err(path, e))
    }

    pub fn get_float(&self, path: &str) -> f64 {
        self.try_get_float(path).unwrap_or_default()
    }

    pub fn try_get_float(&self, path: &str) -> Result<f64> {
        let value = self.require(path)?;
        cast::to_f64(&value).map_err(|e| Self::cast_err(path, e))
    }

    pub fn get_time(&self, path: &str) -> DateTime<Utc> {
        self.try_get_time(path).unwrap_or(DateTime::UNIX_EPOCH)
    }

    pub fn try_get_time(&self, path: &str) -> Result<DateTime<Utc>> {
        let value = self.require(path)?;
        cast::to_datetime(&value).map_err(|e| Self::cast_err(path, e))
    }

    pub fn get_duration(&self, path: &str) -> Duration {
        self.try_get_duration(path).unwrap_or_default()
    }

    pub fn try_get_duration(&self, path: &str) -> Result<Duration> {
        let value = self.require(path)?;
        cast::to_duration(&value).map_err(|e| Self::cast_err(path, e))
    }

    pub fn get_string_vec(&self, path: &str) -> Vec<String> {
        self.try_get_string_vec(path).unwrap_or_default()
    }

    pub fn try_get_string_vec(&self, path: &str) -> Result<Vec<String>> {
        let value = self.require(path)?;
        cast::to_string_vec(&value).map_err(|e| Self::cast_err(path, e))
    }

    pub fn get_int_vec(&self, path: &str) -> Vec<i64> {
        self.try_get_int_vec(path).unwrap_or_default()
    }

    pub fn try_get_int_vec(&self, path: &str) -> Result<Vec<i64>> {
        let value = self.require(path)?;
        cast::to_i64_vec(&value).map_err(|e| Self::cast_err(path, e))
    }

    pub fn get_map(&self, path: &str) -> Aggregate {
        self.try_get_map(path).unwrap_or_default()
    }

    pub fn try_get_map(&self, path: &str) -> Result<Aggregate> {
        let value = self.require(path)?;
        cast::to_map(&value).map_err(|e| Self::cast_err(path, e))
    }

    pub fn get_string_map(&self, path: &str) -> HashMap<String, String> {
        self.try_get_string_map(path).unwrap_or_default()
    }

    pub fn try_get_string_map(&self, path: &str) -> Result<HashMap<String, String>> {
        let value = self.require(path)?;
        cast::to_string_map(&value).map_err(|e| Self::cast_err(path, e))
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
