//! Builder for [`Strata`] instances.
//!
//! Responsibilities:
//! - Collect sources, dumpers, validators, the optional JSON Schema, and the
//!   optional binding target, then assemble the controller.
//!
//! Invariants:
//! - Source order is declaration order; later sources override earlier ones.
//! - Codec-registry lookups happen when the builder method is called, but
//!   their failures are deferred and surfaced by `build()`, so the builder
//!   chain stays infallible.
//! - The JSON Schema is compiled once, at `build()` time.

use std::sync::{Arc, RwLock};

use jsonschema::JSONSchema;

use crate::bind::{Bindable, Binding, BindingSlot, ErasedBinding};
use crate::codec;
use crate::dumper::{Dumper, FileDumper};
use crate::engine::{Strata, ValidatorFn};
use crate::error::{ConfigError, Result, SchemaViolation};
use crate::source::{ContentSource, FileSource, OsEnvSource, Source};
use crate::value::Aggregate;

#[derive(Default)]
pub struct StrataBuilder {
    sources: Vec<Box<dyn Source>>,
    dumpers: Vec<Box<dyn Dumper>>,
    schema: Option<Vec<u8>>,
    validators: Vec<ValidatorFn>,
    binding: Option<Box<dyn ErasedBinding>>,
    deferred: Vec<ConfigError>,
}

impl StrataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom source. Sources load in the order they were added.
    pub fn with_source(mut self, source: Box<dyn Source>) -> Self {
        self.sources.push(source);
        self
    }

    /// Add a file source decoded with the registered codec for `format`.
    pub fn with_file_source(mut self, path: impl Into<std::path::PathBuf>, format: &str) -> Self {
        match codec::decoder(format) {
            Ok(decoder) => self
                .sources
                .push(Box::new(FileSource::new(path.into(), decoder))),
            Err(err) => self.deferred.push(ConfigError::new("builder", "init", err)),
        }
        self
    }

    /// Add an in-memory byte-buffer source decoded with the registered codec
    /// for `format`.
    pub fn with_content_source(mut self, data: impl Into<Vec<u8>>, format: &str) -> Self {
        match codec::decoder(format) {
            Ok(decoder) => self
                .sources
                .push(Box::new(ContentSource::new(data.into(), decoder))),
            Err(err) => self.deferred.push(ConfigError::new("builder", "init", err)),
        }
        self
    }

    /// Add an OS environment source selecting entries by literal prefix.
    pub fn with_env_source(mut self, prefix: impl Into<String>) -> Self {
        self.sources.push(Box::new(OsEnvSource::new(prefix)));
        self
    }

    /// Add a custom dumper. Dumpers run in the order they were added.
    pub fn with_dumper(mut self, dumper: Box<dyn Dumper>) -> Self {
        self.dumpers.push(dumper);
        self
    }

    /// Add a file dumper encoded with the registered codec for `format`.
    pub fn with_file_dumper(mut self, path: impl Into<std::path::PathBuf>, format: &str) -> Self {
        match codec::encoder(format) {
            Ok(encoder) => self
                .dumpers
                .push(Box::new(FileDumper::new(path.into(), encoder))),
            Err(err) => self.deferred.push(ConfigError::new("builder", "init", err)),
        }
        self
    }

    /// Validate every merged aggregate against a JSON Schema document before
    /// commit.
    pub fn with_json_schema(mut self, schema: impl Into<Vec<u8>>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Add a custom validator, run post-merge in registration order.
    pub fn with_validator(
        mut self,
        validator: impl Fn(&Aggregate) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Bind every committed aggregate to a typed record, returning the
    /// caller-held [`Binding`] handle alongside the builder.
    pub fn with_binding<T: Bindable>(mut self) -> (Self, Binding<T>) {
        let (slot, handle) = BindingSlot::<T>::new();
        self.binding = Some(Box::new(slot));
        (self, handle)
    }

    /// Assemble the controller.
    ///
    /// Fails if any builder step recorded an error (e.g. an unregistered
    /// codec format) or if the JSON Schema does not compile.
    pub fn build(self) -> Result<Strata> {
        if let Some(err) = self.deferred.into_iter().next() {
            return Err(err);
        }

        let schema = match self.schema {
            Some(raw) => {
                let document: serde_json::Value = serde_json::from_slice(&raw)
                    .map_err(|e| ConfigError::new("schema", "compile", e))?;
                let compiled = JSONSchema::compile(&document).map_err(|e| {
                    ConfigError::new("schema", "compile", SchemaViolation(e.to_string()))
                })?;
                Some(compiled)
            }
            None => None,
        };

        Ok(Strata {
            committed: RwLock::new(Arc::new(Aggregate::new())),
            sources: self.sources,
            dumpers: self.dumpers,
            schema,
            validators: self.validators,
            binding: self.binding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_format_fails_at_build() {
        codec::register_defaults();
        let err = StrataBuilder::new()
            .with_content_source(&b"{}"[..], "carrier-pigeon")
            .build()
            .unwrap_err();
        assert_eq!(err.operation(), "init");
        assert!(err.downcast_cause::<codec::CodecError>().is_some());
    }

    #[test]
    fn test_invalid_schema_fails_at_build() {
        let err = StrataBuilder::new()
            .with_json_schema(&b"{ not json"[..])
            .build()
            .unwrap_err();
        assert_eq!(err.operation(), "compile");
    }

    #[test]
    fn test_debug_output_summarizes_components() {
        let strata = StrataBuilder::new()
            .with_validator(|_| Ok(()))
            .build()
            .unwrap();
        let rendered = format!("{strata:?}");
        assert!(rendered.contains("sources: 0"), "{rendered}");
        assert!(rendered.contains("validators: 1"), "{rendered}");
    }

    #[test]
    fn test_empty_builder_builds_empty_instance() {
        let strata = StrataBuilder::new().build().unwrap();
        assert!(strata.values().is_empty());
        assert_eq!(strata.get("anything"), None);
    }
}
