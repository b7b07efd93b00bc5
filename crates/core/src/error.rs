//! Error types for the aggregation engine.
//!
//! Responsibilities:
//! - Define the structured [`ConfigError`] carried by every fallible operation.
//! - Define the small leaf errors (key lookup, schema, validator faults) that
//!   appear as causes inside a `ConfigError`.
//!
//! Does NOT handle:
//! - Cast failures (see cast.rs) or codec failures (see codec/mod.rs); those
//!   types only ever show up here as wrapped causes.
//!
//! Invariants:
//! - A `ConfigError` always names the origin (source, dumper, or component
//!   label) and the operation that failed; the underlying cause is reachable
//!   through `std::error::Error::source` for downcast-based matching.

use thiserror::Error;

/// Boxed cause stored inside a [`ConfigError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Structured error carrying the origin label, an optional field label, the
/// operation that failed, and the wrapped cause.
///
/// The cause chain is preserved: matching against either this wrapper or the
/// innermost cause works through `source()` / [`ConfigError::downcast_cause`].
#[derive(Debug, Error)]
#[error("config error in {origin}{} during {operation}: {cause}", .field.as_ref().map(|f| format!(".{f}")).unwrap_or_default())]
pub struct ConfigError {
    origin: String,
    field: Option<String>,
    operation: String,
    #[source]
    cause: BoxError,
}

impl ConfigError {
    /// Create an error with an origin and operation label.
    pub fn new(
        origin: impl Into<String>,
        operation: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self {
            origin: origin.into(),
            field: None,
            operation: operation.into(),
            cause: cause.into(),
        }
    }

    /// Create an error scoped to a specific field within the origin.
    pub fn with_field(
        origin: impl Into<String>,
        field: impl Into<String>,
        operation: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self {
            origin: origin.into(),
            field: Some(field.into()),
            operation: operation.into(),
            cause: cause.into(),
        }
    }

    /// Origin label (source name, dumper name, or component).
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Field label, if the error is scoped to one key or field.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Operation label (`load`, `merge`, `validate`, `bind`, `dump`, ...).
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Attempt to view the wrapped cause as a concrete error type.
    pub fn downcast_cause<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.cause.downcast_ref::<E>()
    }
}

/// Cause used by the strict accessors when a path resolves to nothing.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("key {0:?} not found")]
pub struct KeyNotFound(pub String);

/// Cause used when the compiled JSON Schema rejects a merged aggregate.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("schema validation failed: {0}")]
pub struct SchemaViolation(pub String);

/// Cause used when a custom validator panics instead of returning an error.
///
/// The panic is caught at the validator-invocation boundary so third-party
/// validator code can never crash a `load` caller.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("validator panicked: {0}")]
pub struct ValidatorPanic(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("base error")]
    struct BaseError;

    #[test]
    fn test_display_with_field() {
        let err = ConfigError::with_field("source1", "field1", "parse", BaseError);
        assert_eq!(
            err.to_string(),
            "config error in source1.field1 during parse: base error"
        );
    }

    #[test]
    fn test_display_without_field() {
        let err = ConfigError::new("source2", "load", BaseError);
        assert_eq!(
            err.to_string(),
            "config error in source2 during load: base error"
        );
    }

    #[test]
    fn test_cause_chain_unwraps() {
        let err = ConfigError::new("test-source", "test-operation", BaseError);
        assert_eq!(err.origin(), "test-source");
        assert_eq!(err.operation(), "test-operation");
        assert_eq!(err.field(), None);
        assert!(err.downcast_cause::<BaseError>().is_some());
        assert!(err.downcast_cause::<KeyNotFound>().is_none());

        let source = std::error::Error::source(&err).expect("cause must chain");
        assert_eq!(source.to_string(), "base error");
    }

    #[test]
    fn test_nested_config_error_unwraps_twice() {
        let inner = ConfigError::new("inner", "decode", BaseError);
        let outer = ConfigError::new("outer", "load", inner);

        let nested = outer.downcast_cause::<ConfigError>().expect("inner error");
        assert_eq!(nested.origin(), "inner");
        assert!(nested.downcast_cause::<BaseError>().is_some());
    }
}
