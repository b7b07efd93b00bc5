//! Typed binding of the aggregate onto a caller-supplied record.
//!
//! Responsibilities:
//! - Decode the freshly merged aggregate into a typed record via serde and
//!   run the record's self-validation hook.
//! - Hand the caller a [`Binding`] handle that always reflects the last
//!   successfully committed record.
//!
//! Invariants:
//! - Decode and validation run against a temporary holder; the handle's slot
//!   is swapped only after both succeed, so a failed bind never leaves a
//!   half-updated record behind.
//! - A bind failure fails the whole `load`; the previously committed
//!   aggregate and record both stay visible.

use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ConfigError;

/// A record type the aggregate can be bound to.
///
/// Field mapping is serde's: field names (or `#[serde(rename)]`) address the
/// key at the current nesting level, nested records express nesting, and
/// `#[serde(flatten)]` merges an embedded record into its parent's
/// namespace. Override `validate` to reject semantically invalid values; the
/// default accepts everything.
pub trait Bindable: DeserializeOwned + Send + Sync + 'static {
    fn validate(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Caller-held handle to the bound record.
///
/// `get` returns `None` until the first successful `load`.
pub struct Binding<T> {
    slot: Arc<RwLock<Option<Arc<T>>>>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Binding<T> {
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Type-erased rebind slot held by the controller.
pub(crate) trait ErasedBinding: Send + Sync {
    fn rebind(&self, values: &Value) -> Result<(), ConfigError>;
}

pub(crate) struct BindingSlot<T> {
    slot: Arc<RwLock<Option<Arc<T>>>>,
}

impl<T: Bindable> BindingSlot<T> {
    pub(crate) fn new() -> (Self, Binding<T>) {
        let slot = Arc::new(RwLock::new(None));
        (
            Self {
                slot: Arc::clone(&slot),
            },
            Binding { slot },
        )
    }
}

impl<T: Bindable> ErasedBinding for BindingSlot<T> {
    fn rebind(&self, values: &Value) -> Result<(), ConfigError> {
        let decoded: T = serde_json::from_value(values.clone())
            .map_err(|e| ConfigError::new("binding", "bind", e))?;

        decoded
            .validate()
            .map_err(|e| ConfigError::new("binding", "validate", e))?;

        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(decoded));
        Ok(())
    }
}
