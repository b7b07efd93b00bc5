//! Layered configuration aggregation.
//!
//! This crate collects configuration fragments from heterogeneous sources
//! (files, byte buffers, environment variables, remote stores), deep-merges
//! them deterministically in declared order, and exposes the committed
//! result through dot-notation typed accessors and an optional validated
//! binding onto a caller-supplied record.
//!
//! ```no_run
//! use strata_core::{StrataBuilder, codec};
//!
//! # async fn example() -> strata_core::Result<()> {
//! codec::register_defaults();
//!
//! let config = StrataBuilder::new()
//!     .with_file_source("config/default.yaml", codec::YAML)
//!     .with_env_source("APP_")
//!     .build()?;
//! config.load().await?;
//!
//! let port = config.get_int("server.port");
//! # Ok(())
//! # }
//! ```

mod bind;
mod builder;
pub mod cast;
pub mod codec;
pub mod dumper;
mod engine;
mod error;
mod merge;
pub mod source;
mod value;

pub use bind::{Bindable, Binding};
pub use builder::StrataBuilder;
pub use cast::CastError;
pub use engine::{Strata, ValidatorFn};
pub use error::{BoxError, ConfigError, KeyNotFound, Result, SchemaViolation, ValidatorPanic};
pub use merge::deep_merge;
pub use value::{Aggregate, normalize};

// The value type stored inside an aggregate.
pub use serde_json::Value;
