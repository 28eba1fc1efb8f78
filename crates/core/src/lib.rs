//! Rivulet Core - shared types for the Rivulet query engine.
//!
//! This crate provides the building blocks used by every other crate:
//!
//! - `types`: the `DataType` enum and coercion ordering
//! - `value`: the `Value` enum stored in dataframe cells
//! - `row`: positional rows
//! - `schema`: ordered column schemas
//! - `error`: the shared `Error`/`Result` types

pub mod error;
pub mod row;
pub mod schema;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use row::Row;
pub use schema::{Field, Schema};
pub use types::DataType;
pub use value::Value;
