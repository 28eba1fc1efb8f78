//! Error types shared across the Rivulet engine.

use crate::types::DataType;
use std::path::PathBuf;

/// Result type alias for Rivulet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Rivulet operations.
///
/// Three families, matching where failures can occur: schema errors at
/// plan-build or optimization time, source errors at execution time, and
/// internal invariant violations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced column does not exist in the schema in scope.
    #[error("column not found: {column}")]
    ColumnNotFound { column: String },

    /// Two columns with the same name in one schema.
    #[error("duplicate column: {column}")]
    DuplicateColumn { column: String },

    /// Operand or cast types are incompatible.
    #[error("type mismatch: {left} is not compatible with {right}")]
    TypeMismatch { left: DataType, right: DataType },

    /// A source file or directory is missing or unreadable.
    #[error("source error at {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file exists but its contents are not a valid frame file.
    #[error("corrupt source file {}: {detail}", path.display())]
    Corrupt { path: PathBuf, detail: String },

    /// The files of one directory source disagree on schema.
    #[error("schema mismatch across source files: {detail}")]
    SchemaMismatch { detail: String },

    /// An internal invariant was violated. Always a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Creates a duplicate-column error.
    pub fn duplicate_column(column: impl Into<String>) -> Self {
        Error::DuplicateColumn {
            column: column.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(left: DataType, right: DataType) -> Self {
        Error::TypeMismatch { left, right }
    }

    /// Creates a source I/O error.
    pub fn source(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Source {
            path: path.into(),
            source,
        }
    }

    /// Creates a corrupt-file error.
    pub fn corrupt(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Error::Corrupt {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Creates a schema mismatch error.
    pub fn schema_mismatch(detail: impl Into<String>) -> Self {
        Error::SchemaMismatch {
            detail: detail.into(),
        }
    }

    /// Creates an internal invariant violation error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::column_not_found("fare");
        assert!(err.to_string().contains("fare"));

        let err = Error::type_mismatch(DataType::Utf8, DataType::Int64);
        assert!(err.to_string().contains("not compatible"));

        let err = Error::corrupt("/tmp/x.rvf", "bad magic");
        assert!(err.to_string().contains("bad magic"));
    }
}
