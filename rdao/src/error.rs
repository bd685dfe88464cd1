//! Error types for rdao

use thiserror::Error;

use crate::context::Interrupted;

/// Result type alias for rdao operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the runtime and by generated DAOs
#[derive(Error, Debug)]
pub enum Error {
    /// The caller's context was cancelled before the store call finished
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's context deadline passed before the store call finished
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Type conversion error
    #[error("Type conversion error: expected {expected}, got {actual}")]
    TypeConversion {
        expected: &'static str,
        actual: String,
    },

    /// Column not found in row
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Null value for non-optional field
    #[error("Unexpected null value for column: {0}")]
    UnexpectedNull(String),

    /// Query execution error reported by a store handle
    #[error("Query error: {0}")]
    Query(String),

    /// Malformed caller input, e.g. an empty predicate on a bulk write
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error raised by the underlying driver
    #[error("Driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An error annotated with the operation that produced it
    #[error("{operation}: {source}")]
    Context {
        operation: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap any driver error.
    pub fn driver(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Driver(Box::new(err))
    }

    /// The innermost error, skipping call-site annotations.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<Interrupted> for Error {
    fn from(reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => Error::Cancelled,
            Interrupted::DeadlineExceeded => Error::DeadlineExceeded,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::TypeConversion {
            expected: "json",
            actual: err.to_string(),
        }
    }
}

/// Annotates errors with the name of the failing operation.
pub trait ResultExt<T> {
    fn context(self, operation: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, operation: impl Into<String>) -> Result<T> {
        self.map_err(|source| Error::Context {
            operation: operation.into(),
            source: Box::new(source),
        })
    }
}
