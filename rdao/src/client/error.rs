//! Errors returned by generated service clients

use thiserror::Error;

use crate::context::Interrupted;

/// Result type alias for client calls
pub type Result<T> = std::result::Result<T, ClientError>;

/// Every way a generated client call can fail.
///
/// Server selection, transport and status failures short-circuit before
/// the response body is decoded.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("server selection failed: {0}")]
    ServerSelection(String),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The service returned a non-empty error field.
    #[error("{0}")]
    Remote(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl From<Interrupted> for ClientError {
    fn from(reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => ClientError::Cancelled,
            Interrupted::DeadlineExceeded => ClientError::DeadlineExceeded,
        }
    }
}
