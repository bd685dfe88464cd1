//! Error types for rdao-codegen

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for rdao-codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors that can occur during code generation.
///
/// Every variant aborts the run; nothing is written once one is raised.
#[derive(Error, Debug)]
pub enum CodegenError {
    /// A declaration unit is not valid Rust
    #[error("Failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    /// A declaration that cannot be turned into metadata
    #[error("{location}: cannot extract `{name}`: {message}")]
    ExtractionError {
        name: String,
        location: String,
        message: String,
    },

    #[error("Cyclic embedding: {0}")]
    CyclicEmbeddingError(String),

    #[error("Field collision in `{entity}`: column `{column}` is declared by more than one embedded field")]
    FieldCollisionError { entity: String, column: String },

    #[error("Failed to render template `{template}`: {message}")]
    TemplateRenderError { template: String, message: String },

    #[error("Failed to write {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CodegenError {
    pub(crate) fn render(template: &str, err: impl std::fmt::Display) -> Self {
        CodegenError::TemplateRenderError {
            template: template.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for CodegenError {
    fn from(err: config::ConfigError) -> Self {
        CodegenError::ConfigError(err.to_string())
    }
}
