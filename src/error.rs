// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Document reader error: {0}")]
    Reader(String),

    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("OpenAI API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No persisted index found at {0}")]
    IndexNotFound(PathBuf),

    #[error("Persisted index at {path} is unusable: {message}")]
    IndexCorrupt { path: PathBuf, message: String },
}

impl RagError {
    /// Whether a retry of the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RagError::Api { status, .. } => *status == 429 || *status >= 500,
            RagError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}
