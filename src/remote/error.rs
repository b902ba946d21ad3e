use std::path::PathBuf;

use thiserror::Error;

/// Typed photo service errors enabling retry classification.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP request for {method} failed: {source}")]
    Http {
        method: String,
        source: reqwest::Error,
    },

    #[error("HTTP error {status} calling {method}")]
    HttpStatus { status: u16, method: String },

    #[error("{method} failed with code {code}: {message}")]
    Api {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed response from {method}: {source}")]
    Json {
        method: String,
        source: serde_json::Error,
    },

    #[error("Response from {method} is missing '{field}'")]
    MissingField { method: String, field: &'static str },
}

impl RemoteError {
    /// Whether this error is transient and worth retrying.
    ///
    /// Garbled responses count as transient: the service occasionally returns
    /// truncated bodies under load.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Http { .. } => true,
            RemoteError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            RemoteError::Json { .. } => true,
            RemoteError::Api { .. } => false,
            RemoteError::Io { .. } => false,
            RemoteError::MissingField { .. } => false,
        }
    }
}
