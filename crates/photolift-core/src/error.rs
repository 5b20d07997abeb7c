//! Error types for the migration engine.
//!
//! Errors fall into three classes: fatal (the run aborts), record-level
//! (one sub-record is skipped) and field-level (one slot is skipped). The
//! class is decided by the boundary that catches the error, except for the
//! fatal kinds which [`MigrateError::is_fatal`] identifies.

use thiserror::Error;

/// Main error type for photolift.
#[derive(Debug, Error)]
pub enum MigrateError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Rate limited by {service}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    // Blob store errors
    #[error("Download failed {status}")]
    DownloadFailed { status: u16 },

    #[error("Upload failed for {key} (status {status:?}): {message}")]
    UploadFailed {
        key: String,
        status: Option<u16>,
        message: String,
    },

    // Document store errors
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Document store error (status {status}): {message}")]
    Database { status: u16, message: String },

    // Configuration errors
    #[error("Missing environment variables: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    #[error("Configuration error: {message}")]
    Config { message: String },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for photolift operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

impl From<serde_json::Error> for MigrateError {
    fn from(err: serde_json::Error) -> Self {
        MigrateError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for MigrateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MigrateError::Timeout(err.to_string())
        } else {
            MigrateError::Network {
                message: err.to_string(),
                source: Some(err),
            }
        }
    }
}

impl MigrateError {
    /// Whether this error must abort the whole run.
    ///
    /// Only configuration and authentication failures are fatal. Enumeration
    /// failures are promoted to fatal by the orchestrator itself, since the
    /// same `Database` error is merely record-level during traversal.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MigrateError::MissingConfig(_) | MigrateError::Config { .. } | MigrateError::Auth { .. }
        )
    }
}
