//! Error types for Aspri
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Aspri operations
///
/// Remote task failures, AI provider failures, storage problems and
/// configuration errors all surface through this enum. Callers that need to
/// tell categories apart downcast from `anyhow::Error`.
#[derive(Error, Debug)]
pub enum AspriError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote task service could not be reached or answered with a
    /// server-side failure
    #[error("Task service unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote task service rejected the request (validation or lookup)
    #[error("Task service rejected request ({status}): {message}")]
    RemoteRejected {
        /// HTTP status returned by the service
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// A task id that is not present in the list being mutated
    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    /// Input rejected before any store was touched
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Provider tag that matches none of the known adapters
    #[error("Unsupported AI provider: {0}")]
    UnsupportedProvider(String),

    /// Provider answered 2xx but the expected nesting was absent
    #[error("Unexpected {0} API response format")]
    UnexpectedResponseFormat(String),

    /// Provider answered with a non-2xx status
    #[error("{provider} API error: {status} - {body}")]
    ProviderStatus {
        /// Provider tag
        provider: String,
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Provider-related transport errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Free usage quota exhausted without an API key configured
    #[error("Usage limit reached: limit={limit}, {message}")]
    UsageLimitReached {
        /// The configured free usage limit
        limit: u32,
        /// Additional message explaining the failure
        message: String,
    },

    /// Imported data did not look like an Aspri backup
    #[error("Invalid backup data: {0}")]
    InvalidBackup(String),

    /// Named backup does not exist in the store
    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    /// Key-value storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl AspriError {
    /// Whether this error means the remote task service is out of reach
    ///
    /// Connectivity-class failures trigger the offline fallback; everything
    /// else is surfaced to the caller.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_) | Self::Http(_))
    }
}

/// Returns true when an `anyhow::Error` wraps a connectivity-class failure
pub fn is_connectivity_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<AspriError>()
        .map(AspriError::is_connectivity)
        .unwrap_or(false)
}

/// Result type alias for Aspri operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
