//! Core error types for focusflow-core.
//!
//! Most failures inside the core are swallowed and logged (storage reads fall
//! back to defaults, remote calls leave local state untouched). These types
//! exist for the boundaries where a caller does need to know: validation of
//! user input, the configuration file, and the remote client's own result.

use std::path::PathBuf;
use thiserror::Error;

/// Local storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the database file
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another process
    #[error("Database is locked")]
    Locked,

    /// The data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dotted key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Remote endpoint errors.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Remote sync is turned off in the configuration
    #[error("Remote sync is disabled")]
    Disabled,

    /// The configured endpoint is not a valid URL
    #[error("Invalid endpoint URL '{url}': {message}")]
    InvalidEndpoint { url: String, message: String },

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("Endpoint returned status {status}")]
    Status { status: u16 },

    /// Response body did not have the expected shape
    #[error("Malformed response for '{action}': {message}")]
    MalformedResponse { action: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Duration outside the accepted range
    #[error("Invalid duration for '{field}': {value} (must be between {min} and {max} minutes)")]
    DurationOutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// Unknown mode name
    #[error("Unknown mode: {0}")]
    UnknownMode(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg)
                if code.code == rusqlite::ErrorCode::DatabaseBusy
                    || code.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}
