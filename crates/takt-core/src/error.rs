//! Core error types for takt-core.
//!
//! Most foreseeable conditions (pausing an idle timer, logging past the end of
//! a chain, an empty recommendation) are not errors at all: the engines return
//! `None`. The types here cover storage, configuration and input parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for takt-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Event store errors that could not be tolerated
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Malformed deep link
    #[error("Invalid deep link: {0}")]
    DeepLink(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Errors surfaced by an [`EventStore`](crate::storage::EventStore).
///
/// Write failures are tolerated by the engines (the entry is dropped and a
/// warning logged). Corruption is the one fatal signal that propagates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A single write did not go through
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// A query could not run, e.g. the database was busy
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// The referenced record does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Stored data could not be read back
    #[error("store corrupted: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Whether the caller must stop and report instead of carrying on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Corrupted(_))
    }

    /// Classify an error raised by a read-only query.
    pub fn from_read(err: rusqlite::Error) -> Self {
        match StoreError::from(err) {
            StoreError::WriteFailed(message) => StoreError::ReadFailed(message),
            other => other,
        }
    }
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

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Empty field
    #[error("'{0}' must not be empty")]
    Empty(&'static str),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::FromSqlConversionFailure(_, _, _)
            | rusqlite::Error::InvalidColumnType(_, _, _)
            | rusqlite::Error::IntegralValueOutOfRange(_, _) => {
                StoreError::Corrupted(err.to_string())
            }
            rusqlite::Error::SqliteFailure(inner, _)
                if inner.code == rusqlite::ErrorCode::DatabaseCorrupt
                    || inner.code == rusqlite::ErrorCode::NotADatabase =>
            {
                StoreError::Corrupted(err.to_string())
            }
            _ => StoreError::WriteFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
