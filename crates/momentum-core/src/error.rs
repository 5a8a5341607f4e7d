//! Core error types for momentum-core.
//!
//! This module defines the error hierarchy using thiserror. Every operation
//! on the ledger surfaces failures to its immediate caller; nothing here is
//! recovered locally except optimistic-concurrency conflicts, which the
//! service retries a bounded number of times.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for momentum-core.
#[derive(Error, Debug)]
pub enum MomentumError {
    /// The store has no ledger for the user. The caller must create one first.
    #[error("Momentum ledger not found for user '{user_id}'")]
    LedgerNotFound { user_id: String },

    /// A persistence call failed
    #[error("Failed to write momentum ledger: {0}")]
    StoreWriteFailed(#[source] StoreError),

    /// A read from the store failed
    #[error("Failed to read from store: {0}")]
    StoreReadFailed(#[source] StoreError),

    /// Precondition violation (negative gain, negative elapsed time, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Every read-modify-write attempt lost a compare-and-swap race
    #[error("Ledger for user '{user_id}' kept changing underneath us ({attempts} attempts)")]
    ConcurrentModification { user_id: String, attempts: u32 },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by a ledger store or work-item source.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No row exists for the key
    #[error("No record for '{0}'")]
    NotFound(String),

    /// A row with the same key already exists
    #[error("Record for '{0}' already exists")]
    AlreadyExists(String),

    /// The record is not in a state that allows the operation
    #[error("{0}")]
    InvalidState(String),

    /// Compare-and-swap failed: the row version moved on
    #[error("Version conflict for '{user_id}': expected {expected}, found {actual}")]
    Conflict {
        user_id: String,
        expected: u64,
        actual: u64,
    },

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

    /// A stored column could not be decoded
    #[error("Corrupt column '{column}': {message}")]
    Corrupt { column: String, message: String },
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

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Momentum gain below zero
    #[error("Momentum gain must be >= 0, got {0}")]
    NegativeGain(i64),

    /// Elapsed hours below zero or not a number
    #[error("Elapsed hours must be a finite value >= 0, got {0}")]
    InvalidElapsedHours(f64),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg)
                if inner.code == rusqlite::ErrorCode::DatabaseBusy
                    || inner.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for MomentumError
pub type Result<T, E = MomentumError> = std::result::Result<T, E>;
