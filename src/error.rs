//! Error types for the tracker core
//!
//! None of these ever reach the host: the store adapter swallows
//! `StorageError`, and the manager recovers from `ParseError` by starting
//! a fresh profile. They exist so each failure is typed where it happens
//! and logged with a useful message.

use thiserror::Error;

/// Faults raised by a key-value backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// Storage is disabled or otherwise not reachable
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Backend refused the write because it is full
    #[error("storage quota exceeded while writing {key} ({bytes} bytes)")]
    QuotaExceeded { key: String, bytes: usize },

    /// Key cannot be represented by the backend
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Underlying I/O failure
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized before writing
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A stored value that is not a readable profile
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("profile is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("profile must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Configuration file problems
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("debounce window must be greater than zero")]
    ZeroDebounce,

    #[error("storage key must not be empty")]
    EmptyStorageKey,
}
