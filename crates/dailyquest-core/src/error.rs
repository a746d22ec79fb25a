//! Core error types for dailyquest-core.
//!
//! Rule outcomes caused by user actions live in [`ProgressError`]; they are
//! expected and recoverable, and the engine guarantees that none of them
//! leaves a partially applied mutation behind. Infrastructure failures
//! (storage, configuration) are kept in their own enums and aggregated by
//! [`CoreError`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for dailyquest-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A progression rule rejected the action
    #[error(transparent)]
    Rule(#[from] ProgressError),

    /// Persistence-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Expected, recoverable outcomes of user actions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressError {
    #[error("No unspent stat points")]
    InsufficientPoints,

    #[error("No crates available")]
    NoCratesAvailable,

    #[error("Day {date} is not closed")]
    NotClosed { date: String },

    #[error("Day {date} is already closed")]
    AlreadyClosed { date: String },

    #[error("Unlocking a closed day requires a justification")]
    JustificationRequired,

    #[error("Week {week} has already been claimed")]
    AlreadyClaimed { week: String },

    #[error("Weekly challenge {week} is not met yet")]
    ChallengeNotMet { week: String },

    /// Edit attempted on a closed day without unlocking it first
    #[error("Day {date} is closed; unlock it before editing")]
    DayLocked { date: String },

    #[error("Quest '{quest_id}' is not part of {date}")]
    UnknownQuest { date: String, quest_id: String },

    #[error("The boss of {month} is already defeated")]
    BossAlreadyDefeated { month: String },

    #[error("Title '{0}' is not owned")]
    UnknownTitle(String),

    #[error("Invalid date key '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// Persistence-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
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

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Stored document could not be encoded or decoded
    #[error("State document error: {0}")]
    Document(#[from] serde_json::Error),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[from] std::io::Error),
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

    /// Dot-path key does not exist
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
