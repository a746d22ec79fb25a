mod config;
pub mod database;
pub mod migrations;

pub use config::{
    Config, ContinuityConfig, JournalConfig, ProgressionConfig, RewardsConfig,
};
pub use database::{Database, MemoryStore};

use std::path::PathBuf;

use serde_json::Value;

use crate::error::StorageError;
use crate::state::TrackerState;

/// Key under which the tracker document is stored.
pub const STATE_KEY: &str = "tracker_state";

/// Persistence collaborator for the tracker document.
///
/// `load` returns the raw document so the caller can run
/// [`migrations::migrate`] on it; `None` means nothing was saved yet.
pub trait StateStore {
    fn load(&self) -> Result<Option<Value>, StorageError>;
    fn save(&self, state: &TrackerState) -> Result<(), StorageError>;
}

/// Returns `~/.config/dailyquest[-dev]/` based on DAILYQUEST_ENV.
///
/// Set DAILYQUEST_ENV=dev to use development data directory.
/// DAILYQUEST_HOME overrides both.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("DAILYQUEST_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("DAILYQUEST_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("dailyquest-dev")
            } else {
                base_dir.join("dailyquest")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
