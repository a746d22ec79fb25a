//! SQLite-backed state storage.
//!
//! The tracker document lives as JSON text in a small key-value table;
//! everything else about the schema is owned by [`super::migrations`] at the
//! document level.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use rusqlite::{params, Connection};
use serde_json::Value;

use super::{data_dir, StateStore, STATE_KEY};
use crate::error::StorageError;
use crate::state::TrackerState;

/// SQLite database holding the tracker document.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/dailyquest.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(&data_dir()?.join("dailyquest.db"))
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl StateStore for Database {
    fn load(&self) -> Result<Option<Value>, StorageError> {
        match self.kv_get(STATE_KEY)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &TrackerState) -> Result<(), StorageError> {
        let text = serde_json::to_string(state)?;
        self.kv_set(STATE_KEY, &text)?;
        Ok(())
    }
}

/// In-process store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with raw document text, valid or not.
    pub fn with_raw(text: impl Into<String>) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(text.into()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<Value>, StorageError> {
        match self.slot.borrow().as_deref() {
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &TrackerState) -> Result<(), StorageError> {
        *self.slot.borrow_mut() = Some(serde_json::to_string(state)?);
        Ok(())
    }
}
