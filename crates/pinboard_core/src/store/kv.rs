//! On-device key-value persistence.
//!
//! # Responsibility
//! - Provide the synchronous local store that holds whole serialized
//!   collections under fixed keys.
//! - Decode stored JSON leniently: missing or malformed values read as the
//!   type's default.
//!
//! # Invariants
//! - `set` replaces the full value for a key in one statement.
//! - `remove` of an absent key is a no-op.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::store::{lock, StoreResult};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// Synchronous string key-value store.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// SQLite-backed key-value store.
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
}

impl SqliteKvStore {
    /// Opens the store file, bringing its schema up to date.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        open_db(path).map(Self::from_connection)
    }

    pub fn open_in_memory() -> DbResult<Self> {
        open_db_in_memory().map(Self::from_connection)
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = lock(&self.conn);
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = lock(&self.conn);
        conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = lock(&self.conn);
        conn.execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// Process-local key-value store.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// Reads a JSON value, degrading missing or corrupt content to `T::default()`.
///
/// Backend failures still propagate.
pub fn read_json<T>(kv: &dyn KvStore, key: &str) -> StoreResult<T>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = kv.get(key)? else {
        return Ok(T::default());
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(
                "event=kv_read module=store status=corrupt key={key} bytes={} error={err}",
                raw.len()
            );
            Ok(T::default())
        }
    }
}

/// Serializes and stores a JSON value under `key`.
pub fn write_json<T>(kv: &dyn KvStore, key: &str, value: &T) -> StoreResult<()>
where
    T: Serialize + ?Sized,
{
    let encoded = serde_json::to_string(value)?;
    kv.set(key, &encoded)
}
