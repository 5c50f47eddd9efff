use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One cached payload plus when it was written.
///
/// Staleness never deletes anything - a stale entry stays around so callers
/// can fall back to it when a live fetch fails.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// Unix seconds at write time
    pub stored_at: i64,
    pub payload: T,
}

impl<T> CacheEntry<T> {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        let age = Utc::now().timestamp() - self.stored_at;
        age >= 0 && (age as u64) < ttl.as_secs()
    }
}

/// Persistent key/value store with TTL metadata.
///
/// SQLite was chosen because:
/// - Zero-config embedded database
/// - Survives across runs, which is the whole point
/// - Doesn't require a separate process
///
/// Reads and writes are best-effort: a broken or unavailable store degrades
/// to "no cache" behavior instead of surfacing errors to fetch paths.
pub struct CacheStore {
    conn: Mutex<Connection>,
}

impl CacheStore {
    pub fn open(db_path: &str) -> Result<Self, CacheError> {
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Throwaway store for tests and cache-less fallback.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS entries (
                key TEXT PRIMARY KEY,
                stored_at INTEGER NOT NULL,
                payload TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Read an entry, fresh or stale. Returns None on miss, corrupt row, or
    /// any storage failure.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        match self.try_get(key) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("cache read for {} failed: {}", key, e);
                None
            }
        }
    }

    /// Write an entry, stamping it with the current time. Failures are
    /// logged and dropped.
    pub fn set<T: Serialize>(&self, key: &str, payload: &T) {
        self.set_at(key, payload, Utc::now().timestamp());
    }

    /// Write an entry with an explicit timestamp.
    pub fn set_at<T: Serialize>(&self, key: &str, payload: &T, stored_at: i64) {
        if let Err(e) = self.try_set(key, payload, stored_at) {
            debug!("cache write for {} failed: {}", key, e);
        }
    }

    fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CacheEntry<T>>, CacheError> {
        // A poisoned lock means a writer panicked mid-statement; the
        // connection itself is still usable, so recover the guard.
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT stored_at, payload FROM entries WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((stored_at, payload)) => {
                let payload: T = serde_json::from_str(&payload)?;
                Ok(Some(CacheEntry { stored_at, payload }))
            }
            None => Ok(None),
        }
    }

    fn try_set<T: Serialize>(&self, key: &str, payload: &T, stored_at: i64) -> Result<(), CacheError> {
        let payload = serde_json::to_string(payload)?;
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO entries (key, stored_at, payload) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET stored_at = ?2, payload = ?3",
            params![key, stored_at, payload],
        )?;
        Ok(())
    }

    /// User preferences share the store under their own key namespace.
    pub fn get_pref(&self, name: &str) -> Option<String> {
        self.get::<String>(&format!("prefs:{}", name))
            .map(|entry| entry.payload)
    }

    pub fn set_pref(&self, name: &str, value: &str) {
        self.set(&format!("prefs:{}", name), &value.to_string());
    }
}
