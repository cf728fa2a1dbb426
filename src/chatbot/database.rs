//! Persistent SQLite store for user profiles.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::chatbot::gateways::{ProfileStore, StoreError};
use crate::chatbot::profile::UserProfile;

/// Profiles stored as JSON documents keyed by sender id.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Create a new in-memory database.
    pub fn new() -> Result<Self, StoreError> {
        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Open the database file, creating it if needed.
    pub fn load_or_new(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Self {
            conn: Mutex::new(Connection::open(path)?),
        };
        db.init_schema()?;
        info!("Loaded database from {:?} ({} profiles)", path, db.count()?);
        Ok(db)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.lock().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Ids of all stored profiles, oldest update first.
    pub fn user_ids(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT user_id FROM profiles ORDER BY updated_at, user_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

impl ProfileStore for Database {
    fn get(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let data: Option<String> = self
            .lock()
            .query_row(
                "SELECT data FROM profiles WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn put(&self, user_id: &str, profile: &UserProfile) -> Result<(), StoreError> {
        let json = serde_json::to_string(profile)?;
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.lock().execute(
            "INSERT OR REPLACE INTO profiles (user_id, data, updated_at) VALUES (?1, ?2, ?3)",
            params![user_id, json, now],
        )?;
        debug!("Saved profile {user_id} at step {}", profile.step);
        Ok(())
    }
}
