//! SQLite-backed cache store shared by every statusline process on the machine.
//!
//! This module provides:
//! - Database initialization with schema versioning
//! - Atomic per-key replacement via a single UPSERT statement
//! - Concurrent access support via WAL mode and a busy timeout

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::store::CacheStore;

/// Get the database file path
///
/// Checks `CLAUDE_STATUSLINE_DB_PATH` environment variable first,
/// falls back to `~/.claude/statusline.db`
pub fn default_db_path() -> Result<PathBuf> {
    if let Ok(custom_path) = env::var("CLAUDE_STATUSLINE_DB_PATH") {
        return Ok(PathBuf::from(custom_path));
    }

    let base_dirs = directories::BaseDirs::new().context("Failed to find home directory")?;
    Ok(base_dirs.home_dir().join(".claude").join("statusline.db"))
}

/// Open database connection with WAL mode and retry logic
///
/// Retries "database locked" errors with a short linear backoff.
fn open_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    let mut attempts = 0;
    let max_attempts = 3;

    loop {
        match Connection::open(db_path) {
            Ok(conn) => {
                conn.pragma_update(None, "journal_mode", "WAL")?;
                conn.pragma_update(None, "busy_timeout", 2000)?;
                init_schema(&conn)?;
                return Ok(conn);
            }
            Err(e) if e.to_string().contains("locked") && attempts < max_attempts => {
                attempts += 1;
                thread::sleep(Duration::from_millis(50 * attempts));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Initialize database schema
///
/// Creates tables if they don't exist and records the schema version.
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS cache_entries (
            cache_key TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        INSERT OR IGNORE INTO metadata (key, value) VALUES ('schema_version', '1');",
    )?;
    Ok(())
}

pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let conn =
            open_db(&path).with_context(|| format!("open cache db {}", path.display()))?;
        Ok(Self { conn, path })
    }

    /// Open the database at [`default_db_path`].
    pub fn open_default() -> Result<Self> {
        Self::open(default_db_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let result = self
            .conn
            .query_row(
                "SELECT data FROM cache_entries WHERE cache_key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(result)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO cache_entries (cache_key, data, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(cache_key) DO UPDATE SET
                 data = excluded.data,
                 updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }
}
