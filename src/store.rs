//! # Store Module
//!
//! Key/value persistence behind the TTL cache entries. Each render is a fresh
//! process, so entries must outlive the process that wrote them.
//!
//! - [`crate::db::SqliteStore`]: default, shared with concurrent sessions via WAL
//! - [`FileStore`]: one JSON file per key, replaced with write-temp-then-rename
//! - [`MemoryStore`]: process-local, used by tests and `--cache memory`

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Raw string storage keyed by cache slot name.
///
/// Writers must replace a value atomically: a concurrent reader sees either
/// the previous value or the new one, never a partial write.
pub trait CacheStore {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: CacheStore + ?Sized> CacheStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        (**self).save(key, value)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory of `<hash>.json` files, one per cache key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys embed working directories, so they are hashed into safe file names.
    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        let name: String = format!("{:x}", digest).chars().take(24).collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl CacheStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read cache file {}", path.display())),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create cache dir {}", self.dir.display()))?;
        let target = self.path_for(key);

        // Temp file lives in the same directory so the rename stays on one filesystem.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).context("create temp file")?;
        tmp.write_all(value.as_bytes()).context("write temp file")?;
        tmp.flush()?;
        tmp.persist(&target)
            .map_err(|e| e.error)
            .with_context(|| format!("replace cache file {}", target.display()))?;
        Ok(())
    }
}
