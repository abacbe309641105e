//! Local key-value storage
//!
//! Everything Aspri keeps on the device (the offline task cache, the
//! assistant conversation, counters, backups) lives in a flat string-keyed
//! store. Values are JSON text written and read whole; there are no partial
//! writes and no indexes.
//!
//! The store is injected as a [`KeyValueStore`] trait object so the CLI can
//! use [`SqliteStore`] while tests substitute [`MemoryStore`].

use crate::error::{AspriError, Result};
use crate::task::Task;
use anyhow::Context;
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub mod backup;
pub mod types;

pub use backup::BackupManager;
pub use types::{BackupEntry, StorageStats};

/// Key holding the cached task array
pub const TASKS_KEY: &str = "todo_tasks";

/// Synchronous string key-value store
///
/// Implementations must make `set` durable before returning; callers rely on
/// a subsequent `get` observing the write.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently present, in ascending order
    fn keys(&self) -> Result<Vec<String>>;
}

/// Read and decode a JSON value, treating corrupt data as absent
///
/// A value that fails to parse is logged and reported as `None`; the caller
/// falls back to its empty state. Storage failures still propagate.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding unparseable stored value");
            Ok(None)
        }
    }
}

/// Encode a value as JSON and store it
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize value for key {}", key))?;
    store.set(key, &raw)
}

/// In-memory store used by tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: RwLock::new(map),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AspriError::Storage("Failed to acquire read lock".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AspriError::Storage("Failed to acquire write lock".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AspriError::Storage("Failed to acquire write lock".to_string()))?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AspriError::Storage("Failed to acquire read lock".to_string()))?;
        Ok(entries.keys().cloned().collect())
    }
}

/// SQLite-backed store for the command-line client
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open the store in the user's data directory
    ///
    /// `ASPRI_STORAGE_PATH` overrides the location.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("ASPRI_STORAGE_PATH") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "aspri", "aspri")
            .ok_or_else(|| AspriError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| AspriError::Storage(e.to_string()))?;

        Self::new_with_path(data_dir.join("aspri.db"))
    }

    /// Open the store at a specific database path
    ///
    /// # Examples
    ///
    /// ```
    /// use aspri::storage::{KeyValueStore, SqliteStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteStore::new_with_path(dir.path().join("aspri.db")).unwrap();
    /// store.set("greeting", "\"hello\"").unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| AspriError::Storage(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| AspriError::Storage(e.to_string()).into())
    }

    fn init(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| AspriError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connect()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get(0)
            })
            .optional()
            .context("Failed to query value")
            .map_err(|e| AspriError::Storage(e.to_string()))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connect()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )
        .context("Failed to write value")
        .map_err(|e| AspriError::Storage(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM kv WHERE key = ?", params![key])
            .context("Failed to delete value")
            .map_err(|e| AspriError::Storage(e.to_string()))?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT key FROM kv ORDER BY key")
            .context("Failed to prepare key listing")
            .map_err(|e| AspriError::Storage(e.to_string()))?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("Failed to list keys")
            .map_err(|e| AspriError::Storage(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AspriError::Storage(e.to_string()))?;
        Ok(keys)
    }
}

/// The offline copy of the task list
///
/// Wraps a key-value store and always reads and writes the whole array
/// under [`TASKS_KEY`].
#[derive(Clone)]
pub struct TaskCache {
    store: Arc<dyn KeyValueStore>,
}

impl TaskCache {
    /// Create a cache over the given store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Load every cached task; corrupt or missing data reads as empty
    pub fn load(&self) -> Result<Vec<Task>> {
        let tasks: Vec<Task> = read_json(self.store.as_ref(), TASKS_KEY)?.unwrap_or_default();
        tracing::debug!(count = tasks.len(), "Loaded tasks from local cache");
        Ok(tasks)
    }

    /// Replace the cached task list
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        tracing::debug!(count = tasks.len(), "Saving tasks to local cache");
        write_json(self.store.as_ref(), TASKS_KEY, tasks)
    }

    /// Load, mutate and persist the cached list in one step
    pub fn modify<R>(&self, f: impl FnOnce(&mut Vec<Task>) -> R) -> Result<R> {
        let mut tasks = self.load()?;
        let result = f(&mut tasks);
        self.save(&tasks)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::tempdir;

    fn create_test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let db_path = dir.path().join("aspri.db");
        let store = SqliteStore::new_with_path(db_path).expect("failed to create store");
        (store, dir)
    }

    #[test]
    fn test_sqlite_store_init_creates_table() {
        let (store, _dir) = create_test_store();
        let conn = Connection::open(store.path()).expect("open connection");
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='kv'",
                [],
                |r| r.get(0),
            )
            .expect("query row");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_sqlite_set_get_overwrite_remove() {
        let (store, _dir) = create_test_store();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        store.remove("a").unwrap();
    }

    #[test]
    fn test_sqlite_keys_sorted() {
        let (store, _dir) = create_test_store();
        store.set("b", "1").unwrap();
        store.set("a", "1").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_sqlite_persists_across_instances() {
        let (store, dir) = create_test_store();
        store.set(TASKS_KEY, "[]").unwrap();

        let reopened = SqliteStore::new_with_path(dir.path().join("aspri.db")).unwrap();
        assert_eq!(reopened.get(TASKS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    #[serial]
    fn test_new_respects_env_override() {
        let dir = tempdir().expect("failed to create tempdir");
        let db_path = dir.path().join("nested").join("aspri.db");
        env::set_var("ASPRI_STORAGE_PATH", db_path.to_string_lossy().to_string());

        let store = SqliteStore::new().expect("new failed with env override");
        assert_eq!(store.path(), db_path.as_path());
        assert!(db_path.parent().unwrap().exists());

        env::remove_var("ASPRI_STORAGE_PATH");
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.keys().unwrap(), vec!["k".to_string()]);
        store.remove("k").unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_task_cache_corrupt_reads_empty() {
        let store = Arc::new(MemoryStore::with_entries([(TASKS_KEY, "{not json")]));
        let cache = TaskCache::new(store);
        assert!(cache.load().unwrap().is_empty());
    }

    #[test]
    fn test_task_cache_missing_reads_empty() {
        let cache = TaskCache::new(Arc::new(MemoryStore::new()));
        assert!(cache.load().unwrap().is_empty());
    }

    #[test]
    fn test_task_cache_modify_persists() {
        let store = Arc::new(MemoryStore::new());
        let cache = TaskCache::new(store.clone());
        cache.save(&[Task::new(1, "Buy milk")]).unwrap();

        cache
            .modify(|tasks| tasks.push(Task::new(2, "Walk dog")))
            .unwrap();

        let raw = store.get(TASKS_KEY).unwrap().unwrap();
        let tasks: Vec<Task> = serde_json::from_str(&raw).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].title, "Walk dog");
    }

    #[test]
    fn test_task_cache_over_sqlite() {
        let (store, _dir) = create_test_store();
        let cache = TaskCache::new(Arc::new(store));
        cache.save(&[Task::new(5, "Stored")]).unwrap();
        assert_eq!(cache.load().unwrap(), vec![Task::new(5, "Stored")]);
    }
}
