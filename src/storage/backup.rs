//! Export, import and snapshot management for the local store

use super::types::{BackupEntry, StorageStats};
use super::{read_json, write_json, KeyValueStore, TaskCache, TASKS_KEY};
use crate::error::{AspriError, Result};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Keys that belong to Aspri and travel with exports and backups
pub const KNOWN_KEYS: &[&str] = &[
    "tasks",
    TASKS_KEY,
    "completedTasks",
    "aspri_messages",
    "aspri_config",
    "userName",
    "selectedLanguage",
    "formalization_api_key",
    "formalization_count",
    "aspri_free_count",
    "completed_ai_tasks",
];

/// Keys that survive [`BackupManager::clear`]
const PRESERVED_ON_CLEAR: &[&str] = &["userName", "selectedLanguage"];

/// Key holding the backup history list
pub const BACKUP_HISTORY_KEY: &str = "backup_history";

/// Number of backups retained in history
pub const MAX_BACKUPS: usize = 10;

/// Nominal quota the usage percentage is measured against
pub const MAX_STORAGE_BYTES: usize = 5 * 1024 * 1024;

/// Backup and restore over a key-value store
pub struct BackupManager {
    store: Arc<dyn KeyValueStore>,
}

impl BackupManager {
    /// Create a manager over the given store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Serialize every present known key into one pretty-printed JSON object
    ///
    /// Values that parse as JSON are embedded structurally; anything else is
    /// embedded as a string.
    pub fn export(&self) -> Result<String> {
        let mut document = Map::new();
        for key in KNOWN_KEYS {
            if let Some(raw) = self.store.get(key)? {
                let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                document.insert((*key).to_string(), value);
            }
        }
        Ok(serde_json::to_string_pretty(&Value::Object(document))?)
    }

    /// Load an exported document back into the store
    ///
    /// Only known keys are written. Strings are stored verbatim, every other
    /// JSON value is stored as its serialized text.
    ///
    /// # Errors
    ///
    /// Returns `AspriError::InvalidBackup` if the input is not a JSON object
    /// containing at least one known key
    pub fn import(&self, json: &str) -> Result<()> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| AspriError::InvalidBackup(format!("not valid JSON: {}", e)))?;
        let Value::Object(document) = value else {
            return Err(AspriError::InvalidBackup("expected a JSON object".to_string()).into());
        };

        if !KNOWN_KEYS.iter().any(|key| document.contains_key(*key)) {
            return Err(
                AspriError::InvalidBackup("no recognised storage keys".to_string()).into(),
            );
        }

        let mut imported = 0usize;
        for (key, value) in document {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                tracing::debug!(key = %key, "Skipping unknown key during import");
                continue;
            }
            let raw = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            self.store.set(&key, &raw)?;
            imported += 1;
        }

        tracing::info!(imported, "Imported storage keys");
        Ok(())
    }

    /// Snapshot the current state under a new backup key
    ///
    /// The newest entry goes first in the history; entries beyond
    /// [`MAX_BACKUPS`] are dropped and their documents removed.
    pub fn create_backup(&self) -> Result<BackupEntry> {
        let document = self.export()?;
        let now = Utc::now();

        let base = format!(
            "backup_{}",
            now.to_rfc3339_opts(SecondsFormat::Micros, true)
        );
        let mut name = base.clone();
        let mut suffix = 1;
        while self.store.get(&name)?.is_some() {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        self.store.set(&name, &document)?;

        let entry = BackupEntry {
            name,
            timestamp: now,
            size: utf16_bytes(&document),
        };

        let mut history = self.history()?;
        history.insert(0, entry.clone());
        if history.len() > MAX_BACKUPS {
            for evicted in history.split_off(MAX_BACKUPS) {
                tracing::debug!(name = %evicted.name, "Evicting old backup");
                self.store.remove(&evicted.name)?;
            }
        }
        write_json(self.store.as_ref(), BACKUP_HISTORY_KEY, &history)?;

        tracing::info!(name = %entry.name, size = entry.size, "Created backup");
        Ok(entry)
    }

    /// Backup history, newest first
    pub fn history(&self) -> Result<Vec<BackupEntry>> {
        Ok(read_json(self.store.as_ref(), BACKUP_HISTORY_KEY)?.unwrap_or_default())
    }

    /// Restore a named backup, snapshotting the current state first
    ///
    /// # Errors
    ///
    /// Returns `AspriError::BackupNotFound` if no backup has that name
    pub fn restore(&self, name: &str) -> Result<()> {
        let document = self
            .store
            .get(name)?
            .ok_or_else(|| AspriError::BackupNotFound(name.to_string()))?;

        self.create_backup()?;
        self.import(&document)?;

        tracing::info!(name, "Restored backup");
        Ok(())
    }

    /// Usage statistics for the whole store
    pub fn stats(&self) -> Result<StorageStats> {
        let mut total_bytes = 0usize;
        for key in self.store.keys()? {
            let value = self.store.get(&key)?.unwrap_or_default();
            total_bytes += utf16_bytes(&key) + utf16_bytes(&value);
        }

        let tasks = TaskCache::new(self.store.clone()).load()?;
        let last_modified = tasks
            .iter()
            .filter_map(|t| t.updated_at.or(t.created_at))
            .max();

        Ok(StorageStats {
            total_bytes,
            usage_percent: (total_bytes as f64 / MAX_STORAGE_BYTES as f64 * 100.0).min(100.0),
            task_count: tasks.len(),
            completed_count: tasks.iter().filter(|t| t.completed).count(),
            last_modified,
        })
    }

    /// Back up, then wipe every known key except the user's name and language
    pub fn clear(&self) -> Result<BackupEntry> {
        let backup = self.create_backup()?;
        for key in KNOWN_KEYS {
            if !PRESERVED_ON_CLEAR.contains(key) {
                self.store.remove(key)?;
            }
        }
        tracing::info!("Cleared local data");
        Ok(backup)
    }
}

/// Size of a string the way browser storage accounts for it
fn utf16_bytes(s: &str) -> usize {
    s.encode_utf16().count() * 2
}

/// Human readable byte count (`1.5 KB`)
pub fn format_bytes(bytes: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}
