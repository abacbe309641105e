use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entry in the backup history list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Store key the backup document is saved under
    pub name: String,
    /// When the backup was taken
    pub timestamp: DateTime<Utc>,
    /// Size of the backup document in UTF-16 bytes
    pub size: usize,
}

/// Usage figures for the local store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageStats {
    /// Total size of all entries in UTF-16 bytes
    pub total_bytes: usize,
    /// Share of the nominal 5 MiB quota in use, capped at 100
    pub usage_percent: f64,
    /// Number of cached tasks
    pub task_count: usize,
    /// Number of cached tasks marked completed
    pub completed_count: usize,
    /// Latest `updatedAt`/`createdAt` among cached tasks
    pub last_modified: Option<DateTime<Utc>>,
}
