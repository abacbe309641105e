use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use aspri::config::ApiConfig;
use aspri::remote::HttpTaskRemote;
use aspri::storage::{SqliteStore, TaskCache};
use aspri::task::Task;
use aspri::sync::TaskSync;

#[allow(dead_code)]
pub fn create_temp_store() -> (SqliteStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("aspri.db");
    let store = SqliteStore::new_with_path(db_path).expect("failed to create sqlite store with path");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Sync engine talking to `base_url`, cached in a fresh SQLite file seeded with `cached`
#[allow(dead_code)]
pub fn sync_against(base_url: &str, cached: &[Task]) -> (TaskSync, TempDir) {
    let (store, tmp) = create_temp_store();
    let cache = TaskCache::new(Arc::new(store));
    cache.save(cached).expect("failed to seed cache");

    let remote = HttpTaskRemote::new(&ApiConfig {
        base_url: base_url.to_string(),
        request_timeout_seconds: 5,
    })
    .expect("failed to build remote");

    (TaskSync::new(Arc::new(remote), cache), tmp)
}
