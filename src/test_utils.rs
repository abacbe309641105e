//! Test utilities for Aspri
//!
//! Shared helpers for unit tests: stores pre-populated with tasks and
//! error assertions.

use crate::error::Result;
use crate::storage::{write_json, MemoryStore, SqliteStore, TASKS_KEY};
use crate::task::Task;
use std::sync::Arc;
use tempfile::TempDir;

/// In-memory store whose task cache holds `tasks`
pub fn store_with_tasks(tasks: &[Task]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    write_json(store.as_ref(), TASKS_KEY, tasks).expect("Failed to seed task cache");
    store
}

/// SQLite store in a fresh temporary directory
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn temp_sqlite_store() -> (SqliteStore, TempDir) {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    let store =
        SqliteStore::new_with_path(dir.path().join("aspri.db")).expect("Failed to open store");
    (store, dir)
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T: std::fmt::Debug>(result: Result<T>, expected: &str) {
    match result {
        Ok(value) => panic!("Expected error containing '{}', got Ok({:?})", expected, value),
        Err(e) => {
            let message = format!("{:#}", e);
            assert!(
                message.contains(expected),
                "Expected error containing '{}', got '{}'",
                expected,
                message
            );
        }
    }
}
