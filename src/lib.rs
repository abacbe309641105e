//! Aspri - offline-first to-do list library
//!
//! This library provides the core functionality behind the `aspri` CLI: a
//! task list that keeps working when its REST service is down, category
//! normalisation across English, Indonesian and Japanese labels, and thin
//! clients for four AI providers.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `sync`: Remote-first task synchronisation with a local cache fallback,
//!   plus the filtered per-screen views
//! - `remote`: HTTP client for the task service
//! - `storage`: Key-value store abstraction, the task cache and backups
//! - `task`: Task records shared by the service and the cache
//! - `category`: Language-independent category keys
//! - `ai`: AI provider bridge and the assistant conversation
//! - `formalize`: Text formalisation with an offline fallback
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use aspri::remote::HttpTaskRemote;
//! use aspri::storage::{SqliteStore, TaskCache};
//! use aspri::sync::{TaskSync, TaskView, ViewFilter};
//! use aspri::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let remote = Arc::new(HttpTaskRemote::new(&config.api)?);
//!     let cache = TaskCache::new(Arc::new(SqliteStore::new()?));
//!     let mut today = TaskView::new(Arc::new(TaskSync::new(remote, cache)), ViewFilter::Today);
//!
//!     for task in today.fetch().await? {
//!         println!("{} {}", task.id, task.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod category;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod formalize;
pub mod locale;
pub mod remote;
pub mod storage;
pub mod sync;
pub mod task;

// Re-export commonly used types
pub use ai::{AiBridge, AiRequest, ProviderKind};
pub use config::Config;
pub use error::{AspriError, Result};
pub use sync::{TaskSync, TaskView, ViewFilter};
pub use task::{NewTask, Task, TaskUpdate};

#[cfg(test)]
pub mod test_utils;
