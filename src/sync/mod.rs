//! Offline-first task synchronisation
//!
//! [`TaskSync`] puts the remote task service in front of the local cache.
//! Every operation tries the remote first and degrades to the cache when
//! the service cannot be reached. Online mutations are followed by a fresh
//! `list` so callers always see the service's view of the data.
//!
//! The service itself keeps no mode; callers pass the [`Mode`] they are in
//! and get back the mode the operation ended in. [`TaskView`] tracks that
//! per screen.

pub mod view;

pub use view::{SearchField, TaskView, ViewFilter};

use crate::error::{is_connectivity_error, AspriError, Result};
use crate::remote::TaskRemote;
use crate::storage::TaskCache;
use crate::task::{NewTask, Task, TaskUpdate};
use chrono::Utc;
use std::sync::Arc;

/// Whether the caller is talking to the remote service or the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Online,
    Offline,
}

impl Mode {
    pub fn is_offline(self) -> bool {
        self == Mode::Offline
    }
}

/// Task list produced by an operation, with the mode it ended in
#[derive(Debug, Clone, PartialEq)]
pub struct Synced {
    pub tasks: Vec<Task>,
    pub mode: Mode,
}

/// Remote-first task service with a local cache fallback
#[derive(Clone)]
pub struct TaskSync {
    remote: Arc<dyn TaskRemote>,
    cache: TaskCache,
}

impl TaskSync {
    pub fn new(remote: Arc<dyn TaskRemote>, cache: TaskCache) -> Self {
        Self { remote, cache }
    }

    /// The local cache backing this service
    pub fn cache(&self) -> &TaskCache {
        &self.cache
    }

    /// Load the task list
    ///
    /// A successful remote list replaces the cache. Any remote failure reads
    /// the cache instead and reports [`Mode::Offline`]. Only storage errors
    /// are returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use aspri::config::ApiConfig;
    /// use aspri::remote::HttpTaskRemote;
    /// use aspri::storage::{MemoryStore, TaskCache};
    /// use aspri::sync::{Mode, TaskSync};
    /// use aspri::task::Task;
    ///
    /// # tokio_test::block_on(async {
    /// let cache = TaskCache::new(Arc::new(MemoryStore::new()));
    /// cache.save(&[Task::new(1, "Buy milk")]).unwrap();
    ///
    /// let remote = HttpTaskRemote::new(&ApiConfig {
    ///     base_url: "http://127.0.0.1:9/api".to_string(),
    ///     request_timeout_seconds: 2,
    /// })
    /// .unwrap();
    /// let sync = TaskSync::new(Arc::new(remote), cache);
    ///
    /// let synced = sync.fetch().await.unwrap();
    /// assert_eq!(synced.mode, Mode::Offline);
    /// assert_eq!(synced.tasks[0].title, "Buy milk");
    /// # });
    /// ```
    pub async fn fetch(&self) -> Result<Synced> {
        match self.remote.list().await {
            Ok(tasks) => {
                self.cache.save(&tasks)?;
                tracing::debug!(count = tasks.len(), "Fetched tasks from task service");
                Ok(Synced {
                    tasks,
                    mode: Mode::Online,
                })
            }
            Err(e) => {
                tracing::warn!("Task service unavailable, using local cache: {}", e);
                Ok(Synced {
                    tasks: self.cache.load()?,
                    mode: Mode::Offline,
                })
            }
        }
    }

    /// Set the completion flag of a task
    ///
    /// Offline, only `completed` changes in the cached record.
    pub async fn complete(&self, mode: Mode, id: i64, completed: bool) -> Result<Synced> {
        self.mutate(mode, id, TaskUpdate::completion(completed), false)
            .await
    }

    /// Apply a partial update to a task
    ///
    /// Offline, the cached record also gets a fresh `updatedAt`.
    pub async fn update(&self, mode: Mode, id: i64, changes: TaskUpdate) -> Result<Synced> {
        self.mutate(mode, id, changes, true).await
    }

    async fn mutate(
        &self,
        mode: Mode,
        id: i64,
        changes: TaskUpdate,
        stamp: bool,
    ) -> Result<Synced> {
        if mode == Mode::Online {
            match self.remote.update(id, &changes).await {
                Ok(_) => return self.fetch().await,
                Err(e) if is_connectivity_error(&e) => {
                    tracing::warn!("Update of task {} fell back to local cache: {}", id, e);
                }
                Err(e) => return Err(e),
            }
        }

        let found = self.cache.modify(|tasks| {
            let task = tasks.iter_mut().find(|t| t.id == id)?;
            task.apply(&changes);
            if stamp {
                task.updated_at = Some(Utc::now());
            }
            Some(())
        })?;
        self.offline_result(found, id)
    }

    /// Remove a task
    pub async fn delete(&self, mode: Mode, id: i64) -> Result<Synced> {
        if mode == Mode::Online {
            match self.remote.delete(id).await {
                Ok(()) => return self.fetch().await,
                Err(e) if is_connectivity_error(&e) => {
                    tracing::warn!("Delete of task {} fell back to local cache: {}", id, e);
                }
                Err(e) => return Err(e),
            }
        }

        let removed = self.cache.modify(|tasks| {
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            (tasks.len() < before).then_some(())
        })?;
        self.offline_result(removed, id)
    }

    /// Create a task, returning it along with the refreshed list
    ///
    /// Offline, the task gets the next id after the largest cached one.
    pub async fn create(&self, mode: Mode, new_task: NewTask) -> Result<(Task, Synced)> {
        let new_task = new_task.prepare()?;

        if mode == Mode::Online {
            match self.remote.create(&new_task).await {
                Ok(created) => {
                    tracing::info!(id = created.id, "Created task on task service");
                    return Ok((created, self.fetch().await?));
                }
                Err(e) if is_connectivity_error(&e) => {
                    tracing::warn!("Create fell back to local cache: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        let created = self.cache.modify(|tasks| {
            let id = tasks.iter().map(|t| t.id).max().unwrap_or(0).max(0) + 1;
            let task = new_task.into_task(id, Utc::now());
            tasks.push(task.clone());
            task
        })?;
        tracing::info!(id = created.id, "Created task in local cache");

        Ok((
            created,
            Synced {
                tasks: self.cache.load()?,
                mode: Mode::Offline,
            },
        ))
    }

    fn offline_result(&self, found: Option<()>, id: i64) -> Result<Synced> {
        if found.is_none() {
            return Err(AspriError::TaskNotFound(id).into());
        }
        Ok(Synced {
            tasks: self.cache.load()?,
            mode: Mode::Offline,
        })
    }
}
