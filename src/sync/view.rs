//! Per-screen task views
//!
//! Each view owns its own offline flag and its own filtered copy of the
//! list. Views never talk to each other; two views over the same service
//! can disagree about connectivity until their next fetch.

use super::{Mode, Synced, TaskSync};
use crate::category;
use crate::error::Result;
use crate::task::{NewTask, Task, TaskUpdate};
use chrono::{Days, Local, NaiveDate};
use std::cmp::Reverse;
use std::sync::Arc;

/// Task fields a search can look at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchField {
    #[default]
    All,
    Title,
    Description,
    Category,
}

/// Which tasks a view shows, and in what order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewFilter {
    /// Every task in stored order
    All,
    /// Due on the current local day
    Today,
    /// Due on the next local day
    Tomorrow,
    /// Due from the day after tomorrow onwards
    Upcoming,
    /// Marked completed
    Completed,
    /// Case-insensitive substring match
    Search { query: String, field: SearchField },
    /// Same category key as the label
    Category(String),
}

impl ViewFilter {
    /// Filter and order `tasks` relative to the current local date
    pub fn apply(&self, tasks: Vec<Task>) -> Vec<Task> {
        self.apply_on(tasks, Local::now().date_naive())
    }

    /// Filter and order `tasks` as if the local date were `today`
    pub fn apply_on(&self, tasks: Vec<Task>, today: NaiveDate) -> Vec<Task> {
        match self {
            Self::All => tasks,
            Self::Today => due_on(tasks, today),
            Self::Tomorrow => match today.checked_add_days(Days::new(1)) {
                Some(day) => due_on(tasks, day),
                None => Vec::new(),
            },
            Self::Upcoming => {
                let Some(start) = today.checked_add_days(Days::new(2)) else {
                    return Vec::new();
                };
                let mut upcoming: Vec<Task> = tasks
                    .into_iter()
                    .filter(|t| local_due_date(t).map_or(false, |d| d >= start))
                    .collect();
                upcoming.sort_by_key(|t| t.due_date);
                upcoming
            }
            Self::Completed => tasks.into_iter().filter(|t| t.completed).collect(),
            Self::Search { query, field } => {
                let needle = query.trim().to_lowercase();
                if needle.is_empty() {
                    return tasks;
                }
                tasks
                    .into_iter()
                    .filter(|t| matches_search(t, &needle, *field))
                    .collect()
            }
            Self::Category(label) => {
                let wanted = category::category_key(label);
                if wanted.is_empty() {
                    return Vec::new();
                }
                tasks
                    .into_iter()
                    .filter(|t| t.category_key() == wanted)
                    .collect()
            }
        }
    }

    /// Short name for headings and logs
    pub fn label(&self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Today => "today".to_string(),
            Self::Tomorrow => "tomorrow".to_string(),
            Self::Upcoming => "upcoming".to_string(),
            Self::Completed => "completed".to_string(),
            Self::Search { query, .. } => format!("search \"{}\"", query),
            Self::Category(label) => format!("category {}", label),
        }
    }
}

fn local_due_date(task: &Task) -> Option<NaiveDate> {
    task.due_date.map(|d| d.with_timezone(&Local).date_naive())
}

/// Tasks due on `day`, incomplete first, then by priority
fn due_on(tasks: Vec<Task>, day: NaiveDate) -> Vec<Task> {
    let mut due: Vec<Task> = tasks
        .into_iter()
        .filter(|t| local_due_date(t) == Some(day))
        .collect();
    due.sort_by_key(|t| (t.completed, Reverse(t.priority_weight())));
    due
}

fn matches_search(task: &Task, needle: &str, field: SearchField) -> bool {
    let contains = |value: Option<&str>| value.map_or(false, |v| v.to_lowercase().contains(needle));
    let title = || contains(Some(task.title.as_str()));
    let description = || contains(task.description.as_deref());
    let category = || contains(task.category.as_deref());

    match field {
        SearchField::All => title() || description() || category(),
        SearchField::Title => title(),
        SearchField::Description => description(),
        SearchField::Category => category(),
    }
}

/// A filtered view over the synchronised task list
pub struct TaskView {
    sync: Arc<TaskSync>,
    filter: ViewFilter,
    mode: Mode,
    tasks: Vec<Task>,
}

impl TaskView {
    /// Create a view; it starts online with an empty list
    pub fn new(sync: Arc<TaskSync>, filter: ViewFilter) -> Self {
        Self {
            sync,
            filter,
            mode: Mode::Online,
            tasks: Vec::new(),
        }
    }

    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    /// Tasks currently shown
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Whether the last operation was served from the local cache
    pub fn is_offline(&self) -> bool {
        self.mode.is_offline()
    }

    fn absorb(&mut self, synced: Synced) {
        if synced.mode != self.mode {
            tracing::info!(view = %self.filter.label(), mode = ?synced.mode, "View changed mode");
        }
        self.mode = synced.mode;
        self.tasks = self.filter.apply(synced.tasks);
    }

    /// Reload the list
    pub async fn fetch(&mut self) -> Result<&[Task]> {
        let synced = self.sync.fetch().await?;
        self.absorb(synced);
        Ok(self.tasks.as_slice())
    }

    /// Mark a task completed or not completed
    pub async fn complete(&mut self, id: i64, completed: bool) -> Result<()> {
        let synced = self.sync.complete(self.mode, id, completed).await?;
        self.absorb(synced);
        Ok(())
    }

    /// Apply a partial update to a task
    pub async fn update(&mut self, id: i64, changes: TaskUpdate) -> Result<()> {
        let synced = self.sync.update(self.mode, id, changes).await?;
        self.absorb(synced);
        Ok(())
    }

    /// Delete a task from the list and the cache
    pub async fn delete(&mut self, id: i64) -> Result<()> {
        let synced = self.sync.delete(self.mode, id).await?;
        self.absorb(synced);
        Ok(())
    }

    /// Create a task and return it
    pub async fn create(&mut self, new_task: NewTask) -> Result<Task> {
        let (created, synced) = self.sync.create(self.mode, new_task).await?;
        self.absorb(synced);
        Ok(created)
    }
}
