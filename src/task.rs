//! Task records shared by the remote service and the local cache
//!
//! Field names serialize in camelCase, which is both the task service's wire
//! format and the layout of the cached task array.

use crate::category;
use crate::error::{AspriError, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Normalisation metadata attached to a task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMeta {
    /// Language-independent category key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_key: Option<String>,
    /// UI language active when the task was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_language: Option<String>,
}

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier assigned by the store that created the record
    pub id: i64,
    /// Short title, never empty
    pub title: String,
    /// Optional longer description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Completion flag
    #[serde(default)]
    pub completed: bool,
    /// Optional due timestamp; date-only values read as local midnight
    #[serde(
        default,
        deserialize_with = "lenient_due",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    /// Free-text category label in the creator's language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Priority label (High, Medium, Low)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<TaskMeta>,
}

impl Task {
    /// Minimal task with only the required fields set
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            completed: false,
            due_date: None,
            category: None,
            priority: None,
            created_at: None,
            updated_at: None,
            user_id: None,
            meta: None,
        }
    }

    /// Category key of this task
    ///
    /// Prefers the stored `meta.categoryKey`; otherwise normalises the
    /// category label. Empty when the task has no category.
    pub fn category_key(&self) -> String {
        self.meta
            .as_ref()
            .and_then(|m| m.category_key.clone())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| category::category_key(self.category.as_deref().unwrap_or("")))
    }

    /// Sort weight of the priority label; unknown or missing labels weigh 0
    pub fn priority_weight(&self) -> u8 {
        match self.priority.as_deref() {
            Some("High") => 3,
            Some("Medium") => 2,
            Some("Low") => 1,
            _ => 0,
        }
    }

    /// Apply the fields present in `update`
    pub fn apply(&mut self, update: &TaskUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(category) = &update.category {
            self.category = Some(category.clone());
            let meta = self.meta.get_or_insert_with(TaskMeta::default);
            meta.category_key = Some(category::category_key(category));
        }
        if let Some(priority) = &update.priority {
            self.priority = Some(priority.clone());
        }
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_due",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<TaskMeta>,
}

impl NewTask {
    /// New task input with just a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Check the input and fill in the category key
    ///
    /// # Errors
    ///
    /// Returns `AspriError::InvalidInput` when the title is blank
    pub fn prepare(mut self) -> Result<Self> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AspriError::InvalidInput("Task title cannot be empty".to_string()).into());
        }
        self.title = title.to_string();

        if let Some(category) = self.category.as_deref() {
            let meta = self.meta.get_or_insert_with(TaskMeta::default);
            if meta.category_key.as_deref().map_or(true, str::is_empty) {
                meta.category_key = Some(category::category_key(category));
            }
        }

        Ok(self)
    }

    /// Materialise a locally created task with the given id
    pub fn into_task(self, id: i64, now: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            completed: false,
            due_date: self.due_date,
            category: self.category,
            priority: self.priority,
            created_at: Some(now),
            updated_at: Some(now),
            user_id: self.user_id,
            meta: self.meta,
        }
    }
}

/// Partial update of a task; absent fields stay untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient_due",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl TaskUpdate {
    /// Update that only flips the completion flag
    pub fn completion(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

/// Parse a due date given as `YYYY-MM-DD` (local midnight) or RFC 3339
///
/// # Errors
///
/// Returns `AspriError::InvalidInput` for anything else
pub fn parse_due(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        AspriError::InvalidInput(format!(
            "Invalid due date {}: expected YYYY-MM-DD or RFC 3339",
            input
        ))
    })?;

    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| AspriError::InvalidInput(format!("Invalid due date {}", input)).into())
}

// One unreadable due date must not make the whole cached array unreadable.
fn lenient_due<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| match parse_due(&s) {
            Ok(due) => Some(due),
            Err(e) => {
                tracing::warn!("Dropping unreadable due date: {}", e);
                None
            }
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal_cache_record() {
        let task: Task =
            serde_json::from_value(json!({"id": 1, "title": "Buy milk", "completed": false}))
                .unwrap();
        assert_eq!(task, Task::new(1, "Buy milk"));
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let value = serde_json::to_value(Task::new(1, "Buy milk")).unwrap();
        assert_eq!(value, json!({"id": 1, "title": "Buy milk", "completed": false}));
    }

    #[test]
    fn test_deserialize_remote_record_ignores_unknown_fields() {
        let task: Task = serde_json::from_value(json!({
            "id": 7,
            "title": "Report",
            "completed": true,
            "dueDate": "2025-03-01T09:00:00.000Z",
            "category": "Kerja",
            "priority": "High",
            "createdAt": "2025-02-01T09:00:00.000Z",
            "updatedAt": "2025-02-02T09:00:00.000Z",
            "userId": 2,
            "user": {"id": 2, "email": "a@b.c"}
        }))
        .unwrap();
        assert_eq!(task.id, 7);
        assert!(task.completed);
        assert!(task.due_date.is_some());
        assert_eq!(task.user_id, Some(2));
        assert_eq!(task.category_key(), "work");
    }

    #[test]
    fn test_category_key_prefers_meta() {
        let mut task = Task::new(1, "x");
        task.category = Some("Something".to_string());
        task.meta = Some(TaskMeta {
            category_key: Some("work".to_string()),
            creation_language: Some("en".to_string()),
        });
        assert_eq!(task.category_key(), "work");
    }

    #[test]
    fn test_category_key_empty_without_category() {
        assert_eq!(Task::new(1, "x").category_key(), "");
    }

    #[test]
    fn test_priority_weight() {
        let mut task = Task::new(1, "x");
        assert_eq!(task.priority_weight(), 0);
        task.priority = Some("High".to_string());
        assert_eq!(task.priority_weight(), 3);
        task.priority = Some("Urgent".to_string());
        assert_eq!(task.priority_weight(), 0);
    }

    #[test]
    fn test_prepare_rejects_blank_title() {
        let err = NewTask::titled("   ").prepare().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AspriError>(),
            Some(AspriError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_prepare_fills_category_key() {
        let input = NewTask {
            category: Some("Pribadi".to_string()),
            ..NewTask::titled(" Call mom ")
        }
        .prepare()
        .unwrap();
        assert_eq!(input.title, "Call mom");
        assert_eq!(
            input.meta.unwrap().category_key.as_deref(),
            Some("personal")
        );
    }

    #[test]
    fn test_apply_update() {
        let mut task = Task::new(1, "Old");
        task.apply(&TaskUpdate {
            title: Some("New".to_string()),
            category: Some("仕事".to_string()),
            ..TaskUpdate::completion(true)
        });
        assert_eq!(task.title, "New");
        assert!(task.completed);
        assert_eq!(task.category_key(), "work");
    }

    #[test]
    fn test_completion_update_serializes_only_flag() {
        let value = serde_json::to_value(TaskUpdate::completion(true)).unwrap();
        assert_eq!(value, json!({"completed": true}));
    }
    #[test]
    fn test_parse_due_rfc3339() {
        let due = parse_due("2024-03-10T09:30:00Z").unwrap();
        assert_eq!(due.to_rfc3339(), "2024-03-10T09:30:00+00:00");
    }

    #[test]
    fn test_parse_due_plain_date_keeps_local_day() {
        let due = parse_due("2024-03-10").unwrap();
        assert_eq!(
            due.with_timezone(&Local).date_naive(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }

    #[test]
    fn test_parse_due_invalid() {
        let err = parse_due("next tuesday").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AspriError>(),
            Some(AspriError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_deserialize_mixed_due_date_formats() {
        let tasks: Vec<Task> = serde_json::from_value(json!([
            {"id": 1, "title": "Pay rent", "completed": false, "dueDate": "2025-06-01"},
            {"id": 2, "title": "Buy milk", "completed": false},
            {"id": 3, "title": "Call mom", "dueDate": "2025-06-02T08:00:00.000Z"},
            {"id": 4, "title": "Water plants", "dueDate": null},
            {"id": 5, "title": "Fix bike", "dueDate": "someday"}
        ]))
        .unwrap();

        assert_eq!(tasks.len(), 5);
        assert_eq!(
            tasks[0].due_date.unwrap().with_timezone(&Local).date_naive(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert!(tasks[1].due_date.is_none());
        assert_eq!(tasks[2].due_date.unwrap().to_rfc3339(), "2025-06-02T08:00:00+00:00");
        assert!(tasks[3].due_date.is_none());
        assert!(tasks[4].due_date.is_none());
    }

    #[test]
    fn test_update_accepts_date_only_due() {
        let update: TaskUpdate = serde_json::from_value(json!({"dueDate": "2025-06-01"})).unwrap();
        assert!(update.due_date.is_some());
    }
}
