//! Assistant conversation state
//!
//! The conversation log, the saved assistant settings, the usage counter and
//! the archive of finished conversations all live in the key-value store so
//! they survive between runs.

use super::{AiResponder, AiSettings};
use crate::error::{AspriError, Result};
use crate::storage::{read_json, write_json, KeyValueStore};
use crate::task::{Task, TaskMeta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Key holding the conversation log
pub const MESSAGES_KEY: &str = "aspri_messages";
/// Key holding the saved assistant settings
pub const CONFIG_KEY: &str = "aspri_config";
/// Key holding the assistant usage counter
pub const FREE_COUNT_KEY: &str = "aspri_free_count";
/// Key holding archived conversations
pub const COMPLETED_AI_TASKS_KEY: &str = "completed_ai_tasks";

/// Category given to conversations recorded by [`AssistantSession::ask`]
pub const ASSISTANT_CATEGORY: &str = "Aspri AI";

/// Archived conversations are shown with ids below this value
const SYNTHETIC_ID_BASE: i64 = -1000;

const TITLE_LIMIT: usize = 50;
const DESCRIPTION_LIMIT: usize = 200;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// One entry in the conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// User message stamped now
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Assistant message stamped now
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A finished conversation kept for the completed view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedAiTask {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: Vec<ChatMessage>,
    #[serde(default = "default_completed")]
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub category: String,
}

fn default_completed() -> bool {
    true
}

/// Assistant settings as saved in the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    #[serde(default)]
    provider_id: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

/// Persistent assistant conversation over a key-value store
#[derive(Clone)]
pub struct AssistantSession {
    store: Arc<dyn KeyValueStore>,
}

impl AssistantSession {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The conversation log, oldest first; corrupt data reads as empty
    pub fn history(&self) -> Result<Vec<ChatMessage>> {
        Ok(read_json(self.store.as_ref(), MESSAGES_KEY)?.unwrap_or_default())
    }

    /// Append one message to the log
    pub fn append(&self, message: ChatMessage) -> Result<()> {
        let mut history = self.history()?;
        history.push(message);
        write_json(self.store.as_ref(), MESSAGES_KEY, &history)
    }

    /// Drop the whole conversation log
    pub fn clear(&self) -> Result<()> {
        self.store.remove(MESSAGES_KEY)
    }

    /// Number of questions sent to a provider so far
    pub fn free_count(&self) -> Result<u32> {
        Ok(self
            .store
            .get(FREE_COUNT_KEY)?
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0))
    }

    fn bump_free_count(&self) -> Result<u32> {
        let count = self.free_count()?.saturating_add(1);
        self.store.set(FREE_COUNT_KEY, &count.to_string())?;
        Ok(count)
    }

    /// Fill unset fields of `settings` from the saved settings
    ///
    /// Values already present (from the config file, environment or command
    /// line) win; the saved copy only supplies what is missing.
    pub fn resolve_settings(&self, settings: &AiSettings) -> Result<AiSettings> {
        let mut resolved = settings.clone();
        let Some(stored) = read_json::<StoredSettings>(self.store.as_ref(), CONFIG_KEY)? else {
            return Ok(resolved);
        };

        if resolved.api_key.is_none() {
            resolved.api_key = stored.api_key.filter(|k| !k.is_empty());
        }
        if resolved.model.is_none() {
            resolved.model = stored.model.filter(|m| !m.is_empty());
        }
        if let Some(provider) = stored.provider_id.filter(|p| !p.is_empty()) {
            if settings.api_key.is_none() && resolved.api_key.is_some() {
                // The saved key belongs to the saved provider
                resolved.provider = provider;
            }
        }
        Ok(resolved)
    }

    /// Save provider, model and key for later runs
    pub fn save_settings(&self, settings: &AiSettings) -> Result<()> {
        let stored = StoredSettings {
            provider_id: Some(settings.provider.clone()),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        };
        write_json(self.store.as_ref(), CONFIG_KEY, &stored)
    }

    /// Send `text` to the assistant and record the exchange
    ///
    /// The user message is logged before the call. On success the reply is
    /// logged and the exchange is archived as a completed AI task. On failure
    /// nothing is logged for the reply and the error is returned.
    pub async fn ask(
        &self,
        responder: &dyn AiResponder,
        settings: &AiSettings,
        text: &str,
    ) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AspriError::InvalidInput("Message cannot be empty".to_string()).into());
        }

        let question = ChatMessage::user(text);
        self.append(question.clone())?;

        let count = self.bump_free_count()?;
        tracing::debug!(provider = %settings.provider, uses = count, "Asking assistant");

        let reply_text = responder.respond(&settings.request(text)).await?;
        let reply = ChatMessage::assistant(reply_text);
        self.append(reply.clone())?;
        self.record_exchange(&question, &reply)?;

        Ok(reply)
    }

    fn record_exchange(&self, question: &ChatMessage, reply: &ChatMessage) -> Result<()> {
        let entry = CompletedAiTask {
            id: reply.timestamp.timestamp_millis(),
            title: truncate(&question.content, TITLE_LIMIT),
            description: truncate(&reply.content, DESCRIPTION_LIMIT),
            content: vec![question.clone(), reply.clone()],
            completed: true,
            timestamp: reply.timestamp,
            category: ASSISTANT_CATEGORY.to_string(),
        };
        self.push_completed(entry)
    }

    /// Move the current conversation into the archive and clear the log
    ///
    /// # Errors
    ///
    /// Returns `AspriError::InvalidInput` when the title is blank or there
    /// is no conversation to archive
    pub fn archive_conversation(&self, title: &str, category: Option<&str>) -> Result<CompletedAiTask> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AspriError::InvalidInput("Title cannot be empty".to_string()).into());
        }

        let history = self.history()?;
        if history.is_empty() {
            return Err(
                AspriError::InvalidInput("There is no conversation to archive".to_string()).into(),
            );
        }

        let description = history
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| truncate(&m.content, DESCRIPTION_LIMIT))
            .unwrap_or_default();

        let now = Utc::now();
        let entry = CompletedAiTask {
            id: now.timestamp_millis(),
            title: title.to_string(),
            description,
            content: history,
            completed: true,
            timestamp: now,
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(ASSISTANT_CATEGORY)
                .to_string(),
        };

        self.push_completed(entry.clone())?;
        self.clear()?;
        tracing::info!(title = %entry.title, messages = entry.content.len(), "Archived conversation");
        Ok(entry)
    }

    fn push_completed(&self, entry: CompletedAiTask) -> Result<()> {
        let mut tasks = self.completed_ai_tasks()?;
        tasks.push(entry);
        write_json(self.store.as_ref(), COMPLETED_AI_TASKS_KEY, &tasks)
    }

    /// Archived conversations, oldest first
    pub fn completed_ai_tasks(&self) -> Result<Vec<CompletedAiTask>> {
        Ok(read_json(self.store.as_ref(), COMPLETED_AI_TASKS_KEY)?.unwrap_or_default())
    }

    /// Remove the archived conversation at `index`
    ///
    /// # Errors
    ///
    /// Returns `AspriError::TaskNotFound` with the synthetic id when the
    /// index is out of range
    pub fn delete_completed_ai_task(&self, index: usize) -> Result<CompletedAiTask> {
        let mut tasks = self.completed_ai_tasks()?;
        if index >= tasks.len() {
            return Err(AspriError::TaskNotFound(synthetic_id(index)).into());
        }
        let removed = tasks.remove(index);
        write_json(self.store.as_ref(), COMPLETED_AI_TASKS_KEY, &tasks)?;
        Ok(removed)
    }

    /// Archived conversations rendered as completed tasks
    ///
    /// Ids are `-1000 - index` so they never collide with stored task ids.
    pub fn completed_ai_tasks_as_tasks(&self) -> Result<Vec<Task>> {
        Ok(self
            .completed_ai_tasks()?
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let category_key = crate::category::normalize_category(Some(entry.category.as_str()));
                Task {
                    description: Some(entry.description).filter(|d| !d.is_empty()),
                    completed: true,
                    category: Some(entry.category).filter(|c| !c.is_empty()),
                    created_at: Some(entry.timestamp),
                    updated_at: Some(entry.timestamp),
                    meta: category_key.map(|key| TaskMeta {
                        category_key: Some(key),
                        creation_language: None,
                    }),
                    ..Task::new(synthetic_id(index), entry.title)
                }
            })
            .collect())
    }
}

/// Id shown for the archived conversation at `index`
pub fn synthetic_id(index: usize) -> i64 {
    SYNTHETIC_ID_BASE - index as i64
}

/// Index of the archived conversation shown as `id`, if `id` is synthetic
pub fn synthetic_index(id: i64) -> Option<usize> {
    if id <= SYNTHETIC_ID_BASE {
        usize::try_from(SYNTHETIC_ID_BASE - id).ok()
    } else {
        None
    }
}

/// Cut `text` to `limit` characters, ending with `...` when shortened
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", kept)
}
