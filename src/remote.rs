//! Remote task service client
//!
//! The task service is a plain JSON REST API under `{base_url}/tasks`. This
//! module only speaks HTTP; deciding what to do when the service is away is
//! the job of [`crate::sync`].
//!
//! Failures are classified as they are mapped:
//!
//! - transport errors and 5xx replies become `AspriError::RemoteUnavailable`
//! - 4xx replies become `AspriError::RemoteRejected` carrying the body's
//!   `error` or `message` field
//! - an undecodable 2xx body is treated as `RemoteUnavailable`

use crate::config::ApiConfig;
use crate::error::{AspriError, Result};
use crate::task::{NewTask, Task, TaskUpdate};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong";

/// Operations offered by the remote task service
#[async_trait]
pub trait TaskRemote: Send + Sync {
    /// Every task the service holds
    async fn list(&self) -> Result<Vec<Task>>;

    /// A single task
    async fn get(&self, id: i64) -> Result<Task>;

    /// Create a task; the service assigns the id
    async fn create(&self, task: &NewTask) -> Result<Task>;

    /// Apply a partial update
    async fn update(&self, id: i64, changes: &TaskUpdate) -> Result<Task>;

    /// Remove a task
    async fn delete(&self, id: i64) -> Result<()>;
}

/// Error body returned by the task service
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the task service
#[derive(Debug, Clone)]
pub struct HttpTaskRemote {
    client: Client,
    base_url: String,
}

impl HttpTaskRemote {
    /// Create a client for the service described by `config`
    ///
    /// # Errors
    ///
    /// Returns `AspriError::Config` if the HTTP client cannot be built
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AspriError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    fn task_url(&self, id: i64) -> String {
        format!("{}/tasks/{}", self.base_url, id)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .header("Cache-Control", "no-cache, no-store, must-revalidate")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Task service request ({}) failed: {}", what, e);
                AspriError::RemoteUnavailable(format!("{}: {}", what, e))
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "Task service {} succeeded", what);
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            tracing::warn!("Task service returned {} for {}: {}", status, what, body);
            return Err(AspriError::RemoteUnavailable(format!("{} returned {}", what, status)).into());
        }

        let message = error_message(&body);
        tracing::debug!("Task service rejected {} with {}: {}", what, status, message);
        Err(AspriError::RemoteRejected {
            status: status.as_u16(),
            message,
        }
        .into())
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        response.json().await.map_err(|e| {
            tracing::warn!("Failed to decode task service response ({}): {}", what, e);
            AspriError::RemoteUnavailable(format!("undecodable {} response: {}", what, e)).into()
        })
    }
}

#[async_trait]
impl TaskRemote for HttpTaskRemote {
    async fn list(&self) -> Result<Vec<Task>> {
        let response = self.send(self.client.get(self.tasks_url()), "list").await?;
        Self::decode(response, "list").await
    }

    async fn get(&self, id: i64) -> Result<Task> {
        let response = self.send(self.client.get(self.task_url(id)), "get").await?;
        Self::decode(response, "get").await
    }

    async fn create(&self, task: &NewTask) -> Result<Task> {
        let request = self.client.post(self.tasks_url()).json(task);
        let response = self.send(request, "create").await?;
        Self::decode(response, "create").await
    }

    async fn update(&self, id: i64, changes: &TaskUpdate) -> Result<Task> {
        let request = self.client.put(self.task_url(id)).json(changes);
        let response = self.send(request, "update").await?;
        Self::decode(response, "update").await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let response = self
            .send(self.client.delete(self.task_url(id)), "delete")
            .await?;
        if response.status() != StatusCode::NO_CONTENT {
            tracing::debug!(status = response.status().as_u16(), "Delete returned a body");
        }
        Ok(())
    }
}

/// Message to show for a rejected request
///
/// A JSON body yields its `error` field, then `message`; any other body is
/// used as raw text.
fn error_message(body: &str) -> String {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error.or(parsed.message),
        Err(_) => Some(body.trim().to_string()),
    };
    message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}
