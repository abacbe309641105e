//! AI provider bridge
//!
//! Translates one unified request shape into a single POST against one of
//! four fixed providers and extracts the reply text from the provider's own
//! response layout. There is no retry; the HTTP client's timeout is the only
//! bound on a stalled call.

pub mod claude;
pub mod deepseek;
pub mod gemini;
pub mod openai;
pub mod session;

use crate::error::{AspriError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The four supported AI providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini
    Gemini,
    /// OpenAI chat completions
    #[serde(rename = "openai")]
    OpenAi,
    /// Anthropic Claude messages
    Claude,
    /// DeepSeek chat completions
    #[serde(rename = "deepseek")]
    DeepSeek,
}

impl ProviderKind {
    /// Every provider, in display order
    pub const ALL: [ProviderKind; 4] = [Self::Gemini, Self::OpenAi, Self::Claude, Self::DeepSeek];

    /// Provider tag as used in configuration and requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Claude => "claude",
            Self::DeepSeek => "deepseek",
        }
    }

    /// Public API root used when no base URL override is given
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => gemini::DEFAULT_BASE_URL,
            Self::OpenAi => openai::DEFAULT_BASE_URL,
            Self::Claude => claude::DEFAULT_BASE_URL,
            Self::DeepSeek => deepseek::DEFAULT_BASE_URL,
        }
    }

    /// Model used when the request does not name one
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => gemini::DEFAULT_MODEL,
            Self::OpenAi => openai::DEFAULT_MODEL,
            Self::Claude => claude::DEFAULT_MODEL,
            Self::DeepSeek => deepseek::DEFAULT_MODEL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "claude" => Ok(Self::Claude),
            "deepseek" => Ok(Self::DeepSeek),
            other => Err(AspriError::UnsupportedProvider(other.to_string()).into()),
        }
    }
}

/// Unified request accepted by the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiRequest {
    /// Provider tag (`gemini`, `openai`, `claude`, `deepseek`)
    pub provider: String,
    /// Prompt text sent as a single user message
    pub message: String,
    /// Model name; the provider default applies when absent or blank
    pub model: Option<String>,
    /// API key; blank means missing
    pub api_key: String,
    /// Endpoint root override
    pub base_url: Option<String>,
}

/// Persistent assistant settings
///
/// Lives in the `assistant` section of the config file and is mirrored to
/// the key-value store under `aspri_config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSettings {
    /// Provider tag
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model override
    #[serde(default)]
    pub model: Option<String>,

    /// API key for the provider
    #[serde(default)]
    pub api_key: Option<String>,

    /// Endpoint root override (useful for tests and local mocks)
    #[serde(default)]
    pub base_url: Option<String>,

    /// HTTP timeout for provider calls (seconds)
    #[serde(default = "default_ai_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_ai_timeout() -> u64 {
    60
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: None,
            base_url: None,
            request_timeout_seconds: default_ai_timeout(),
        }
    }
}

impl AiSettings {
    /// Build a bridge request carrying `message`
    pub fn request(&self, message: impl Into<String>) -> AiRequest {
        AiRequest {
            provider: self.provider.clone(),
            message: message.into(),
            model: self.model.clone(),
            api_key: self.api_key.clone().unwrap_or_default(),
            base_url: self.base_url.clone(),
        }
    }

    /// Whether a non-blank API key is present
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().map_or(false, |k| !k.trim().is_empty())
    }
}

/// Decoded provider reply, one variant per provider layout
#[derive(Debug, Clone)]
pub enum ProviderResponse {
    Gemini(gemini::GeminiResponse),
    OpenAi(openai::OpenAiResponse),
    Claude(claude::ClaudeResponse),
    DeepSeek(deepseek::DeepSeekResponse),
}

impl ProviderResponse {
    /// Decode a response body with the parser for `kind`
    ///
    /// # Errors
    ///
    /// Returns `AspriError::UnexpectedResponseFormat` if the body is not JSON
    /// of the provider's general shape
    pub fn decode(kind: ProviderKind, body: &str) -> Result<Self> {
        let unexpected = |e: serde_json::Error| {
            tracing::error!(provider = %kind, error = %e, "Failed to decode provider response");
            AspriError::UnexpectedResponseFormat(kind.to_string())
        };

        let decoded = match kind {
            ProviderKind::Gemini => Self::Gemini(serde_json::from_str(body).map_err(unexpected)?),
            ProviderKind::OpenAi => Self::OpenAi(serde_json::from_str(body).map_err(unexpected)?),
            ProviderKind::Claude => Self::Claude(serde_json::from_str(body).map_err(unexpected)?),
            ProviderKind::DeepSeek => {
                Self::DeepSeek(serde_json::from_str(body).map_err(unexpected)?)
            }
        };
        Ok(decoded)
    }

    /// Provider this response came from
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Gemini(_) => ProviderKind::Gemini,
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Claude(_) => ProviderKind::Claude,
            Self::DeepSeek(_) => ProviderKind::DeepSeek,
        }
    }

    /// Extract the reply text
    ///
    /// # Errors
    ///
    /// Returns `AspriError::UnexpectedResponseFormat` when the expected
    /// nesting is absent
    pub fn into_text(self) -> Result<String> {
        let kind = self.kind();
        let text = match self {
            Self::Gemini(r) => r.into_text(),
            Self::OpenAi(r) => r.into_text(),
            Self::Claude(r) => r.into_text(),
            Self::DeepSeek(r) => r.into_text(),
        };
        text.ok_or_else(|| AspriError::UnexpectedResponseFormat(kind.to_string()).into())
    }
}

/// Anything that can answer an [`AiRequest`] with reply text
#[async_trait]
pub trait AiResponder: Send + Sync {
    /// Send the request and return the reply text
    async fn respond(&self, request: &AiRequest) -> Result<String>;
}

/// HTTP implementation of the bridge
#[derive(Debug, Clone)]
pub struct AiBridge {
    client: Client,
}

impl AiBridge {
    /// Create a bridge whose requests time out after `timeout_seconds`
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| AspriError::Provider(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Create a bridge from assistant settings
    pub fn from_settings(settings: &AiSettings) -> Result<Self> {
        Self::new(settings.request_timeout_seconds)
    }

    /// Dispatch a request to its provider and return the reply text
    ///
    /// # Errors
    ///
    /// - `MissingCredentials` for a blank API key, checked first (no request is sent)
    /// - `UnsupportedProvider` for an unknown tag
    /// - `ProviderStatus` for a non-2xx reply
    /// - `UnexpectedResponseFormat` when the reply lacks the text field
    /// - `Provider` for transport failures
    pub async fn get_ai_response(&self, request: &AiRequest) -> Result<String> {
        let api_key = request.api_key.trim();
        if api_key.is_empty() {
            let provider = request.provider.trim().to_lowercase();
            tracing::error!("No API key provided for {}", provider);
            return Err(AspriError::MissingCredentials(provider).into());
        }

        let kind: ProviderKind = request.provider.parse()?;

        let base_url = request
            .base_url
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(kind.default_base_url())
            .trim_end_matches('/');
        let model = request
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(kind.default_model());

        tracing::debug!(
            provider = %kind,
            model,
            key_prefix = %key_prefix(api_key),
            "Calling AI provider"
        );

        let builder = match kind {
            ProviderKind::Gemini => {
                gemini::build_request(&self.client, base_url, model, api_key, &request.message)
            }
            ProviderKind::OpenAi => {
                openai::build_request(&self.client, base_url, model, api_key, &request.message)
            }
            ProviderKind::Claude => {
                claude::build_request(&self.client, base_url, model, api_key, &request.message)
            }
            ProviderKind::DeepSeek => {
                deepseek::build_request(&self.client, base_url, model, api_key, &request.message)
            }
        };

        let response = builder.send().await.map_err(|e| {
            tracing::error!("{} request failed: {}", kind, e);
            AspriError::Provider(format!("{} request failed: {}", kind, e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AspriError::Provider(format!("Failed to read {} response: {}", kind, e))
        })?;

        if !status.is_success() {
            tracing::error!("{} returned error {}: {}", kind, status, body);
            return Err(AspriError::ProviderStatus {
                provider: kind.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let text = ProviderResponse::decode(kind, &body)?.into_text()?;
        tracing::debug!(provider = %kind, chars = text.len(), "AI response received");
        Ok(text)
    }
}

#[async_trait]
impl AiResponder for AiBridge {
    async fn respond(&self, request: &AiRequest) -> Result<String> {
        self.get_ai_response(request).await
    }
}

/// First four characters of a key, for logs
fn key_prefix(api_key: &str) -> String {
    format!("{}...", api_key.chars().take(4).collect::<String>())
}
