//! OpenAI chat completions adapter

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessageIn<'a>>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatMessageIn<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

impl<'a> ChatRequest<'a> {
    pub(crate) fn single_user(model: &'a str, message: &'a str, max_tokens: u32) -> Self {
        Self {
            model,
            messages: vec![ChatMessageIn {
                role: "user",
                content: message,
            }],
            max_tokens,
            temperature: None,
        }
    }
}

/// Chat completions reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiResponse {
    #[serde(default)]
    pub choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiChoice {
    #[serde(default)]
    pub message: Option<OpenAiMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl OpenAiResponse {
    /// `choices[0].message.content`
    pub fn into_text(self) -> Option<String> {
        self.choices.into_iter().next()?.message?.content
    }
}

pub(crate) fn build_request(
    client: &Client,
    base_url: &str,
    model: &str,
    api_key: &str,
    message: &str,
) -> RequestBuilder {
    let url = format!("{}/v1/chat/completions", base_url);
    client
        .post(url)
        .bearer_auth(api_key)
        .json(&ChatRequest::single_user(model, message, MAX_TOKENS))
}
