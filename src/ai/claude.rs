//! Anthropic messages adapter

use super::openai::ChatMessageIn;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessageIn<'a>>,
}

/// Messages API reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaudeResponse {
    #[serde(default)]
    pub content: Vec<ClaudeBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaudeBlock {
    #[serde(default)]
    pub text: Option<String>,
}

impl ClaudeResponse {
    /// `content[0].text`
    pub fn into_text(self) -> Option<String> {
        self.content.into_iter().next()?.text
    }
}

pub(crate) fn build_request(
    client: &Client,
    base_url: &str,
    model: &str,
    api_key: &str,
    message: &str,
) -> RequestBuilder {
    let url = format!("{}/v1/messages", base_url);
    let body = MessagesRequest {
        model,
        max_tokens: MAX_TOKENS,
        messages: vec![ChatMessageIn {
            role: "user",
            content: message,
        }],
    };

    client
        .post(url)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&body)
}
