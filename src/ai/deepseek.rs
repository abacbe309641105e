//! DeepSeek chat completions adapter
//!
//! DeepSeek has been seen answering in several layouts, so text extraction
//! tries each known location in turn.

use super::openai::ChatRequest;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1000;

/// DeepSeek reply, tolerant of the layouts it has been observed to use
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeepSeekResponse {
    #[serde(default)]
    pub choices: Vec<DeepSeekChoice>,
    #[serde(default)]
    pub output: Option<DeepSeekOutput>,
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeepSeekChoice {
    #[serde(default)]
    pub message: Option<DeepSeekMessage>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeepSeekMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeepSeekOutput {
    #[serde(default)]
    pub content: Option<String>,
}

impl DeepSeekResponse {
    /// First non-empty of `choices[0].message.content`, `choices[0].text`,
    /// `output.content`, `response`
    pub fn into_text(self) -> Option<String> {
        let non_empty = |s: Option<String>| s.filter(|t| !t.is_empty());

        let (from_message, from_text) = match self.choices.into_iter().next() {
            Some(choice) => (choice.message.and_then(|m| m.content), choice.text),
            None => (None, None),
        };

        non_empty(from_message)
            .or_else(|| non_empty(from_text))
            .or_else(|| non_empty(self.output.and_then(|o| o.content)))
            .or_else(|| non_empty(self.response))
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
    let mut body = ChatRequest::single_user(model, message, MAX_TOKENS);
    body.temperature = Some(TEMPERATURE);

    client.post(url).bearer_auth(api_key).json(&body)
}
