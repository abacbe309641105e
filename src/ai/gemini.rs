//! Google Gemini `generateContent` adapter

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 1024;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContentIn<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiContentIn<'a> {
    parts: Vec<GeminiPartIn<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiPartIn<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

/// `generateContent` reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GeminiResponse {
    /// `candidates[0].content.parts[0].text`, if present and non-empty
    pub fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.is_empty())
    }
}

/// Build the POST; the key travels as the `key` query parameter
pub(crate) fn build_request(
    client: &Client,
    base_url: &str,
    model: &str,
    api_key: &str,
    message: &str,
) -> RequestBuilder {
    let url = format!("{}/v1beta/models/{}:generateContent", base_url, model);
    let body = GeminiRequest {
        contents: vec![GeminiContentIn {
            parts: vec![GeminiPartIn { text: message }],
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        },
    };

    client.post(url).query(&[("key", api_key)]).json(&body)
}
