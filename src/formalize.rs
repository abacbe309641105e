//! Text formalisation
//!
//! Rewrites casual text in a professional, technical or formal register.
//! The rewrite is done by Gemini through the AI bridge; when that fails a
//! small rule-based rewrite is returned instead so the user always gets
//! something back.
//!
//! Usage is counted in the store. Once the free limit is used up, a
//! personal API key must be saved before more rewrites are allowed.

use crate::ai::{AiRequest, AiResponder, ProviderKind};
use crate::config::FormalizationConfig;
use crate::error::{AspriError, Result};
use crate::locale::Language;
use crate::storage::KeyValueStore;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Key holding the user's own formalisation API key
pub const API_KEY_KEY: &str = "formalization_api_key";
/// Key holding the number of successful AI rewrites
pub const COUNT_KEY: &str = "formalization_count";

/// Target register of a rewrite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormalizationStyle {
    #[default]
    Professional,
    Technical,
    Formal,
}

impl FormalizationStyle {
    pub const ALL: [FormalizationStyle; 3] = [Self::Professional, Self::Technical, Self::Formal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Technical => "technical",
            Self::Formal => "formal",
        }
    }
}

impl fmt::Display for FormalizationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormalizationStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "professional" => Ok(Self::Professional),
            "technical" => Ok(Self::Technical),
            "formal" => Ok(Self::Formal),
            other => Err(AspriError::InvalidInput(format!(
                "Unknown formalization style: {}. Must be one of: professional, technical, formal",
                other
            ))
            .into()),
        }
    }
}

/// Result of a rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formalized {
    pub text: String,
    /// False when the rule-based fallback produced the text
    pub via_ai: bool,
}

/// Prompt sent to the model for a rewrite
pub fn build_prompt(text: &str, style: FormalizationStyle, language: Language) -> String {
    let language_name = language.name();
    match style {
        FormalizationStyle::Professional => format!(
            "Transform the following text into a professional business communication in {}. \
             Maintain the original meaning, but make it appropriate for a professional work \
             environment. Ensure the tone is respectful, clear, and concise.\n\n\
             Original text: \"{}\"\n\nProfessional version:",
            language_name, text
        ),
        FormalizationStyle::Technical => format!(
            "Transform the following text into a technical explanation in {}. Use \
             industry-specific terminology, precise language, and structured formulation. The \
             result should sound like it was written by a technical expert.\n\n\
             Original text: \"{}\"\n\nTechnical version:",
            language_name, text
        ),
        FormalizationStyle::Formal => format!(
            "Transform the following text into formal language in {}. The result should be \
             suitable for official documents, academic writing, or formal correspondence. Use \
             proper grammar, avoid contractions, and employ a sophisticated vocabulary while \
             maintaining clarity.\n\nOriginal text: \"{}\"\n\nFormal version:",
            language_name, text
        ),
    }
}

const PROFESSIONAL_WORDS: &[(&str, &str)] = &[
    ("hai", "Selamat bertemu"),
    ("halo", "Selamat bertemu"),
    ("makasih", "Terima kasih"),
    ("thanks", "Terima kasih"),
    ("ok", "Baik"),
    ("oke", "Baik"),
    ("gak", "tidak"),
    ("nggak", "tidak"),
    ("ga", "tidak"),
    ("pengen", "ingin"),
    ("mau", "ingin"),
];

const TECHNICAL_WORDS: &[(&str, &str)] = &[
    ("masalah", "permasalahan teknis"),
    ("problem", "permasalahan teknis"),
    ("cepat", "efisien"),
    ("bagus", "optimal"),
    ("baik", "optimal"),
];

const FORMAL_WORDS: &[(&str, &str)] = &[
    ("saya", "Kami"),
    ("i", "We"),
    ("aku", "Saya"),
    ("gue", "Saya"),
    ("lu", "Anda"),
    ("lo", "Anda"),
    ("kamu", "Anda"),
];

/// Replace whole words, ignoring case, in table order
fn replace_words(text: &str, table: &[(&str, &str)]) -> String {
    let mut result = text.to_string();
    for (word, replacement) in table {
        let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
        if let Ok(re) = Regex::new(&pattern) {
            result = re.replace_all(&result, *replacement).into_owned();
        }
    }
    result
}

/// Rule-based rewrite used when the model is unavailable
///
/// Blank input gives an empty string.
pub fn formalize_offline(text: &str, style: FormalizationStyle, language: Language) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    match style {
        FormalizationStyle::Professional => {
            let closing = match language {
                Language::En => "Best regards,",
                Language::Id => "Hormat saya,",
                Language::Ja => "敬具",
            };
            format!("{}\n\n{}", replace_words(text, PROFESSIONAL_WORDS), closing)
        }
        FormalizationStyle::Technical => {
            let opening = match language {
                Language::En => "Based on technical analysis: ",
                Language::Id => "Berdasarkan analisis teknis: ",
                Language::Ja => "技術的分析に基づき: ",
            };
            format!("{}{}", opening, replace_words(text, TECHNICAL_WORDS))
        }
        FormalizationStyle::Formal => {
            let opening = match language {
                Language::En => "To whom it may concern,",
                Language::Id => "Dengan hormat,",
                Language::Ja => "拝啓",
            };
            format!("{}\n\n{}", opening, replace_words(text, FORMAL_WORDS))
        }
    }
}

/// Formalisation service with usage tracking
pub struct Formalizer {
    store: Arc<dyn KeyValueStore>,
    config: FormalizationConfig,
}

impl Formalizer {
    pub fn new(store: Arc<dyn KeyValueStore>, config: FormalizationConfig) -> Self {
        Self { store, config }
    }

    /// Successful AI rewrites so far
    pub fn usage_count(&self) -> Result<u32> {
        Ok(self
            .store
            .get(COUNT_KEY)?
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0))
    }

    /// Free rewrites left before a personal key is required
    pub fn remaining_free(&self) -> Result<u32> {
        Ok(self
            .config
            .free_usage_limit
            .saturating_sub(self.usage_count()?))
    }

    /// The user's own API key, if one was saved
    pub fn user_api_key(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(API_KEY_KEY)?
            .filter(|k| !k.trim().is_empty()))
    }

    /// Save the user's own API key
    pub fn set_api_key(&self, api_key: &str) -> Result<()> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AspriError::InvalidInput("API key cannot be empty".to_string()).into());
        }
        self.store.set(API_KEY_KEY, api_key)
    }

    fn record_use(&self) -> Result<u32> {
        let count = self.usage_count()?.saturating_add(1);
        self.store.set(COUNT_KEY, &count.to_string())?;
        Ok(count)
    }

    /// Rewrite `text` in `style`
    ///
    /// Uses the saved personal key, else the configured shared key. Any AI
    /// failure returns the rule-based rewrite with `via_ai` false.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for blank text
    /// - `UsageLimitReached` once the free limit is used up and no personal
    ///   key is saved
    pub async fn formalize(
        &self,
        responder: &dyn AiResponder,
        text: &str,
        style: FormalizationStyle,
        language: Language,
    ) -> Result<Formalized> {
        if text.trim().is_empty() {
            return Err(AspriError::InvalidInput("Text cannot be empty".to_string()).into());
        }

        let user_key = self.user_api_key()?;
        let limit = self.config.free_usage_limit;
        if user_key.is_none() && self.usage_count()? >= limit {
            return Err(AspriError::UsageLimitReached {
                limit,
                message: "save your own Gemini API key to keep using formalization".to_string(),
            }
            .into());
        }

        let request = AiRequest {
            provider: ProviderKind::Gemini.as_str().to_string(),
            message: build_prompt(text, style, language),
            model: self.config.model.clone(),
            api_key: user_key
                .or_else(|| self.config.api_key.clone())
                .unwrap_or_default(),
            base_url: self.config.base_url.clone(),
        };

        match responder.respond(&request).await {
            Ok(reply) => {
                let count = self.record_use()?;
                tracing::debug!(style = %style, uses = count, "Formalized with AI");
                Ok(Formalized {
                    text: reply.trim().to_string(),
                    via_ai: true,
                })
            }
            Err(e) => {
                tracing::warn!("AI formalization failed, using offline rewrite: {}", e);
                Ok(Formalized {
                    text: formalize_offline(text, style, language),
                    via_ai: false,
                })
            }
        }
    }
}
