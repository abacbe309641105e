//! UI languages supported by Aspri

use crate::error::{AspriError, Result};
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported UI language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    #[default]
    En,
    /// Indonesian
    Id,
    /// Japanese
    Ja,
}

impl Language {
    /// Language code as stored in `meta.creationLanguage`
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Id => "id",
            Self::Ja => "ja",
        }
    }

    /// English name of the language, used inside AI prompts
    pub fn name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Id => "Indonesian",
            Self::Ja => "Japanese",
        }
    }

    /// Time-of-day greeting for the given hour (0-23)
    pub fn greeting(&self, hour: u32) -> &'static str {
        let slot = match hour {
            3..=11 => 0,
            12..=14 => 1,
            15..=18 => 2,
            _ => 3,
        };
        match (self, slot) {
            (Self::En, 0) => "Good morning",
            (Self::En, 1) => "Good afternoon",
            (Self::En, 2) => "Good evening",
            (Self::En, _) => "Good night",
            (Self::Id, 0) => "Selamat pagi",
            (Self::Id, 1) => "Selamat siang",
            (Self::Id, 2) => "Selamat sore",
            (Self::Id, _) => "Selamat malam",
            (Self::Ja, 0) => "おはようございます",
            (Self::Ja, 1) => "こんにちは",
            (Self::Ja, 2) => "こんばんは",
            (Self::Ja, _) => "おやすみなさい",
        }
    }

    /// Greeting for the current local time
    pub fn greeting_now(&self) -> &'static str {
        self.greeting(chrono::Local::now().hour())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "id" | "indonesian" => Ok(Self::Id),
            "ja" | "japanese" => Ok(Self::Ja),
            other => Err(AspriError::Config(format!(
                "Unsupported language: {}. Must be one of: en, id, ja",
                other
            ))
            .into()),
        }
    }
}
