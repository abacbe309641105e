//! Configuration management for Aspri
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::ai::{AiSettings, ProviderKind};
use crate::error::{AspriError, Result};
use crate::locale::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Aspri
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote task service settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Local storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// AI assistant settings
    #[serde(default)]
    pub assistant: AiSettings,
    /// Text formalisation settings
    #[serde(default)]
    pub formalization: FormalizationConfig,
    /// UI language for prompts, greetings and new task metadata
    #[serde(default)]
    pub language: Language,
}

/// Remote task service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the task service, without the `/tasks` suffix
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Request timeout for task service calls (seconds)
    #[serde(default = "default_api_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            request_timeout_seconds: default_api_timeout(),
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file; the platform data directory is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Text formalisation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormalizationConfig {
    /// Number of AI formalisations allowed without an API key
    #[serde(default = "default_free_usage_limit")]
    pub free_usage_limit: u32,

    /// Gemini API key used for formalisation
    #[serde(default)]
    pub api_key: Option<String>,

    /// Gemini model override
    #[serde(default)]
    pub model: Option<String>,

    /// Endpoint override (useful for tests and local mocks)
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_free_usage_limit() -> u32 {
    5
}

impl Default for FormalizationConfig {
    fn default() -> Self {
        Self {
            free_usage_limit: default_free_usage_limit(),
            api_key: None,
            model: None,
            base_url: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AspriError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| AspriError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("ASPRI_API_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("ASPRI_REQUEST_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid ASPRI_REQUEST_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(path) = std::env::var("ASPRI_STORAGE_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }

        if let Ok(provider) = std::env::var("ASPRI_PROVIDER") {
            self.assistant.provider = provider;
        }

        if let Ok(model) = std::env::var("ASPRI_MODEL") {
            self.assistant.model = Some(model);
        }

        if let Ok(api_key) = std::env::var("ASPRI_API_KEY") {
            self.assistant.api_key = Some(api_key);
        }

        if let Ok(language) = std::env::var("ASPRI_LANGUAGE") {
            match language.parse() {
                Ok(value) => self.language = value,
                Err(_) => tracing::warn!("Invalid ASPRI_LANGUAGE: {}, keeping {}", language, self.language),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(api_url) = &cli.api_url {
            self.api.base_url = api_url.clone();
        }

        if let Some(path) = &cli.storage_path {
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `AspriError::Config` if any value is out of range
    pub fn validate(&self) -> Result<()> {
        if let Err(e) = url::Url::parse(&self.api.base_url) {
            return Err(AspriError::Config(format!(
                "Invalid api.base_url {}: {}",
                self.api.base_url, e
            ))
            .into());
        }

        if self.api.request_timeout_seconds == 0 {
            return Err(AspriError::Config(
                "api.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.assistant.provider.parse::<ProviderKind>().is_err() {
            return Err(AspriError::Config(format!(
                "Invalid assistant provider: {}. Must be one of: {}",
                self.assistant.provider,
                ProviderKind::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
            .into());
        }

        if self.assistant.request_timeout_seconds == 0 {
            return Err(AspriError::Config(
                "assistant.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        for (name, base) in [
            ("assistant.base_url", &self.assistant.base_url),
            ("formalization.base_url", &self.formalization.base_url),
        ] {
            if let Some(base) = base {
                if url::Url::parse(base).is_err() {
                    return Err(
                        AspriError::Config(format!("Invalid {}: {}", name, base)).into()
                    );
                }
            }
        }

        Ok(())
    }
}
