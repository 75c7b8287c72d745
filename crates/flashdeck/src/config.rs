//! Configuration management for flashdeck.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "flashdeck";

/// Default flashcard document name.
const FLASHCARD_FILE_NAME: &str = "flashcards.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLASHDECK_`, `__` between sections)
/// 2. TOML config file at `~/.config/flashdeck/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Generation provider configuration.
    pub provider: ProviderConfig,
    /// Generation behavior.
    pub generate: GenerateConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the flashcard document.
    /// Defaults to `~/.local/share/flashdeck/flashcards.json`
    pub path: Option<PathBuf>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server listens on.
    pub bind: String,
}

/// The wire shape spoken by the generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Prompt in, completion text out (Cohere generate).
    #[default]
    RawText,
    /// Completion wrapped in a list of `generated_text` records (Hugging Face).
    EnvelopedList,
    /// OpenAI-compatible chat completions.
    ChatMessage,
}

impl ProviderKind {
    /// The endpoint used when none is configured.
    #[must_use]
    pub fn default_endpoint(self) -> &'static str {
        match self {
            Self::RawText => "https://api.cohere.ai/v1/generate",
            Self::EnvelopedList => {
                "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.2"
            }
            Self::ChatMessage => "https://api.openai.com/v1/chat/completions",
        }
    }

    /// Human-readable provider label used in error cards.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::RawText => "Cohere",
            Self::EnvelopedList => "Hugging Face",
            Self::ChatMessage => "OpenAI",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RawText => write!(f, "raw-text"),
            Self::EnvelopedList => write!(f, "enveloped-list"),
            Self::ChatMessage => write!(f, "chat-message"),
        }
    }
}

/// Generation provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Which adapter to use.
    pub kind: ProviderKind,
    /// Endpoint URL. Defaults to the adapter's public endpoint.
    pub endpoint: Option<String>,
    /// Model name sent with the request (ignored by `enveloped-list`).
    pub model: String,
    /// Environment variable holding the provider credential.
    pub api_key_env: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Number of flashcards to ask for.
    pub card_count: usize,
}

/// How a generated set is combined with the existing collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Generated cards replace the whole collection.
    #[default]
    Replace,
    /// Generated cards are appended after the existing ones.
    Append,
}

/// Generation behavior configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Merge policy for generated sets.
    pub merge: MergePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            endpoint: None, // Resolved per adapter at runtime
            model: "command-xlarge-nightly".to_string(),
            api_key_env: "COHERE_API_KEY".to_string(),
            max_tokens: 200,
            temperature: 0.6,
            timeout_secs: 30,
            card_count: 3,
        }
    }
}

impl ProviderConfig {
    /// Get the endpoint, resolving the adapter default if not set.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.kind.default_endpoint())
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FLASHDECK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FLASHDECK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(Error::ConfigValidation {
                message: format!("invalid bind address: {}", self.server.bind),
            });
        }

        if self.provider.api_key_env.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "api_key_env must name an environment variable".to_string(),
            });
        }

        if self.provider.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.provider.card_count == 0 {
            return Err(Error::ConfigValidation {
                message: "card_count must be greater than 0".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "temperature ({}) must be between 0.0 and 2.0",
                    self.provider.temperature
                ),
            });
        }

        Ok(())
    }

    /// Get the flashcard document path, resolving defaults if not set.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(FLASHCARD_FILE_NAME))
    }

    /// Get the bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|_| Error::ConfigValidation {
            message: format!("invalid bind address: {}", self.server.bind),
        })
    }
}
