//! Server configuration.
//!
//! Precedence (lowest to highest):
//! 1. Programmatic defaults
//! 2. YAML file (`--config <path>`, or `docchat.yaml` in the working directory)
//! 3. Environment variables with the `DOCCHAT_` prefix; `__` separates
//!    sections, e.g. `DOCCHAT_SERVER__PORT=9000`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use docchat_model::openai::{DEFAULT_CHAT_MODEL, OPENAI_API_BASE};
use docchat_rag::RagConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "docchat.yaml";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "DOCCHAT_";

/// Fallback source for API keys left out of the config.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Embedding model used when none is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant specializing in software development. \
     Provide concise, accurate answers with code examples when relevant.";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("{0}.model cannot be empty")]
    EmptyModel(&'static str),

    #[error("{0}.base_url cannot be empty")]
    EmptyBaseUrl(&'static str),

    #[error("embedding.dimensions must be at least 1")]
    InvalidDimensions,

    #[error("chat.temperature must be between 0 and 2, got {0}")]
    InvalidTemperature(f32),

    #[error("chat.max_tokens must be at least 1")]
    InvalidMaxTokens,

    #[error("Invalid rag section: {0}")]
    Rag(#[from] docchat_rag::RagError),
}

/// Which backend serves a capability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI or any OpenAI-compatible server.
    #[default]
    OpenAI,
    /// In-process stand-in; needs no network or key.
    Mock,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Sent ahead of the user message on `/api/chat/system`.
    pub system_prompt: String,
    /// Sampling temperature; the provider default when unset.
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens; the provider default when unset.
    pub max_tokens: Option<u32>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            base_url: OPENAI_API_BASE.to_string(),
            api_key: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Requested vector size. Defaults to the model's native size for
    /// `openai` and to 256 for `mock`.
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: OPENAI_API_BASE.to_string(),
            api_key: None,
            dimensions: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Default level; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::default() }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and the environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                anyhow::ensure!(path.exists(), "config file {} not found", path.display());
                path.to_path_buf()
            }
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(&file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(figment)
            .with_context(|| format!("Failed to load configuration (file: {})", file.display()))
    }

    /// Extract and validate a configuration from any figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig =
            figment.extract().context("Failed to extract configuration from figment")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log.level.clone()));
        }

        if self.chat.provider == ProviderKind::OpenAI {
            if self.chat.model.trim().is_empty() {
                return Err(ConfigError::EmptyModel("chat"));
            }
            if self.chat.base_url.trim().is_empty() {
                return Err(ConfigError::EmptyBaseUrl("chat"));
            }
        }
        if let Some(temperature) = self.chat.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidTemperature(temperature));
            }
        }
        if self.chat.max_tokens == Some(0) {
            return Err(ConfigError::InvalidMaxTokens);
        }

        if self.embedding.provider == ProviderKind::OpenAI {
            if self.embedding.model.trim().is_empty() {
                return Err(ConfigError::EmptyModel("embedding"));
            }
            if self.embedding.base_url.trim().is_empty() {
                return Err(ConfigError::EmptyBaseUrl("embedding"));
            }
        }
        if self.embedding.dimensions == Some(0) {
            return Err(ConfigError::InvalidDimensions);
        }

        self.rag.validate()?;
        Ok(())
    }
}

/// `configured`, or the `OPENAI_API_KEY` environment variable when unset or blank.
pub fn resolve_api_key(configured: Option<&str>) -> Option<String> {
    configured
        .filter(|key| !key.trim().is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok().filter(|key| !key.trim().is_empty()))
}
