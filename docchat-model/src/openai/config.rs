//! Configuration for [`OpenAIChatModel`](super::OpenAIChatModel).

/// The public OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Model used when none is configured.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Connection and generation settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAIConfig {
    /// Bearer token sent with every request.
    pub api_key: String,
    /// Model name, e.g. `gpt-4o-mini`.
    pub model: String,
    /// API base without a trailing slash.
    pub base_url: String,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens.
    pub max_tokens: Option<u32>,
}

impl OpenAIConfig {
    /// Settings for the public OpenAI API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_BASE.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Settings for an OpenAI-compatible server at `base_url`.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::new(api_key, model).with_base_url(base_url)
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}
