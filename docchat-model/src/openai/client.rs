//! OpenAI chat client implementation.

use std::time::Duration;

use async_openai::{
    Client,
    config::OpenAIConfig as AsyncOpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
};
use async_stream::try_stream;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use futures::StreamExt;
use tracing::{debug, error};

use super::config::OpenAIConfig;
use crate::error::{ModelError, Result};
use crate::message::{Message, Role};
use crate::model::{ChatModel, ChatStream};

const PROVIDER: &str = "OpenAI";

/// A [`ChatModel`] backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAIChatModel {
    client: Client<AsyncOpenAIConfig>,
    config: OpenAIConfig,
}

impl OpenAIChatModel {
    /// Create a new client from the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ModelError::Config("OpenAI API key must not be empty".into()));
        }
        if config.model.is_empty() {
            return Err(ModelError::Config("OpenAI model name must not be empty".into()));
        }

        let openai_config = AsyncOpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        // Failures surface to the caller on the first attempt.
        let no_retry =
            ExponentialBackoffBuilder::new().with_max_elapsed_time(Some(Duration::ZERO)).build();

        Ok(Self { client: Client::with_config(openai_config).with_backoff(no_retry), config })
    }

    /// Create a client for an OpenAI-compatible API.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        Self::new(OpenAIConfig::compatible(api_key, base_url, model))
    }

    /// Return the client configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

/// Build a chat completion request for `messages` under `config`.
fn build_request(
    config: &OpenAIConfig,
    messages: &[Message],
) -> Result<CreateChatCompletionRequest> {
    let messages = messages.iter().map(to_openai_message).collect::<Result<Vec<_>>>()?;

    let mut request_builder = CreateChatCompletionRequestArgs::default();
    request_builder.model(&config.model).messages(messages);
    if let Some(temperature) = config.temperature {
        request_builder.temperature(temperature);
    }
    if let Some(max_tokens) = config.max_tokens {
        request_builder.max_tokens(max_tokens);
    }
    request_builder.build().map_err(to_model_error)
}

fn to_openai_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let content = message.content.as_str();
    let converted = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(to_model_error)?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(to_model_error)?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map_err(to_model_error)?
            .into(),
    };
    Ok(converted)
}

fn to_model_error(err: OpenAIError) -> ModelError {
    let provider = PROVIDER.to_string();
    match err {
        OpenAIError::ApiError(api) => {
            ModelError::Api { provider, code: api.code, message: api.message }
        }
        OpenAIError::Reqwest(e) => ModelError::Request { provider, message: e.to_string() },
        OpenAIError::JSONDeserialize(e) => ModelError::Decode { provider, message: e.to_string() },
        OpenAIError::StreamError(message) => ModelError::Stream { provider, message },
        OpenAIError::InvalidArgument(message) => ModelError::Config(message),
        other => ModelError::Request { provider, message: other.to_string() },
    }
}

// ── ChatModel implementation ───────────────────────────────────────

#[async_trait]
impl ChatModel for OpenAIChatModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete_messages(&self, messages: &[Message]) -> Result<String> {
        debug!(
            provider = PROVIDER,
            model = %self.config.model,
            message_count = messages.len(),
            "chat completion"
        );

        let request = build_request(&self.config, messages)?;
        let response = self.client.chat().create(request).await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "chat completion failed");
            to_model_error(e)
        })?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ModelError::Decode {
                provider: PROVIDER.into(),
                message: "API returned no choices".into(),
            })
    }

    /// The request is sent when the stream is first polled. Dropping the
    /// stream closes the connection.
    async fn stream_messages(&self, messages: &[Message]) -> Result<ChatStream> {
        debug!(
            provider = PROVIDER,
            model = %self.config.model,
            message_count = messages.len(),
            "streaming chat completion"
        );

        let request = build_request(&self.config, messages)?;
        let client = self.client.clone();

        let stream = try_stream! {
            let mut stream = client.chat().create_stream(request).await.map_err(|e| {
                error!(provider = PROVIDER, error = %e, "stream request failed");
                to_model_error(e)
            })?;

            while let Some(result) = stream.next().await {
                match result {
                    Ok(chunk) => {
                        let fragment = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|choice| choice.delta.content)
                            .filter(|content| !content.is_empty());
                        if let Some(fragment) = fragment {
                            yield fragment;
                        }
                    }
                    Err(e) => {
                        error!(provider = PROVIDER, error = %e, "stream failed");
                        yield Err(to_model_error(e))?;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        let err = OpenAIChatModel::new(OpenAIConfig::new("", "gpt-4o-mini")).err().unwrap();
        assert!(matches!(err, ModelError::Config(_)));
    }

    #[test]
    fn request_carries_roles_in_order() {
        let config = OpenAIConfig::new("k", "gpt-4o-mini");
        let messages =
            [Message::system("be brief"), Message::user("hi"), Message::assistant("hello")];
        let request = build_request(&config, &messages).unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][2]["role"], "assistant");
        assert_eq!(json["messages"][2]["content"], "hello");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn request_carries_generation_options() {
        let config =
            OpenAIConfig::new("k", "gpt-4o-mini").with_temperature(0.25).with_max_tokens(64);
        let request = build_request(&config, &[Message::user("hi")]).unwrap();
        assert_eq!(request.temperature, Some(0.25));
        assert_eq!(request.max_tokens, Some(64));
    }

    #[test]
    fn client_errors_map_to_model_errors() {
        let err = to_model_error(OpenAIError::StreamError("closed".into()));
        assert!(matches!(err, ModelError::Stream { .. }));
        let err = to_model_error(OpenAIError::InvalidArgument("bad".into()));
        assert!(matches!(err, ModelError::Config(_)));
    }
}
