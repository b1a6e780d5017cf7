//! Construction of chat and embedding backends from configuration.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use docchat_model::{ChatModel, MockChatModel, OpenAIChatModel, OpenAIConfig};
use docchat_rag::embedding::DEFAULT_HASH_DIMENSIONS;
use docchat_rag::{EmbeddingProvider, HashEmbeddingProvider, OpenAIEmbeddingProvider, RagPipeline};
use tracing::info;

use crate::config::{AppConfig, ChatConfig, EmbeddingConfig, ProviderKind, resolve_api_key};

/// Build the chat model selected by `config.provider`.
///
/// The `mock` provider echoes the last user message back.
pub fn build_chat_model(config: &ChatConfig) -> Result<Arc<dyn ChatModel>> {
    match config.provider {
        ProviderKind::Mock => {
            info!(provider = "mock", "chat model ready");
            Ok(Arc::new(MockChatModel::echo()))
        }
        ProviderKind::OpenAI => {
            let api_key = resolve_api_key(config.api_key.as_deref())
                .ok_or_else(|| anyhow!("chat.api_key or OPENAI_API_KEY is required"))?;
            let model = OpenAIChatModel::new(openai_chat_config(config, api_key))
                .context("failed to create OpenAI chat model")?;
            info!(provider = "openai", model = %config.model, base_url = %config.base_url, "chat model ready");
            Ok(Arc::new(model))
        }
    }
}

/// Client settings for the `openai` chat provider.
fn openai_chat_config(config: &ChatConfig, api_key: String) -> OpenAIConfig {
    let mut openai = OpenAIConfig::compatible(api_key, &config.base_url, &config.model);
    if let Some(temperature) = config.temperature {
        openai = openai.with_temperature(temperature);
    }
    if let Some(max_tokens) = config.max_tokens {
        openai = openai.with_max_tokens(max_tokens);
    }
    openai
}

/// Build the embedding provider selected by `config.provider`.
pub fn build_embedding_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider {
        ProviderKind::Mock => {
            let dimensions = config.dimensions.unwrap_or(DEFAULT_HASH_DIMENSIONS);
            info!(provider = "mock", dimensions, "embedding provider ready");
            Ok(Arc::new(HashEmbeddingProvider::new(dimensions)))
        }
        ProviderKind::OpenAI => {
            let api_key = resolve_api_key(config.api_key.as_deref())
                .ok_or_else(|| anyhow!("embedding.api_key or OPENAI_API_KEY is required"))?;
            let mut provider = OpenAIEmbeddingProvider::new(api_key)
                .context("failed to create OpenAI embedding provider")?
                .with_model(&config.model)
                .with_base_url(&config.base_url);
            if let Some(dimensions) = config.dimensions {
                provider = provider.with_dimensions(dimensions);
            }
            info!(provider = "openai", model = %config.model, "embedding provider ready");
            Ok(Arc::new(provider))
        }
    }
}

/// Wire a [`RagPipeline`] from the configured embedding provider and `chat_model`.
pub fn build_pipeline(config: &AppConfig, chat_model: Arc<dyn ChatModel>) -> Result<RagPipeline> {
    let embedder = build_embedding_provider(&config.embedding)?;
    RagPipeline::builder()
        .config(config.rag.clone())
        .embedding_provider(embedder)
        .chat_model(chat_model)
        .build()
        .context("failed to build RAG pipeline")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.chat.provider = ProviderKind::Mock;
        config.embedding.provider = ProviderKind::Mock;
        config
    }

    #[tokio::test]
    async fn mock_providers_need_no_network() {
        let config = mock_config();
        let chat = build_chat_model(&config.chat).unwrap();
        assert_eq!(chat.name(), "mock");
        assert_eq!(chat.complete("ping").await.unwrap(), "ping");

        let embedder = build_embedding_provider(&config.embedding).unwrap();
        assert_eq!(embedder.dimensions(), DEFAULT_HASH_DIMENSIONS);
    }

    #[test]
    fn configured_dimensions_apply_to_mock_embeddings() {
        let mut config = mock_config();
        config.embedding.dimensions = Some(32);
        let embedder = build_embedding_provider(&config.embedding).unwrap();
        assert_eq!(embedder.dimensions(), 32);
    }

    #[test]
    fn openai_with_explicit_key_builds() {
        let mut config = AppConfig::default();
        config.chat.api_key = Some("sk-test".into());
        config.embedding.api_key = Some("sk-test".into());
        config.embedding.dimensions = Some(512);

        let chat = build_chat_model(&config.chat).unwrap();
        assert_eq!(chat.name(), config.chat.model);
        let embedder = build_embedding_provider(&config.embedding).unwrap();
        assert_eq!(embedder.dimensions(), 512);
    }

    #[test]
    fn generation_options_reach_the_chat_client() {
        let mut config = ChatConfig::default();
        assert_eq!(openai_chat_config(&config, "sk-test".into()).temperature, None);

        config.temperature = Some(0.3);
        config.max_tokens = Some(128);
        config.base_url = "http://localhost:11434/v1/".into();
        let openai = openai_chat_config(&config, "sk-test".into());
        assert_eq!(openai.temperature, Some(0.3));
        assert_eq!(openai.max_tokens, Some(128));
        assert_eq!(openai.base_url, "http://localhost:11434/v1");
    }

    #[tokio::test]
    async fn pipeline_from_mock_config_answers() {
        let config = mock_config();
        let chat = build_chat_model(&config.chat).unwrap();
        let pipeline = build_pipeline(&config, chat).unwrap();
        pipeline.ingest("Guide", "Rust has no garbage collector.").await.unwrap();
        let answer = pipeline.query("Does Rust have a garbage collector?").await.unwrap();
        assert!(answer.contains("Rust has no garbage collector."));
    }
}
