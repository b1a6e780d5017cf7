//! Error types for the `docchat-rag` crate.

use docchat_model::ModelError;
use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The chat model call failed.
    #[error("Chat model error: {0}")]
    ChatError(#[from] ModelError),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Whether the error came from an external dependency (embedding
    /// provider, vector store or chat model) rather than from local setup.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingError { .. } | Self::VectorStoreError { .. } | Self::ChatError(_)
        )
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_classification() {
        let embedding = RagError::EmbeddingError { provider: "x".into(), message: "down".into() };
        let chat = RagError::from(ModelError::Config("bad".into()));
        assert!(embedding.is_upstream());
        assert!(chat.is_upstream());
        assert!(!RagError::ConfigError("top_k".into()).is_upstream());
    }
}
