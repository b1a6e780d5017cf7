//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::chunking::DEFAULT_MAX_CHUNK_SIZE;
use crate::error::{RagError, Result};

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Soft limit on chunk length in characters.
    pub max_chunk_size: usize,
    /// Number of chunks retrieved per query.
    pub top_k: usize,
    /// Minimum similarity score for results (results below this are filtered out).
    pub similarity_threshold: f32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { max_chunk_size: DEFAULT_MAX_CHUNK_SIZE, top_k: 4, similarity_threshold: 0.0 }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `max_chunk_size == 0`
    /// - `top_k == 0`
    /// - `similarity_threshold` is not within `[-1.0, 1.0]`
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(RagError::ConfigError(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(RagError::ConfigError(format!(
                "similarity_threshold ({}) must be between -1.0 and 1.0",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the soft limit on chunk length in characters.
    pub fn max_chunk_size(mut self, size: usize) -> Self {
        self.config.max_chunk_size = size;
        self
    }

    /// Set the number of chunks retrieved per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for filtering results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
