//! Embedding index: the retrieval seam of the pipeline.
//!
//! The pipeline only needs two things from an index: accept chunks, and return
//! the chunks most relevant to a query, best first. [`VectorIndex`] provides
//! that by embedding with an [`EmbeddingProvider`] and scanning an
//! [`InMemoryVectorStore`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::inmemory::{EmbeddedChunk, InMemoryVectorStore};

/// Vectorises chunks and answers similarity queries.
#[async_trait]
pub trait EmbeddingIndex: Send + Sync {
    /// Embed and store the given chunks.
    async fn index(&self, chunks: &[Chunk]) -> Result<()>;

    /// Return up to `top_k` chunks ranked by relevance to `query`, best first.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>>;

    /// Number of chunks held by the index.
    async fn indexed_count(&self) -> usize;
}

/// Builds a fresh, empty index. Used to reset the pipeline on clear.
pub type IndexFactory = Arc<dyn Fn() -> Arc<dyn EmbeddingIndex> + Send + Sync>;

/// A factory producing [`VectorIndex`]es over the given provider.
pub fn vector_index_factory(provider: Arc<dyn EmbeddingProvider>) -> IndexFactory {
    Arc::new(move || Arc::new(VectorIndex::new(provider.clone())) as Arc<dyn EmbeddingIndex>)
}

/// An [`EmbeddingIndex`] over an in-memory cosine-similarity store.
pub struct VectorIndex {
    provider: Arc<dyn EmbeddingProvider>,
    store: InMemoryVectorStore,
}

impl VectorIndex {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider, store: InMemoryVectorStore::new() }
    }
}

#[async_trait]
impl EmbeddingIndex for VectorIndex {
    async fn index(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.provider.embed_batch(&texts).await.inspect_err(|e| {
            error!(chunk_count = chunks.len(), error = %e, "embedding failed during indexing");
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingError {
                provider: "index".into(),
                message: format!(
                    "provider returned {} embeddings for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ),
            });
        }

        let entries = chunks
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
            .collect();
        self.store.insert(entries).await?;

        debug!(chunk_count = chunks.len(), "indexed chunks");
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if self.store.is_empty().await {
            return Ok(Vec::new());
        }
        let query_embedding = self.provider.embed(query).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during search");
        })?;
        self.store.search(&query_embedding, top_k).await
    }

    async fn indexed_count(&self) -> usize {
        self.store.len().await
    }
}
