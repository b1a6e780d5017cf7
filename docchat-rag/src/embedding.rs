//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// Dimensionality of [`HashEmbeddingProvider`] vectors when none is given.
pub const DEFAULT_HASH_DIMENSIONS: usize = 256;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::{EmbeddingProvider, HashEmbeddingProvider};
///
/// let provider = HashEmbeddingProvider::new(64);
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input. Override this method if the backend
    /// supports native batch embedding for better throughput.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// Deterministic, offline embeddings based on hashed word counts.
///
/// Each lowercase alphanumeric token is hashed into one of `dimensions`
/// buckets, and the resulting count vector is L2-normalised. Texts that share
/// words therefore have a positive cosine similarity, which is enough for
/// tests and demos without an embedding service.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }
}

impl Default for HashEmbeddingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIMENSIONS)
    }
}

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let bucket = (fnv1a(token.as_bytes()) % self.dimensions as u64) as usize;
            embedding[bucket] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
