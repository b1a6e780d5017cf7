//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector store
//! backed by a `Vec` protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and small-scale use cases.

use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// A chunk together with its embedding.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// An in-memory vector store using cosine similarity for search.
///
/// Entries are kept in insertion order and never overwritten, so chunks with
/// colliding ids coexist. Search is a flat scan; ties keep insertion order.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::inmemory::{EmbeddedChunk, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.insert(entries).await?;
/// let results = store.search(&query_embedding, 4).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<EmbeddedChunk>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries. All embeddings must share the store's dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if an embedding is empty or its
    /// length differs from the entries already stored.
    pub async fn insert(&self, new_entries: Vec<EmbeddedChunk>) -> Result<()> {
        let mut entries = self.entries.write().await;
        let Some(expected) =
            entries.first().or(new_entries.first()).map(|entry| entry.embedding.len())
        else {
            return Ok(());
        };

        for entry in &new_entries {
            let dims = entry.embedding.len();
            if dims == 0 || dims != expected {
                return Err(RagError::VectorStoreError {
                    backend: "InMemory".to_string(),
                    message: format!(
                        "chunk '{}' has embedding of length {dims}, expected {expected}",
                        entry.chunk.id
                    ),
                });
            }
        }

        entries.extend(new_entries);
        Ok(())
    }

    /// Return the `top_k` entries most similar to `embedding`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if `embedding` does not match the
    /// dimensionality of the stored entries.
    pub async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let entries = self.entries.read().await;
        if let Some(expected) = entries.first().map(|entry| entry.embedding.len()) {
            if embedding.len() != expected {
                return Err(RagError::VectorStoreError {
                    backend: "InMemory".to_string(),
                    message: format!(
                        "query embedding has length {}, expected {expected}",
                        embedding.len()
                    ),
                });
            }
        }

        let mut scored: Vec<SearchResult> = entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, embedding),
            })
            .collect();

        // `sort_by` is stable, so equal scores stay in insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, i: usize, embedding: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk { chunk: Chunk::new(title, i, format!("{title} {i}")), embedding }
    }

    #[tokio::test]
    async fn search_ranks_by_cosine() {
        let store = InMemoryVectorStore::new();
        store
            .insert(vec![
                entry("a", 0, vec![1.0, 0.0]),
                entry("b", 0, vec![0.0, 1.0]),
                entry("c", 0, vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.1], 2).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["a_chunk_0", "c_chunk_0"]);
    }

    #[tokio::test]
    async fn colliding_ids_are_kept() {
        let store = InMemoryVectorStore::new();
        store.insert(vec![entry("A", 0, vec![1.0])]).await.unwrap();
        store.insert(vec![entry("A", 0, vec![1.0])]).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let store = InMemoryVectorStore::new();
        store.insert(vec![entry("a", 0, vec![1.0, 0.0])]).await.unwrap();
        let err = store.insert(vec![entry("b", 0, vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStoreError { .. }));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn query_dimension_mismatch_is_rejected() {
        let store = InMemoryVectorStore::new();
        assert!(store.search(&[1.0], 4).await.unwrap().is_empty());

        store.insert(vec![entry("a", 0, vec![1.0, 0.0])]).await.unwrap();
        let err = store.search(&[1.0, 0.0, 0.0], 4).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStoreError { .. }));
        assert!(err.is_upstream());
    }

    #[test]
    fn zero_vector_similarity_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
