//! Ordered store of every ingested chunk.

use tokio::sync::RwLock;

use crate::document::Chunk;

/// All chunks ingested so far, in insertion order.
///
/// Mutation goes through a single coarse write lock, so concurrent appends
/// never lose chunks and readers always see whole batches.
#[derive(Debug, Default)]
pub struct DocumentStore {
    chunks: RwLock<Vec<Chunk>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append chunks, preserving their order.
    pub async fn add(&self, chunks: impl IntoIterator<Item = Chunk>) {
        self.chunks.write().await.extend(chunks);
    }

    /// Remove every chunk.
    pub async fn clear(&self) {
        self.chunks.write().await.clear();
    }

    /// A snapshot of every chunk, oldest first.
    pub async fn list(&self) -> Vec<Chunk> {
        self.chunks.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_preserves_order_and_clear_empties() {
        let store = DocumentStore::new();
        assert!(store.is_empty().await);

        store.add([Chunk::new("a", 0, "one"), Chunk::new("a", 1, "two")]).await;
        store.add([Chunk::new("b", 0, "three")]).await;

        let ids: Vec<String> = store.list().await.into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["a_chunk_0", "a_chunk_1", "b_chunk_0"]);

        store.clear().await;
        assert_eq!(store.len().await, 0);
    }
}
