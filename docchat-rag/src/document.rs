//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Separator between a document title and a chunk index in [`Chunk::id`].
pub const CHUNK_ID_SEPARATOR: &str = "_chunk_";

/// Metadata key holding the source document title.
pub const TITLE_KEY: &str = "title";

/// Metadata key holding the chunk's position within its document.
pub const CHUNK_KEY: &str = "chunk";

/// A source document as submitted for ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Title of the document; becomes the chunk id prefix.
    pub title: String,
    /// Full text content.
    pub content: String,
}

impl Document {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self { title: title.into(), content: content.into() }
    }
}

/// A segment of a [`Document`].
///
/// The id is `{source_title}_chunk_{sequence_index}`. Ingesting two documents
/// with the same title therefore yields chunks with the same ids; nothing in
/// the crate deduplicates them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier derived from the title and position.
    pub id: String,
    /// Title of the document this chunk came from.
    pub source_title: String,
    /// Zero-based position of the chunk within its document.
    pub sequence_index: usize,
    /// The text content of the chunk.
    pub text: String,
    /// `title` and `chunk` entries describing the chunk's origin.
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// Build the chunk at `sequence_index` of the document titled `source_title`.
    pub fn new(
        source_title: impl Into<String>,
        sequence_index: usize,
        text: impl Into<String>,
    ) -> Self {
        let source_title = source_title.into();
        let metadata = HashMap::from([
            (TITLE_KEY.to_string(), source_title.clone()),
            (CHUNK_KEY.to_string(), sequence_index.to_string()),
        ]);
        Self {
            id: chunk_id(&source_title, sequence_index),
            source_title,
            sequence_index,
            text: text.into(),
            metadata,
        }
    }
}

/// The id given to the chunk at `sequence_index` of `title`.
pub fn chunk_id(title: &str, sequence_index: usize) -> String {
    format!("{title}{CHUNK_ID_SEPARATOR}{sequence_index}")
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
