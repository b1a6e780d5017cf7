//! Document chunking.
//!
//! Text is segmented on the literal sentence delimiter `". "` only. There is
//! no real sentence-boundary detection: abbreviations such as `"e.g. "` split
//! too, and sentences ending in `!` or `?` are not boundaries.

use crate::document::Chunk;

/// The only sentence boundary recognised by [`chunk_text`].
pub const SENTENCE_DELIMITER: &str = ". ";

/// Default soft limit on chunk length, in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 500;

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split the document titled `title` into ordered chunks.
    ///
    /// Returns an empty `Vec` if `text` contains nothing to chunk.
    fn chunk(&self, title: &str, text: &str) -> Vec<Chunk>;
}

/// Groups consecutive sentences into chunks of at most `max_chunk_size`
/// characters.
///
/// The limit is soft: a sentence that is longer than the limit on its own
/// becomes a chunk by itself instead of being cut.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::SentenceChunker;
///
/// let chunker = SentenceChunker::new(500);
/// let chunks = chunker.chunk("Guide", "First sentence. Second sentence.");
/// assert_eq!(chunks[0].id, "Guide_chunk_0");
/// ```
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    max_chunk_size: usize,
}

impl SentenceChunker {
    pub fn new(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_SIZE)
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, title: &str, text: &str) -> Vec<Chunk> {
        chunk_text(text, self.max_chunk_size)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::new(title, i, text))
            .collect()
    }
}

/// Split `text` on [`SENTENCE_DELIMITER`] and pack the sentences into chunks.
///
/// Each sentence keeps the delimiter it was split on; the final sentence is
/// left as written. A chunk is flushed, trimmed, as soon as adding the next
/// sentence would push it past `max_chunk_size` characters. Empty segments
/// are skipped and whitespace-only chunks are never returned.
///
/// Lengths are counted in `char`s. The output depends only on the inputs.
pub fn chunk_text(text: &str, max_chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    let segments: Vec<&str> = text.split(SENTENCE_DELIMITER).collect();
    let last = segments.len().saturating_sub(1);

    for (i, segment) in segments.into_iter().enumerate() {
        if segment.is_empty() {
            continue;
        }

        let piece = if i < last {
            format!("{segment}{SENTENCE_DELIMITER}")
        } else {
            segment.to_string()
        };

        // Length of the chunk as it would be flushed with this piece appended.
        let projected = current_len + piece.trim_end().chars().count();
        if projected > max_chunk_size && !current.is_empty() {
            flush(&mut current, &mut chunks);
            current_len = 0;
        }

        current_len += piece.chars().count();
        current.push_str(&piece);
    }

    flush(&mut current, &mut chunks);
    chunks
}

fn flush(current: &mut String, chunks: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}
