//! # docchat-rag
//!
//! Retrieval-augmented question answering over an in-memory knowledge base.
//!
//! ## Overview
//!
//! Documents are split into sentence-aligned chunks, embedded and indexed.
//! A question retrieves the closest chunks, which become the context of a
//! grounding prompt sent to a [`ChatModel`](docchat_model::ChatModel).
//!
//! - [`SentenceChunker`] - splits text on `". "` under a soft length limit
//! - [`DocumentStore`] - ordered list of everything ingested
//! - [`EmbeddingIndex`] - retrieval seam, with [`VectorIndex`] as the default
//! - [`RagPipeline`] - ties the above to a chat model
//!
//! Embedding providers:
//!
//! - [`HashEmbeddingProvider`] - deterministic, offline
//! - [`OpenAIEmbeddingProvider`] - OpenAI embeddings API (feature `openai`)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docchat_model::MockChatModel;
//! use docchat_rag::{HashEmbeddingProvider, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashEmbeddingProvider::default()))
//!     .chat_model(Arc::new(MockChatModel::echo()))
//!     .build()?;
//!
//! pipeline.ingest("Guide", "Spring Boot is a framework.").await?;
//! let answer = pipeline.query("What is Spring Boot?").await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod inmemory;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod store;

pub use chunking::{Chunker, SentenceChunker, chunk_text};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::{EmbeddingProvider, HashEmbeddingProvider};
pub use error::{RagError, Result};
pub use index::{EmbeddingIndex, IndexFactory, VectorIndex, vector_index_factory};
pub use inmemory::InMemoryVectorStore;
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
pub use pipeline::{
    NO_DOCUMENTS_MESSAGE, NO_RELEVANT_MESSAGE, RagPipeline, RagPipelineBuilder,
    build_grounding_prompt,
};
pub use store::DocumentStore;
