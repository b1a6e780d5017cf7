//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the full ingest-and-query workflow by
//! composing a [`Chunker`], a [`DocumentStore`], an [`EmbeddingIndex`] and a
//! [`ChatModel`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docchat_rag::{HashEmbeddingProvider, RagConfig, RagPipeline};
//! use docchat_model::MockChatModel;
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashEmbeddingProvider::default()))
//!     .chat_model(Arc::new(MockChatModel::new("42")))
//!     .build()?;
//!
//! pipeline.ingest("Guide", "Spring Boot is a framework. It simplifies configuration.").await?;
//! let answer = pipeline.query("What is Spring Boot?").await?;
//! ```

use std::sync::Arc;

use docchat_model::{ChatModel, ChatStream, single_fragment};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use crate::chunking::{Chunker, SentenceChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::{EmbeddingIndex, IndexFactory, vector_index_factory};
use crate::store::DocumentStore;

/// Answer returned when nothing has been ingested yet.
pub const NO_DOCUMENTS_MESSAGE: &str =
    "No documents have been indexed yet. Please upload documents first.";

/// Answer returned when retrieval finds no relevant chunk.
pub const NO_RELEVANT_MESSAGE: &str = "No relevant information found in the knowledge base.";

/// Separator placed between retrieved chunks in the prompt context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Build the prompt that asks the model to answer `question` from `context` only.
pub fn build_grounding_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the following question based on the provided context.\n\
         If the answer cannot be found in the context, say so.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:\n"
    )
}

enum Prepared {
    Sentinel(&'static str),
    Prompt(String),
}

/// The RAG pipeline orchestrator.
///
/// Ingest: chunk → index → append to store. Query: retrieve → build context
/// → grounding prompt → chat model. Construct one via [`RagPipeline::builder()`].
///
/// Ingest and [`clear_all`](Self::clear_all) are serialised by a single
/// writer lock; queries run concurrently against a snapshot of the current
/// index.
pub struct RagPipeline {
    config: RagConfig,
    chunker: Arc<dyn Chunker>,
    chat_model: Arc<dyn ChatModel>,
    store: DocumentStore,
    index: RwLock<Arc<dyn EmbeddingIndex>>,
    index_factory: IndexFactory,
    writer: Mutex<()>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the chat model.
    pub fn chat_model(&self) -> &Arc<dyn ChatModel> {
        &self.chat_model
    }

    async fn current_index(&self) -> Arc<dyn EmbeddingIndex> {
        self.index.read().await.clone()
    }

    /// Ingest a document: chunk → index → store.
    ///
    /// Chunk `i` gets the id `{title}_chunk_{i}`. Titles are not checked for
    /// uniqueness, so ingesting the same title twice stores chunks with equal
    /// ids side by side. Returns the chunks that were stored.
    ///
    /// # Errors
    ///
    /// Returns the embedding or vector store error if indexing fails; the
    /// store is left unchanged in that case.
    pub async fn ingest(&self, title: &str, content: &str) -> Result<Vec<Chunk>> {
        let _writer = self.writer.lock().await;

        let chunks = self.chunker.chunk(title, content);
        if chunks.is_empty() {
            info!(title, chunk_count = 0, "ingested document (empty)");
            return Ok(chunks);
        }

        self.current_index().await.index(&chunks).await.inspect_err(|e| {
            error!(title, error = %e, "indexing failed during ingestion");
        })?;
        self.store.add(chunks.iter().cloned()).await;

        info!(title, chunk_count = chunks.len(), "ingested document");
        Ok(chunks)
    }

    /// Ingest several documents in order.
    ///
    /// # Errors
    ///
    /// Stops at the first document that fails; documents before it stay
    /// ingested.
    pub async fn ingest_batch(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut all_chunks = Vec::new();
        for document in documents {
            let chunks = self.ingest(&document.title, &document.content).await?;
            all_chunks.extend(chunks);
        }
        Ok(all_chunks)
    }

    /// Empty the document store and replace the index with a fresh one.
    pub async fn clear_all(&self) {
        let _writer = self.writer.lock().await;
        let removed = self.store.len().await;
        self.store.clear().await;
        *self.index.write().await = (self.index_factory)();
        info!(removed, "knowledge base cleared");
    }

    /// Every stored chunk, in ingestion order.
    pub async fn documents(&self) -> Vec<Chunk> {
        self.store.list().await
    }

    /// Number of stored chunks.
    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    /// Whether nothing has been ingested since creation or the last clear.
    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }

    async fn search(&self, question: &str) -> Result<Vec<SearchResult>> {
        let results =
            self.current_index().await.search(question, self.config.top_k).await.inspect_err(
                |e| {
                    error!(error = %e, "index search failed");
                },
            )?;

        let threshold = self.config.similarity_threshold;
        Ok(results.into_iter().filter(|r| r.score >= threshold).collect())
    }

    /// Retrieve the chunks a query would use as context, best first.
    ///
    /// Returns an empty `Vec` without touching the index when the store is empty.
    ///
    /// # Errors
    ///
    /// Propagates index failures.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        if self.store.is_empty().await {
            return Ok(Vec::new());
        }
        self.search(question).await
    }

    async fn prepare(&self, question: &str) -> Result<Prepared> {
        if self.store.is_empty().await {
            info!("query against empty knowledge base");
            return Ok(Prepared::Sentinel(NO_DOCUMENTS_MESSAGE));
        }

        let results = self.search(question).await?;
        if results.is_empty() {
            info!("no relevant chunks found");
            return Ok(Prepared::Sentinel(NO_RELEVANT_MESSAGE));
        }

        let context = results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);
        info!(result_count = results.len(), context_len = context.len(), "context assembled");

        Ok(Prepared::Prompt(build_grounding_prompt(&context, question)))
    }

    /// Answer `question` from the ingested documents.
    ///
    /// Returns [`NO_DOCUMENTS_MESSAGE`] if nothing is ingested and
    /// [`NO_RELEVANT_MESSAGE`] if retrieval comes back empty; neither case
    /// calls the chat model. Otherwise the model's answer is returned as is.
    ///
    /// # Errors
    ///
    /// Index and chat model failures propagate unchanged. Nothing is retried.
    pub async fn query(&self, question: &str) -> Result<String> {
        match self.prepare(question).await? {
            Prepared::Sentinel(message) => Ok(message.to_string()),
            Prepared::Prompt(prompt) => {
                let answer = self.chat_model.complete(&prompt).await.map_err(|e| {
                    error!(model = self.chat_model.name(), error = %e, "chat model call failed");
                    RagError::from(e)
                })?;
                info!(answer_len = answer.len(), "query completed");
                Ok(answer)
            }
        }
    }

    /// Like [`query`](Self::query), but streams the answer.
    ///
    /// The sentinel messages arrive as a single fragment.
    ///
    /// # Errors
    ///
    /// Failures before the first fragment are returned here; failures after
    /// that surface as stream items.
    pub async fn query_stream(&self, question: &str) -> Result<ChatStream> {
        match self.prepare(question).await? {
            Prepared::Sentinel(message) => Ok(single_fragment(message)),
            Prepared::Prompt(prompt) => self.chat_model.stream(&prompt).await.map_err(|e| {
                error!(model = self.chat_model.name(), error = %e, "chat model stream failed");
                RagError::from(e)
            }),
        }
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `chat_model` and one of `embedding_provider` / `index_factory`
/// are required. The chunker defaults to a [`SentenceChunker`] sized from the
/// config.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::default())
///     .embedding_provider(Arc::new(embedder))
///     .chat_model(Arc::new(model))
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    chunker: Option<Arc<dyn Chunker>>,
    chat_model: Option<Arc<dyn ChatModel>>,
    index_factory: Option<IndexFactory>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the chat model used to answer queries.
    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    /// Index with an in-memory vector store over this embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.index_factory = Some(vector_index_factory(provider));
        self
    }

    /// Use a custom index. The factory is called once at build time and again
    /// on every [`RagPipeline::clear_all`].
    pub fn index_factory(mut self, factory: IndexFactory) -> Self {
        self.index_factory = Some(factory);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing or
    /// the config is invalid.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let chat_model = self
            .chat_model
            .ok_or_else(|| RagError::ConfigError("chat_model is required".to_string()))?;
        let index_factory = self.index_factory.ok_or_else(|| {
            RagError::ConfigError("embedding_provider or index_factory is required".to_string())
        })?;
        let chunker = self
            .chunker
            .unwrap_or_else(|| Arc::new(SentenceChunker::new(config.max_chunk_size)));

        let index = RwLock::new(index_factory());
        Ok(RagPipeline {
            config,
            chunker,
            chat_model,
            store: DocumentStore::new(),
            index,
            index_factory,
            writer: Mutex::new(()),
        })
    }
}
