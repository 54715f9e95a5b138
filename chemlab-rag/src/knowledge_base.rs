//! Knowledge base orchestrator.
//!
//! [`KnowledgeBase`] ties a [`Chunker`], an [`EmbeddingProvider`] and a
//! [`VectorStore`] collection together behind two operations:
//! `add_documents` (chunk → embed → store) and `search` (embed → nearest
//! neighbours → chunk texts).
//!
//! # Example
//!
//! ```rust,ignore
//! use chemlab_rag::{KnowledgeBase, RagConfig, InMemoryVectorStore, HashingEmbeddingProvider};
//!
//! let kb = KnowledgeBase::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()
//!     .await?;
//!
//! kb.ingest_directory("data").await?;
//! let passages = kb.search("Zn + HCl", 3).await?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::{DEFAULT_COLLECTION, RagConfig};
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::loader::load_documents;
use crate::retriever::Retriever;
use crate::vectorstore::VectorStore;

/// A searchable collection of embedded document chunks.
///
/// Construct one via [`KnowledgeBase::builder()`].
pub struct KnowledgeBase {
    config: RagConfig,
    collection: String,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Box<dyn Chunker>,
}

impl KnowledgeBase {
    /// Create a new [`KnowledgeBaseBuilder`].
    pub fn builder() -> KnowledgeBaseBuilder {
        KnowledgeBaseBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Name of the vector-store collection backing this knowledge base.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of chunks currently stored.
    pub async fn len(&self) -> Result<usize> {
        self.vector_store.count(&self.collection).await
    }

    /// Whether no chunk has been stored yet.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Chunk, embed and store a batch of documents.
    ///
    /// Chunk IDs are `{position in documents}_{chunk_index}`. Adding the same
    /// documents twice stores them twice. Returns the number of chunks added.
    ///
    /// # Errors
    ///
    /// Embedding failures surface as [`RagError::Embedding`]; store failures
    /// are propagated unchanged.
    pub async fn add_documents(&self, documents: &[Document]) -> Result<usize> {
        let mut chunks: Vec<Chunk> = documents
            .iter()
            .enumerate()
            .flat_map(|(index, document)| self.chunker.chunk(document, index))
            .collect();

        if chunks.is_empty() {
            info!(documents = documents.len(), chunk_count = 0, "no text chunks to add");
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(provider = self.embedding_provider.name(), error = %e, "embedding failed during ingestion");
            e
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::Embedding {
                provider: self.embedding_provider.name().to_string(),
                message: format!("expected {} embeddings, got {}", chunks.len(), embeddings.len()),
            });
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.vector_store.add(&self.collection, &chunks).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "failed to store chunks");
            e
        })?;

        let chunk_count = chunks.len();
        info!(collection = %self.collection, documents = documents.len(), chunk_count, "added text chunks");
        Ok(chunk_count)
    }

    /// Load every document under `dir` and add it.
    ///
    /// Unreadable files are skipped (see [`load_documents`]).
    pub async fn ingest_directory(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir: PathBuf = dir.as_ref().to_path_buf();
        let documents = tokio::task::spawn_blocking(move || load_documents(dir))
            .await
            .map_err(|e| RagError::Io(std::io::Error::other(e)))??;
        self.add_documents(&documents).await
    }

    /// Nearest chunks to `query` with their similarity scores.
    ///
    /// Results below the configured `similarity_threshold` are dropped.
    pub async fn search_scored(&self, query: &str, n_results: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(provider = self.embedding_provider.name(), error = %e, "embedding failed during query");
            e
        })?;

        let results = self.vector_store.search(&self.collection, &query_embedding, n_results).await?;
        let results: Vec<SearchResult> = match self.config.similarity_threshold {
            Some(threshold) => results.into_iter().filter(|r| r.score >= threshold).collect(),
            None => results,
        };

        info!(collection = %self.collection, result_count = results.len(), "search completed");
        Ok(results)
    }

    /// Texts of the `n_results` chunks nearest to `query`, nearest first.
    ///
    /// An empty knowledge base yields an empty `Vec`.
    pub async fn search(&self, query: &str, n_results: usize) -> Result<Vec<String>> {
        Ok(self.search_scored(query, n_results).await?.into_iter().map(|r| r.chunk.text).collect())
    }
}

#[async_trait]
impl Retriever for KnowledgeBase {
    async fn search(&self, query: &str, n_results: usize) -> Result<Vec<String>> {
        KnowledgeBase::search(self, query, n_results).await
    }
}

/// Builder for constructing a [`KnowledgeBase`].
///
/// The embedding provider and vector store are required. The chunker defaults
/// to the one described by the configuration, and the collection to
/// `rag_documents`.
#[derive(Default)]
pub struct KnowledgeBaseBuilder {
    config: Option<RagConfig>,
    collection: Option<String>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Box<dyn Chunker>>,
}

impl KnowledgeBaseBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Override the chunker derived from the configuration.
    pub fn chunker(mut self, chunker: Box<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Validate the parts and create the collection if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required part is missing, or the
    /// store's error if the collection cannot be created.
    pub async fn build(self) -> Result<KnowledgeBase> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store =
            self.vector_store.ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => config.chunker()?,
        };
        let collection = self.collection.unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        vector_store.create_collection(&collection, embedding_provider.dimensions()).await?;
        info!(
            collection = %collection,
            backend = vector_store.backend(),
            embedder = embedding_provider.name(),
            "knowledge base initialized"
        );

        Ok(KnowledgeBase { config, collection, embedding_provider, vector_store, chunker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashingEmbeddingProvider;
    use crate::inmemory::InMemoryVectorStore;

    async fn knowledge_base() -> KnowledgeBase {
        KnowledgeBase::builder()
            .embedding_provider(Arc::new(HashingEmbeddingProvider::new(128).unwrap()))
            .vector_store(Arc::new(InMemoryVectorStore::new()))
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn build_requires_parts() {
        let err = KnowledgeBase::builder().build().await.err().unwrap();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[tokio::test]
    async fn empty_knowledge_base_returns_no_results() {
        let kb = knowledge_base().await;
        assert!(kb.search("Zn + HCl", 3).await.unwrap().is_empty());
        assert!(kb.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn readding_documents_duplicates_chunks() {
        let kb = knowledge_base().await;
        let docs = [Document::new("zinc", "Zn + HCl -> ZnCl2 + H2", "zinc.txt")];
        assert_eq!(kb.add_documents(&docs).await.unwrap(), 1);
        assert_eq!(kb.add_documents(&docs).await.unwrap(), 1);
        assert_eq!(kb.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn documents_without_text_add_nothing() {
        let kb = knowledge_base().await;
        assert_eq!(kb.add_documents(&[Document::new("empty", "", "empty.csv")]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn threshold_drops_unrelated_chunks() {
        let kb = KnowledgeBase::builder()
            .config(RagConfig::builder().similarity_threshold(0.1).build().unwrap())
            .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
            .vector_store(Arc::new(InMemoryVectorStore::new()))
            .build()
            .await
            .unwrap();
        kb.add_documents(&[Document::new("bio", "Photosynthesis converts light into sugar", "bio.txt")])
            .await
            .unwrap();

        assert!(kb.search("Zn + HCl", 3).await.unwrap().is_empty());
    }
}
