//! # chemlab-rag
//!
//! Retrieval layer for the chemlab assistant: load documents from a
//! directory, split them into overlapping chunks, embed the chunks and answer
//! nearest-neighbour queries.
//!
//! ## Overview
//!
//! - [`loader`]: text extraction for `.txt`, `.md`, `.pdf`, `.docx`
//! - [`chunking`]: [`FixedSizeChunker`] and [`RecursiveChunker`]
//! - [`EmbeddingProvider`]: local `all-MiniLM-L6-v2` on ONNX Runtime (`onnx`
//!   feature), OpenAI and Ollama (`openai` / `ollama`), and the
//!   [`HashingEmbeddingProvider`] for tests and offline runs
//! - [`VectorStore`]: [`InMemoryVectorStore`] and the persistent
//!   [`FileVectorStore`]
//! - [`KnowledgeBase`]: `add_documents` / `search` over one collection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chemlab_rag::{FileVectorStore, HashingEmbeddingProvider, KnowledgeBase};
//!
//! let kb = KnowledgeBase::builder()
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .vector_store(Arc::new(FileVectorStore::open("chroma_db").await?))
//!     .build()
//!     .await?;
//! kb.ingest_directory("data").await?;
//! for passage in kb.search("Zn + HCl", 3).await? {
//!     println!("{passage}");
//! }
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hashing;
#[cfg(any(feature = "openai", feature = "ollama"))]
mod http;
pub mod inmemory;
pub mod knowledge_base;
pub mod loader;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "onnx")]
pub mod onnx;
#[cfg(feature = "openai")]
pub mod openai;
pub mod persistent;
pub mod retriever;
pub mod vectorstore;

pub use chunking::{ChunkSpans, Chunker, FixedSizeChunker, RecursiveChunker};
pub use config::{ChunkingStrategy, RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use hashing::HashingEmbeddingProvider;
pub use inmemory::InMemoryVectorStore;
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseBuilder};
pub use loader::{discover_documents, extract_text, load_documents};
#[cfg(feature = "ollama")]
pub use ollama::OllamaEmbeddingProvider;
#[cfg(feature = "onnx")]
pub use onnx::{DEFAULT_ONNX_MODEL, OnnxEmbeddingProvider};
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
pub use persistent::FileVectorStore;
pub use retriever::{Retriever, StaticRetriever};
pub use vectorstore::VectorStore;
