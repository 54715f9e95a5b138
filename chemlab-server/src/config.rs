//! Process configuration from flags and environment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chemlab_rag::{
    ChunkingStrategy, EmbeddingProvider, HashingEmbeddingProvider, OllamaEmbeddingProvider,
    OpenAIEmbeddingProvider, RagConfig,
};
use clap::{Parser, ValueEnum};

/// Which embedding backend the knowledge base uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EmbedderKind {
    /// Local all-MiniLM-L6-v2 sentence embeddings (downloaded on first run).
    #[cfg(feature = "onnx")]
    #[default]
    Minilm,
    /// Token feature hashing. Lexical overlap only; for tests and offline runs.
    #[cfg_attr(not(feature = "onnx"), default)]
    Hashing,
    /// OpenAI embeddings (`OPENAI_API_KEY`).
    Openai,
    /// Local Ollama server.
    Ollama,
}

impl EmbedderKind {
    /// Construct the provider. `model_dir` is only used by local models.
    pub async fn build(self, model_dir: &Path) -> chemlab_rag::Result<Arc<dyn EmbeddingProvider>> {
        #[cfg(not(feature = "onnx"))]
        let _ = model_dir;
        let provider: Arc<dyn EmbeddingProvider> = match self {
            #[cfg(feature = "onnx")]
            EmbedderKind::Minilm => Arc::new(chemlab_rag::OnnxEmbeddingProvider::load(model_dir).await?),
            EmbedderKind::Hashing => Arc::new(HashingEmbeddingProvider::default()),
            EmbedderKind::Openai => Arc::new(OpenAIEmbeddingProvider::from_env()?),
            EmbedderKind::Ollama => Arc::new(OllamaEmbeddingProvider::new()),
        };
        Ok(provider)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "chemlab")]
#[command(about = "Virtual chemistry lab backed by retrieval-augmented generation")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "CHEMLAB_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "CHEMLAB_PORT", default_value_t = 8501)]
    pub port: u16,

    /// Directory of source documents (.txt, .md, .pdf, .docx)
    #[arg(long, env = "CHEMLAB_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory holding the persisted vector index
    #[arg(long, env = "CHEMLAB_INDEX_DIR", default_value = "chroma_db")]
    pub index_dir: PathBuf,

    /// Collection name inside the index
    #[arg(long, default_value = chemlab_rag::config::DEFAULT_COLLECTION)]
    pub collection: String,

    /// Embedding backend
    #[arg(long, env = "CHEMLAB_EMBEDDER", value_enum, default_value_t)]
    pub embedder: EmbedderKind,

    /// Where the local embedding model is cached
    #[arg(long, env = "CHEMLAB_MODEL_DIR", default_value = "models/all-MiniLM-L6-v2")]
    pub model_dir: PathBuf,

    /// Chunking strategy (fixed or recursive)
    #[arg(long, default_value = "fixed")]
    pub chunking: ChunkingStrategy,

    /// Chunk size in characters
    #[arg(long, default_value_t = chemlab_rag::chunking::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Characters shared between neighbouring chunks
    #[arg(long, default_value_t = chemlab_rag::chunking::DEFAULT_CHUNK_OVERLAP)]
    pub chunk_overlap: usize,

    /// Passages retrieved per question
    #[arg(long, default_value_t = chemlab_rag::config::DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Do not ingest the data directory at start-up
    #[arg(long)]
    pub skip_ingest: bool,

    /// Ingest even if the collection already holds chunks (appends duplicates)
    #[arg(long, conflicts_with = "skip_ingest")]
    pub reingest: bool,
}

impl ServerConfig {
    /// Retrieval settings derived from the flags.
    pub fn rag_config(&self) -> chemlab_rag::Result<RagConfig> {
        RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .chunking(self.chunking)
            .build()
    }
}
