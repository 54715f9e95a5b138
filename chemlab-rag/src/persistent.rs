//! File-backed vector store.
//!
//! Each collection is persisted as a JSON snapshot `{collection}.json` inside
//! the index directory. Snapshots are loaded when the store is opened and
//! rewritten (temp file + rename) after every `add`, so the index survives
//! restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorStore, rank};

const BACKEND: &str = "File";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    name: String,
    dimensions: usize,
    updated_at: DateTime<Utc>,
    chunks: Vec<Chunk>,
}

/// A persistent vector store rooted at an index directory.
///
/// # Example
///
/// ```rust,ignore
/// use chemlab_rag::{FileVectorStore, VectorStore};
///
/// let store = FileVectorStore::open("./chroma_db").await?;
/// store.create_collection("rag_documents", 384).await?;
/// ```
#[derive(Debug)]
pub struct FileVectorStore {
    root: PathBuf,
    collections: RwLock<HashMap<String, Snapshot>>,
}

impl FileVectorStore {
    /// Open (creating if needed) the index directory and load every snapshot in it.
    ///
    /// # Errors
    ///
    /// Propagates filesystem errors and malformed snapshots.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;

        let mut collections = HashMap::new();
        let mut entries = tokio::fs::read_dir(&root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
            debug!(collection = %snapshot.name, chunks = snapshot.chunks.len(), "loaded snapshot");
            collections.insert(snapshot.name.clone(), snapshot);
        }

        info!(path = %root.display(), collections = collections.len(), "opened vector index");
        Ok(Self { root, collections: RwLock::new(collections) })
    }

    /// The index directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let path = self.snapshot_path(&snapshot.name);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(snapshot)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

fn store_error(message: String) -> RagError {
    RagError::VectorStore { backend: BACKEND.to_string(), message }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RagError::Config(format!(
            "collection name '{name}' may only contain ASCII letters, digits, '_' and '-'"
        )))
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        validate_name(name)?;
        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(name) {
            if existing.dimensions != dimensions {
                return Err(store_error(format!(
                    "collection '{name}' holds {}-dimensional embeddings, requested {dimensions}",
                    existing.dimensions
                )));
            }
            return Ok(());
        }

        let snapshot =
            Snapshot { name: name.to_string(), dimensions, updated_at: Utc::now(), chunks: Vec::new() };
        self.persist(&snapshot).await?;
        collections.insert(name.to_string(), snapshot);
        Ok(())
    }

    async fn add(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let snapshot = collections
            .get_mut(collection)
            .ok_or_else(|| store_error(format!("collection '{collection}' does not exist")))?;

        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != snapshot.dimensions) {
            return Err(store_error(format!(
                "chunk '{}' has {} dimensions, collection '{collection}' expects {}",
                bad.id,
                bad.embedding.len(),
                snapshot.dimensions
            )));
        }

        // The in-memory index only changes once the new snapshot is on disk.
        let mut staged = snapshot.clone();
        staged.chunks.extend_from_slice(chunks);
        staged.updated_at = Utc::now();
        self.persist(&staged).await?;
        *snapshot = staged;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        match collections.get(collection) {
            Some(snapshot) => Ok(rank(snapshot.chunks.iter(), embedding, top_k)),
            None => Err(store_error(format!("collection '{collection}' does not exist"))),
        }
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, |s| s.chunks.len()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn chunk(id: &str, text: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.into(),
            text: text.into(),
            embedding,
            metadata: HashMap::new(),
            document_id: "reactions".into(),
        }
    }

    #[tokio::test]
    async fn snapshots_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileVectorStore::open(dir.path()).await.unwrap();
            store.create_collection("rag_documents", 2).await.unwrap();
            store
                .add("rag_documents", &[chunk("0_0", "Zn + HCl -> ZnCl2 + H2", vec![1.0, 0.0])])
                .await
                .unwrap();
        }

        let reopened = FileVectorStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.count("rag_documents").await.unwrap(), 1);
        let results = reopened.search("rag_documents", &[1.0, 0.0], 3).await.unwrap();
        assert_eq!(results[0].chunk.text, "Zn + HCl -> ZnCl2 + H2");
        assert!(dir.path().join("rag_documents.json").exists());
        assert!(!dir.path().join("rag_documents.json.tmp").exists());
    }

    #[tokio::test]
    async fn rejects_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::open(dir.path()).await.unwrap();
        store.create_collection("docs", 3).await.unwrap();

        assert!(store.create_collection("docs", 4).await.is_err());
        let err = store.add("docs", &[chunk("0_0", "x", vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStore { .. }));
        assert_eq!(store.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_write_leaves_index_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::open(dir.path()).await.unwrap();
        store.create_collection("docs", 2).await.unwrap();

        // A non-empty directory where the snapshot file belongs makes the rename fail.
        let snapshot = dir.path().join("docs.json");
        std::fs::remove_file(&snapshot).unwrap();
        std::fs::create_dir(&snapshot).unwrap();
        std::fs::write(snapshot.join("blocker"), b"x").unwrap();

        let result = store.add("docs", &[chunk("0_0", "Fe + S -> FeS", vec![1.0, 0.0])]).await;
        assert!(matches!(result, Err(RagError::Io(_))));
        assert_eq!(store.count("docs").await.unwrap(), 0);
        assert!(store.search("docs", &[1.0, 0.0], 3).await.unwrap().is_empty());

        // Once the path is writable again only the retried chunk is stored.
        std::fs::remove_dir_all(&snapshot).unwrap();
        store.add("docs", &[chunk("0_1", "Cu + S -> CuS", vec![0.0, 1.0])]).await.unwrap();
        let reopened = FileVectorStore::open(dir.path()).await.unwrap();
        let results = reopened.search("docs", &[0.0, 1.0], 3).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.text, "Cu + S -> CuS");
    }

    #[tokio::test]
    async fn rejects_path_like_collection_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileVectorStore::open(dir.path()).await.unwrap();
        assert!(matches!(store.create_collection("../escape", 3).await, Err(RagError::Config(_))));
    }

    #[tokio::test]
    async fn corrupt_snapshot_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{not json").unwrap();
        let err = FileVectorStore::open(dir.path()).await.unwrap_err();
        assert!(matches!(err, RagError::Serialization(_)));
    }
}
