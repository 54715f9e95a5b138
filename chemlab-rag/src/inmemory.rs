//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] keeps every collection in a `HashMap` behind a
//! `tokio::sync::RwLock`. Nothing survives the process; use
//! [`FileVectorStore`](crate::FileVectorStore) for a persistent index.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorStore, rank};

/// An in-memory vector store using cosine similarity for search.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Vec<Chunk>>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(collection: &str) -> RagError {
    RagError::VectorStore {
        backend: "InMemory".to_string(),
        message: format!("collection '{collection}' does not exist"),
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend(&self) -> &str {
        "InMemory"
    }

    async fn create_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn add(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        store.extend_from_slice(chunks);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;
        Ok(rank(store.iter(), embedding, top_k))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.into(),
            text: format!("text {id}"),
            embedding,
            metadata: HashMap::new(),
            document_id: "doc".into(),
        }
    }

    #[tokio::test]
    async fn add_to_unknown_collection_fails() {
        let store = InMemoryVectorStore::new();
        let err = store.add("nope", &[chunk("0_0", vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStore { .. }));
    }

    #[tokio::test]
    async fn duplicate_ids_are_kept() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store.add("c", &[chunk("0_0", vec![1.0, 0.0])]).await.unwrap();
        store.add("c", &[chunk("0_0", vec![1.0, 0.0])]).await.unwrap();
        assert_eq!(store.count("c").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let store = InMemoryVectorStore::new();
        store.create_collection("c", 2).await.unwrap();
        store
            .add("c", &[chunk("far", vec![0.0, 1.0]), chunk("near", vec![1.0, 0.1])])
            .await
            .unwrap();

        let results = store.search("c", &[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.id, "near");
    }
}
