//! The retrieval seam consumed by the assistant.

use async_trait::async_trait;

use crate::error::Result;

/// Anything that can return the passages most relevant to a query.
///
/// [`KnowledgeBase`](crate::KnowledgeBase) is the production implementation;
/// tests substitute fixed passage lists.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Texts of the `n_results` most relevant passages, most relevant first.
    async fn search(&self, query: &str, n_results: usize) -> Result<Vec<String>>;
}

/// A [`Retriever`] that always returns the same passages.
#[derive(Debug, Clone, Default)]
pub struct StaticRetriever {
    passages: Vec<String>,
}

impl StaticRetriever {
    /// Create a retriever serving `passages` for every query.
    pub fn new<I, S>(passages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { passages: passages.into_iter().map(Into::into).collect() }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn search(&self, _query: &str, n_results: usize) -> Result<Vec<String>> {
        Ok(self.passages.iter().take(n_results).cloned().collect())
    }
}
