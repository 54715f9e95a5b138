//! Mock LLM for testing and offline runs.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::llm::{Llm, LlmRequest};

/// An [`Llm`] that replays canned answers and records every request.
///
/// Queued responses are returned in order; once the queue is empty the
/// fallback answer is returned.
#[derive(Debug)]
pub struct MockLlm {
    name: String,
    fallback: String,
    queued: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    /// A mock that always answers `fallback`.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            name: "mock-llm".into(),
            fallback: fallback.into(),
            queued: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a one-off answer ahead of the fallback.
    pub async fn push_response(&self, response: impl Into<String>) {
        self.queued.lock().await.push_back(response.into());
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of calls made so far.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &LlmRequest) -> Result<String> {
        self.requests.lock().await.push(request.clone());
        let queued = self.queued.lock().await.pop_front();
        Ok(queued.unwrap_or_else(|| self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_queue_then_fallback() {
        let llm = MockLlm::new("fallback");
        llm.push_response("first").await;

        let request = LlmRequest::new("system", "user");
        assert_eq!(llm.generate(&request).await.unwrap(), "first");
        assert_eq!(llm.generate(&request).await.unwrap(), "fallback");
        assert_eq!(llm.call_count().await, 2);
        assert_eq!(llm.requests().await[0], request);
    }
}
