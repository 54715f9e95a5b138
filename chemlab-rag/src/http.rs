//! JSON-over-HTTP plumbing shared by the remote embedding providers.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::error;

use crate::error::{RagError, Result};

pub(crate) fn embedding_error(provider: &str, message: impl Into<String>) -> RagError {
    RagError::Embedding { provider: provider.to_string(), message: message.into() }
}

/// Best-effort error detail from a failed response body.
///
/// Understands OpenAI's `{"error": {"message": ..}}` and Ollama's
/// `{"error": ".."}`; anything else is returned as-is.
fn error_detail(body: String) -> String {
    serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body)
}

/// Send `body` as JSON and decode the JSON reply.
///
/// Transport failures, non-success statuses and undecodable replies all map
/// to [`RagError::Embedding`] tagged with `provider`.
pub(crate) async fn post_json<B, T>(request: reqwest::RequestBuilder, provider: &str, body: &B) -> Result<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = request.json(body).send().await.map_err(|e| {
        error!(provider, error = %e, "request failed");
        embedding_error(provider, format!("request failed: {e}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        let detail = error_detail(response.text().await.unwrap_or_default());
        error!(provider, %status, "API error");
        return Err(embedding_error(provider, format!("API returned {status}: {detail}")));
    }

    response.json().await.map_err(|e| {
        error!(provider, error = %e, "failed to parse response");
        embedding_error(provider, format!("failed to parse response: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_from_known_error_shapes() {
        assert_eq!(error_detail(r#"{"error":{"message":"invalid api key"}}"#.into()), "invalid api key");
        assert_eq!(error_detail(r#"{"error":"model not found"}"#.into()), "model not found");
        assert_eq!(error_detail("Bad Gateway".into()), "Bad Gateway");
    }
}
