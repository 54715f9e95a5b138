//! LLM clients against local fake servers.

use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use chemlab_model::{GeminiClient, Llm, LlmRequest, ModelError, OpenAIClient, OpenAIConfig};
use serde_json::{Value, json};

async fn spawn(app: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });
    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn chat_completion_sends_system_and_user() {
    let app = Router::new().route(
        "/openai/v1/chat/completions",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(headers["authorization"], "Bearer gsk-test");
            assert_eq!(body["model"], "llama-3.1-8b-instant");
            assert_eq!(body["messages"][0]["role"], "system");
            assert_eq!(body["messages"][0]["content"], "be strict");
            assert_eq!(body["messages"][1]["role"], "user");
            let user = body["messages"][1]["content"].as_str().unwrap_or_default().to_string();
            Json(json!({
                "choices": [{ "message": { "role": "assistant", "content": format!("echo: {user}") } }]
            }))
        }),
    );
    let (base, handle) = spawn(app).await;

    let client =
        OpenAIClient::new(OpenAIConfig::groq("gsk-test").with_base_url(format!("{base}/openai/v1"))).unwrap();
    let answer = client.generate(&LlmRequest::new("be strict", "Zn + HCl?")).await.unwrap();

    assert_eq!(answer, "echo: Zn + HCl?");
    assert_eq!(client.provider(), "Groq");
    handle.abort();
}

#[tokio::test]
async fn chat_completion_temperature_is_forwarded() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|Json(body): Json<Value>| async move {
            let temperature = body["temperature"].as_f64().unwrap_or(-1.0);
            Json(json!({ "choices": [{ "message": { "content": format!("{temperature:.1}") } }] }))
        }),
    );
    let (base, handle) = spawn(app).await;

    let client = OpenAIClient::new(
        OpenAIConfig::new("sk-test", "gpt-4o-mini").with_base_url(format!("{base}/v1")),
    )
    .unwrap();
    let answer = client.generate(&LlmRequest::new("s", "u").with_temperature(0.5)).await.unwrap();

    assert_eq!(answer, "0.5");
    handle.abort();
}

#[tokio::test]
async fn chat_completion_api_error_carries_status() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "error": { "message": "rate limited" } })))
        }),
    );
    let (base, handle) = spawn(app).await;

    let client = OpenAIClient::new(
        OpenAIConfig::new("sk-test", "gpt-4o-mini").with_base_url(format!("{base}/v1")),
    )
    .unwrap();
    let err = client.generate(&LlmRequest::new("s", "u")).await.unwrap_err();

    match err {
        ModelError::Api { provider, status, message } => {
            assert_eq!(provider, "OpenAI");
            assert_eq!(status, 429);
            assert_eq!(message, "rate limited");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    handle.abort();
}

#[tokio::test]
async fn chat_completion_without_choices_is_empty_response() {
    let app = Router::new()
        .route("/v1/chat/completions", post(|| async { Json(json!({ "choices": [] })) }));
    let (base, handle) = spawn(app).await;

    let client = OpenAIClient::new(
        OpenAIConfig::new("sk-test", "gpt-4o-mini").with_base_url(format!("{base}/v1")),
    )
    .unwrap();
    let err = client.generate(&LlmRequest::new("s", "u")).await.unwrap_err();

    assert!(matches!(err, ModelError::EmptyResponse { .. }));
    handle.abort();
}

#[tokio::test]
async fn gemini_joins_candidate_parts() {
    let app = Router::new().route(
        "/v1beta/models/{call}",
        post(|Path(call): Path<String>, headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(call, "gemini-2.0-flash:generateContent");
            assert_eq!(headers["x-goog-api-key"], "g-test");
            assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be creative");
            assert_eq!(body["contents"][0]["role"], "user");
            assert_eq!(body["contents"][0]["parts"][0]["text"], "Na + Cl2?");
            Json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Sodium " }, { "text": "chloride." }] } }]
            }))
        }),
    );
    let (base, handle) = spawn(app).await;

    let client =
        GeminiClient::new("g-test", "gemini-2.0-flash").unwrap().with_base_url(format!("{base}/v1beta"));
    let answer = client.generate(&LlmRequest::new("be creative", "Na + Cl2?")).await.unwrap();

    assert_eq!(answer, "Sodium chloride.");
    handle.abort();
}

#[tokio::test]
async fn gemini_error_status_is_reported() {
    let app = Router::new().route(
        "/v1beta/models/{call}",
        post(|| async {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": { "message": "API key not valid" } })))
        }),
    );
    let (base, handle) = spawn(app).await;

    let client =
        GeminiClient::new("bad", "gemini-2.0-flash").unwrap().with_base_url(format!("{base}/v1beta"));
    let err = client.generate(&LlmRequest::new("s", "u")).await.unwrap_err();

    match err {
        ModelError::Api { provider, status, message } => {
            assert_eq!(provider, "Gemini");
            assert_eq!(status, 400);
            assert!(message.contains("not valid"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    handle.abort();
}

#[tokio::test]
async fn unreachable_server_is_request_error() {
    let client = OpenAIClient::new(
        OpenAIConfig::new("sk-test", "gpt-4o-mini").with_base_url("http://127.0.0.1:1/v1"),
    )
    .unwrap();
    let err = client.generate(&LlmRequest::new("s", "u")).await.unwrap_err();
    assert!(matches!(err, ModelError::Request { .. }));
}
