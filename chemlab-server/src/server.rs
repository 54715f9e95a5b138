use std::{net::SocketAddr, path::Path, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chemlab_assistant::{Assistant, AssistantError, AssistantMode, reaction_query};
use chemlab_model::{Llm, resolve_from_env};
use chemlab_rag::{FileVectorStore, KnowledgeBase, Retriever, discover_documents};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::reactants::{self, REACTANTS, Reactant};

/// One assistant per mode, built once at start-up and shared by all requests.
#[derive(Clone, Debug)]
pub struct AppState {
    strict: Arc<Assistant>,
    creative: Arc<Assistant>,
    documents: Arc<[String]>,
}

impl AppState {
    pub fn new(strict: Arc<Assistant>, creative: Arc<Assistant>) -> Self {
        Self { strict, creative, documents: Arc::from([]) }
    }

    /// Knowledge-base source files listed by `GET /api/documents`.
    pub fn with_documents(mut self, documents: Vec<String>) -> Self {
        self.documents = documents.into();
        self
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// Build both assistants over the same LLM and retriever.
    pub fn from_backend(
        llm: Arc<dyn Llm>,
        retriever: Arc<dyn Retriever>,
        top_k: usize,
    ) -> chemlab_assistant::Result<Self> {
        let build = |mode| {
            Assistant::builder()
                .mode(mode)
                .llm(llm.clone())
                .retriever(retriever.clone())
                .top_k(top_k)
                .build()
                .map(Arc::new)
        };
        Ok(Self::new(build(AssistantMode::Strict)?, build(AssistantMode::Creative)?))
    }

    pub fn assistant(&self, mode: AssistantMode) -> &Arc<Assistant> {
        match mode {
            AssistantMode::Strict => &self.strict,
            AssistantMode::Creative => &self.creative,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    pub reactant_a: String,
    pub reactant_b: String,
    #[serde(default)]
    pub mode: AssistantMode,
}

#[derive(Debug, Serialize)]
pub struct ReactResponse {
    pub query: String,
    pub answer: String,
    /// False when the answer is the refusal sentence.
    pub known: bool,
    pub mode: AssistantMode,
    pub reactant_a: Reactant,
    pub reactant_b: Reactant,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub mode: AssistantMode,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub known: bool,
    pub mode: AssistantMode,
}

#[derive(Debug, Serialize)]
pub struct DocumentsResponse {
    pub documents: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown reactant '{0}'")]
    UnknownReactant(String),

    #[error("question must not be empty")]
    EmptyQuestion,

    #[error(transparent)]
    Assistant(#[from] AssistantError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::UnknownReactant(_) => StatusCode::NOT_FOUND,
            ApiError::EmptyQuestion => StatusCode::BAD_REQUEST,
            ApiError::Assistant(e) => {
                error!(error = %e, "assistant call failed");
                StatusCode::BAD_GATEWAY
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/reactants", get(list_reactants))
        .route("/api/documents", get(list_documents))
        .route("/api/react", post(react))
        .route("/api/ask", post(ask))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Source files under `dir`, as paths relative to it with `/` separators.
///
/// # Errors
///
/// Fails when `dir` exists but is not a directory.
pub fn source_files(dir: &Path) -> chemlab_rag::Result<Vec<String>> {
    Ok(discover_documents(dir)?
        .iter()
        .map(|path| {
            let relative = path.strip_prefix(dir).unwrap_or(path);
            relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
        })
        .collect())
}

/// Open the index, ingest documents when needed and wire up both assistants.
///
/// # Errors
///
/// Fails when no LLM credentials are configured, the embedder cannot be
/// built, or the index directory is unusable.
pub async fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let llm = resolve_from_env()?.build()?;
    let rag_config = config.rag_config().context("invalid retrieval settings")?;
    let top_k = rag_config.top_k;
    let embedder =
        config.embedder.build(&config.model_dir).await.context("failed to set up embedding provider")?;
    let store = FileVectorStore::open(&config.index_dir)
        .await
        .with_context(|| format!("failed to open index at {}", config.index_dir.display()))?;

    let knowledge_base = KnowledgeBase::builder()
        .config(rag_config)
        .collection(config.collection.as_str())
        .embedding_provider(embedder)
        .vector_store(Arc::new(store))
        .build()
        .await?;

    let existing = knowledge_base.len().await?;
    if config.skip_ingest {
        info!(chunks = existing, "skipping ingestion");
    } else if existing > 0 && !config.reingest {
        info!(chunks = existing, "collection already populated; skipping ingestion");
    } else {
        let added = knowledge_base
            .ingest_directory(&config.data_dir)
            .await
            .with_context(|| format!("failed to ingest {}", config.data_dir.display()))?;
        if added == 0 {
            warn!(dir = %config.data_dir.display(), "no documents ingested; strict mode will refuse everything");
        }
    }

    let documents = source_files(&config.data_dir)
        .with_context(|| format!("failed to list {}", config.data_dir.display()))?;
    info!(files = documents.len(), "knowledge base sources");

    Ok(AppState::from_backend(llm, Arc::new(knowledge_base), top_k)?.with_documents(documents))
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = build_state(&config).await?;
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for chemlab server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("chemlab listening on http://{}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}

async fn index() -> impl IntoResponse {
    Html(include_str!("../ui/index.html"))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok","service":"chemlab"}))
}

async fn list_reactants() -> Json<&'static [Reactant]> {
    Json(REACTANTS)
}

async fn list_documents(State(state): State<AppState>) -> Json<DocumentsResponse> {
    Json(DocumentsResponse { documents: state.documents().to_vec() })
}

async fn react(
    State(state): State<AppState>,
    Json(request): Json<ReactRequest>,
) -> Result<Json<ReactResponse>, ApiError> {
    let lookup = |symbol: &str| {
        reactants::find(symbol).copied().ok_or_else(|| ApiError::UnknownReactant(symbol.to_string()))
    };
    let reactant_a = lookup(&request.reactant_a)?;
    let reactant_b = lookup(&request.reactant_b)?;

    let assistant = state.assistant(request.mode);
    let query = reaction_query(reactant_a.symbol, reactant_b.symbol);
    let answer = assistant.invoke(&query).await?;
    let known = !answer.contains(assistant.refusal());

    Ok(Json(ReactResponse { query, answer, known, mode: request.mode, reactant_a, reactant_b }))
}

async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(ApiError::EmptyQuestion);
    }

    let assistant = state.assistant(request.mode);
    let answer = assistant.invoke(question).await?;
    let known = !answer.contains(assistant.refusal());

    Ok(Json(AskResponse { answer, known, mode: request.mode }))
}
