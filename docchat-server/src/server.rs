use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use anyhow::Context;
use async_stream::stream;
use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{delete, get, post},
};
use docchat_model::{ChatModel, ChatStream, Message};
use docchat_rag::RagPipeline;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    config::AppConfig,
    error::{ApiError, ApiJson, require},
    providers::{build_chat_model, build_pipeline},
};

/// Shared handler state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub chat_model: Arc<dyn ChatModel>,
    pub system_prompt: Arc<str>,
}

impl AppState {
    pub fn new(
        pipeline: RagPipeline,
        chat_model: Arc<dyn ChatModel>,
        system_prompt: impl Into<Arc<str>>,
    ) -> Self {
        Self { pipeline: Arc::new(pipeline), chat_model, system_prompt: system_prompt.into() }
    }

    /// Build the providers and pipeline described by `config`.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let chat_model = build_chat_model(&config.chat)?;
        let pipeline = build_pipeline(config, chat_model.clone())?;
        Ok(Self::new(pipeline, chat_model, config.chat.system_prompt.as_str()))
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/rag/add", post(add_content))
        .route("/api/rag/upload", post(upload_document))
        .route("/api/rag/query", get(query))
        .route("/api/rag/stream", get(stream_query))
        .route("/api/rag/documents", get(list_documents))
        .route("/api/rag/clear", delete(clear_knowledge_base))
        .route("/api/chat/simple", get(simple_chat))
        .route("/api/chat/system", post(system_chat))
        .route("/api/chat/stream", get(stream_chat))
        .route("/api/chat/conversation", post(conversation))
        .route("/api/chatclient/ask", get(ask))
        .route("/api/chatclient/assistant", post(assistant))
        .route("/api/chatclient/stream", get(stream_answer))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| "invalid host/port for docchat server")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("docchat listening on http://{}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("docchat stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl-c");
    }
}

#[derive(Debug, Deserialize)]
struct QuestionParams {
    question: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageParams {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddContentRequest {
    title: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SystemChatRequest {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConversationRequest {
    messages: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct AssistantRequest {
    role: Option<String>,
    question: Option<String>,
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok","service":"docchat"}))
}

// ── RAG ────────────────────────────────────────────────────────────

async fn add_content(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AddContentRequest>,
) -> Result<Json<Value>, ApiError> {
    let title = require("title", request.title.as_deref())?;
    let content = require("content", request.content.as_deref())?;

    let chunks = state.pipeline.ingest(title, content).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Content indexed successfully",
        "title": title,
        "chunks": chunks.len(),
    })))
}

/// Index the `file` field of a multipart form, titled by its file name.
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    while let Some(field) =
        multipart.next_field().await.map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ApiError::BadRequest("'file' must be UTF-8 text".to_string()))?;

        let filename = require("filename", filename.as_deref())?;
        let content = require("file", Some(content))?;
        let chunks = state.pipeline.ingest(filename, content).await?;
        return Ok(Json(json!({
            "status": "success",
            "message": "Document indexed successfully",
            "filename": filename,
            "chunks": chunks.len(),
        })));
    }
    Err(ApiError::BadRequest("'file' field is required".to_string()))
}

async fn query(
    State(state): State<AppState>,
    Query(params): Query<QuestionParams>,
) -> Result<Json<Value>, ApiError> {
    let question = require("question", params.question.as_deref())?;
    let answer = state.pipeline.query(question).await?;
    Ok(Json(json!({"question": question, "answer": answer})))
}

async fn stream_query(
    State(state): State<AppState>,
    Query(params): Query<QuestionParams>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let question = require("question", params.question.as_deref())?;
    let fragments = state.pipeline.query_stream(question).await?;
    Ok(sse(fragments))
}

async fn list_documents(State(state): State<AppState>) -> impl IntoResponse {
    let documents = state.pipeline.documents().await;
    Json(json!({"count": documents.len(), "documents": documents}))
}

async fn clear_knowledge_base(State(state): State<AppState>) -> impl IntoResponse {
    state.pipeline.clear_all().await;
    Json(json!({"status": "success", "message": "Knowledge base cleared"}))
}

// ── Chat ───────────────────────────────────────────────────────────

async fn simple_chat(
    State(state): State<AppState>,
    Query(params): Query<MessageParams>,
) -> Result<Json<Value>, ApiError> {
    let message = require("message", params.message.as_deref())?;
    let answer = state.chat_model.complete(message).await?;
    Ok(Json(json!({"question": message, "answer": answer})))
}

async fn system_chat(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SystemChatRequest>,
) -> Result<Json<Value>, ApiError> {
    let message = require("message", request.message.as_deref())?;
    let messages = [Message::system(state.system_prompt.as_ref()), Message::user(message)];
    let answer = state.chat_model.complete_messages(&messages).await?;
    Ok(Json(json!({
        "question": message,
        "answer": answer,
        "model": state.chat_model.name(),
    })))
}

async fn stream_chat(
    State(state): State<AppState>,
    Query(params): Query<MessageParams>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let message = require("message", params.message.as_deref())?;
    let fragments = state.chat_model.stream(message).await?;
    Ok(sse(fragments))
}

/// Every entry is sent as a user message, in order.
async fn conversation(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ConversationRequest>,
) -> Result<Json<Value>, ApiError> {
    let texts = request.messages.unwrap_or_default();
    if texts.is_empty() {
        return Err(ApiError::BadRequest("'messages' must not be empty".to_string()));
    }
    for text in &texts {
        require("messages", Some(text.as_str()))?;
    }

    let messages: Vec<Message> = texts.iter().map(|text| Message::user(text.as_str())).collect();
    let response = state.chat_model.complete_messages(&messages).await?;
    Ok(Json(json!({"conversation": texts, "response": response})))
}

// ── Chat client ────────────────────────────────────────────────────

/// Build the system instruction for `/api/chatclient/assistant`.
fn assistant_instruction(role: &str) -> String {
    format!("You are a {role}. Provide detailed, accurate answers.")
}

async fn ask(
    State(state): State<AppState>,
    Query(params): Query<QuestionParams>,
) -> Result<Json<Value>, ApiError> {
    let question = require("question", params.question.as_deref())?;
    let answer = state.chat_model.complete(question).await?;
    Ok(Json(json!({"question": question, "answer": answer})))
}

async fn assistant(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AssistantRequest>,
) -> Result<Json<Value>, ApiError> {
    let role = require("role", request.role.as_deref())?;
    let question = require("question", request.question.as_deref())?;

    let messages = [Message::system(assistant_instruction(role)), Message::user(question)];
    let answer = state.chat_model.complete_messages(&messages).await?;
    Ok(Json(json!({"role": role, "question": question, "answer": answer})))
}

async fn stream_answer(
    State(state): State<AppState>,
    Query(params): Query<QuestionParams>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let question = require("question", params.question.as_deref())?;
    let fragments = state.chat_model.stream(question).await?;
    Ok(sse(fragments))
}

/// Forward answer fragments as SSE `data` events.
///
/// A failure mid-stream is sent as a final `error` event. Dropping the
/// response (client disconnect) drops the upstream stream with it.
fn sse(fragments: ChatStream) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let events = stream! {
        let mut fragments = fragments;
        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(text) => yield Ok(Event::default().data(text)),
                Err(err) => {
                    error!(error = %err, "answer stream failed");
                    yield Ok(Event::default().event("error").data(err.to_string()));
                    break;
                }
            }
        }
    };

    Sse::new(events).keep_alive(KeepAlive::default())
}
