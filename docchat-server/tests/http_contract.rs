use std::{sync::Arc, time::Duration};

use docchat_model::{MockChatModel, Role};
use docchat_rag::{HashEmbeddingProvider, NO_DOCUMENTS_MESSAGE, RagConfig, RagPipeline};
use docchat_server::{AppState, app_router};
use reqwest::StatusCode;
use serde_json::{Value, json};

const SPRING: &str =
    "Spring Boot is a framework. It simplifies configuration. It has auto-configuration.";

fn state_with(model: Arc<MockChatModel>) -> AppState {
    let pipeline = RagPipeline::builder()
        .config(RagConfig::builder().max_chunk_size(40).build().expect("rag config"))
        .embedding_provider(Arc::new(HashEmbeddingProvider::default()))
        .chat_model(model.clone())
        .build()
        .expect("pipeline");
    AppState::new(pipeline, model, "You are terse.")
}

async fn spawn_server(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

async fn spawn_echo_server() -> (String, tokio::task::JoinHandle<()>) {
    spawn_server(state_with(Arc::new(MockChatModel::echo()))).await
}

async fn add(client: &reqwest::Client, base: &str, title: &str, content: &str) -> Value {
    let response = client
        .post(format!("{}/api/rag/add", base))
        .json(&json!({"title": title, "content": content}))
        .send()
        .await
        .expect("add response");
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.expect("add json")
}

#[tokio::test]
async fn health_reports_ok() {
    let (base, handle) = spawn_echo_server().await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .expect("health response")
        .json()
        .await
        .expect("health json");
    assert_eq!(body["status"], "ok");

    handle.abort();
}

#[tokio::test]
async fn add_then_query_grounds_answer_in_document() {
    let (base, handle) = spawn_echo_server().await;
    let client = reqwest::Client::new();

    let added = add(&client, &base, "Spring Boot Guide", SPRING).await;
    assert_eq!(added["status"], "success");
    assert_eq!(added["title"], "Spring Boot Guide");
    assert_eq!(added["chunks"], 3);

    let body: Value = client
        .get(format!("{}/api/rag/query", base))
        .query(&[("question", "What is Spring Boot?")])
        .send()
        .await
        .expect("query response")
        .json()
        .await
        .expect("query json");

    assert_eq!(body["question"], "What is Spring Boot?");
    // The echo model answers with the grounding prompt it was given.
    let answer = body["answer"].as_str().expect("answer field");
    assert!(answer.contains("Spring Boot is a framework."));
    assert!(answer.contains("Question: What is Spring Boot?"));

    handle.abort();
}

#[tokio::test]
async fn query_before_any_upload_returns_sentinel() {
    let (base, handle) = spawn_echo_server().await;

    let body: Value = reqwest::Client::new()
        .get(format!("{}/api/rag/query", base))
        .query(&[("question", "anything")])
        .send()
        .await
        .expect("query response")
        .json()
        .await
        .expect("query json");
    assert_eq!(body["answer"], NO_DOCUMENTS_MESSAGE);

    handle.abort();
}

#[tokio::test]
async fn blank_inputs_are_rejected() {
    let (base, handle) = spawn_echo_server().await;
    let client = reqwest::Client::new();

    let blank_question = client
        .get(format!("{}/api/rag/query", base))
        .query(&[("question", "   ")])
        .send()
        .await
        .expect("query response");
    assert_eq!(blank_question.status(), StatusCode::BAD_REQUEST);
    let body: Value = blank_question.json().await.expect("error json");
    assert_eq!(body["status"], "error");

    let missing_message =
        client.get(format!("{}/api/chat/simple", base)).send().await.expect("chat response");
    assert_eq!(missing_message.status(), StatusCode::BAD_REQUEST);

    let blank_title = client
        .post(format!("{}/api/rag/add", base))
        .json(&json!({"title": "", "content": "Some text."}))
        .send()
        .await
        .expect("add response");
    assert_eq!(blank_title.status(), StatusCode::BAD_REQUEST);

    let empty_conversation = client
        .post(format!("{}/api/chat/conversation", base))
        .json(&json!({"messages": []}))
        .send()
        .await
        .expect("conversation response");
    assert_eq!(empty_conversation.status(), StatusCode::BAD_REQUEST);

    handle.abort();
}

#[tokio::test]
async fn documents_list_and_clear() {
    let (base, handle) = spawn_echo_server().await;
    let client = reqwest::Client::new();

    add(&client, &base, "A", "First version.").await;
    add(&client, &base, "A", "Second version.").await;

    let listed: Value = client
        .get(format!("{}/api/rag/documents", base))
        .send()
        .await
        .expect("documents response")
        .json()
        .await
        .expect("documents json");
    assert_eq!(listed["count"], 2);
    assert_eq!(listed["documents"][0]["id"], "A_chunk_0");
    assert_eq!(listed["documents"][1]["id"], "A_chunk_0");

    let cleared: Value = client
        .delete(format!("{}/api/rag/clear", base))
        .send()
        .await
        .expect("clear response")
        .json()
        .await
        .expect("clear json");
    assert_eq!(cleared["status"], "success");

    let body: Value = client
        .get(format!("{}/api/rag/query", base))
        .query(&[("question", "version?")])
        .send()
        .await
        .expect("query response")
        .json()
        .await
        .expect("query json");
    assert_eq!(body["answer"], NO_DOCUMENTS_MESSAGE);

    handle.abort();
}

#[tokio::test]
async fn upload_indexes_file_under_its_name() {
    let (base, handle) = spawn_echo_server().await;
    let client = reqwest::Client::new();

    let part = reqwest::multipart::Part::text(SPRING).file_name("spring.txt");
    let form = reqwest::multipart::Form::new().part("file", part);
    let response = client
        .post(format!("{}/api/rag/upload", base))
        .multipart(form)
        .send()
        .await
        .expect("upload response");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("upload json");
    assert_eq!(body["filename"], "spring.txt");
    assert_eq!(body["chunks"], 3);

    handle.abort();
}

#[tokio::test]
async fn rag_stream_is_sse() {
    let (base, handle) = spawn_echo_server().await;
    let client = reqwest::Client::new();
    add(&client, &base, "Guide", SPRING).await;

    let response = tokio::time::timeout(
        Duration::from_secs(3),
        client
            .get(format!("{}/api/rag/stream", base))
            .query(&[("question", "What is Spring Boot?")])
            .send(),
    )
    .await
    .expect("stream request timeout")
    .expect("stream response");

    assert!(response.status().is_success());
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_lowercase();
    assert!(content_type.contains("text/event-stream"), "unexpected content type: {content_type}");

    let body = tokio::time::timeout(Duration::from_secs(3), response.text())
        .await
        .expect("stream body timeout")
        .expect("stream body");
    assert!(body.contains("data: Answer "), "unexpected body: {body}");

    handle.abort();
}

#[tokio::test]
async fn chat_endpoints_use_the_model() {
    let (base, handle) = spawn_echo_server().await;
    let client = reqwest::Client::new();

    let simple: Value = client
        .get(format!("{}/api/chat/simple", base))
        .query(&[("message", "Tell me a joke")])
        .send()
        .await
        .expect("simple response")
        .json()
        .await
        .expect("simple json");
    assert_eq!(simple["question"], "Tell me a joke");
    assert_eq!(simple["answer"], "Tell me a joke");

    let system: Value = client
        .post(format!("{}/api/chat/system", base))
        .json(&json!({"message": "What is Java?"}))
        .send()
        .await
        .expect("system response")
        .json()
        .await
        .expect("system json");
    assert_eq!(system["answer"], "What is Java?");
    assert_eq!(system["model"], "mock");

    let conversation: Value = client
        .post(format!("{}/api/chat/conversation", base))
        .json(&json!({"messages": ["Hi, I'm working on a Spring project", "Can you help with REST?"]}))
        .send()
        .await
        .expect("conversation response")
        .json()
        .await
        .expect("conversation json");
    assert_eq!(conversation["conversation"][1], "Can you help with REST?");
    assert_eq!(conversation["response"], "Can you help with REST?");

    let stream = client
        .get(format!("{}/api/chat/stream", base))
        .query(&[("message", "write a haiku")])
        .send()
        .await
        .expect("stream response");
    let body = tokio::time::timeout(Duration::from_secs(3), stream.text())
        .await
        .expect("stream body timeout")
        .expect("stream body");
    assert!(body.contains("data: write "), "unexpected body: {body}");
    assert!(body.contains("data: haiku"), "unexpected body: {body}");

    handle.abort();
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (base, handle) = spawn_echo_server().await;
    let client = reqwest::Client::new();

    for path in ["/api/rag/add", "/api/chat/system", "/api/chatclient/assistant"] {
        let response = client
            .post(format!("{}{}", base, path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("{\"title\": ")
            .send()
            .await
            .expect("malformed response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "path {path}");
        let body: Value = response.json().await.expect("error json");
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    handle.abort();
}

#[tokio::test]
async fn chatclient_ask_and_stream_are_stateless() {
    let model = Arc::new(MockChatModel::echo());
    let (base, handle) = spawn_server(state_with(model.clone())).await;
    let client = reqwest::Client::new();

    let asked: Value = client
        .get(format!("{}/api/chatclient/ask", base))
        .query(&[("question", "What is Java?")])
        .send()
        .await
        .expect("ask response")
        .json()
        .await
        .expect("ask json");
    assert_eq!(asked["question"], "What is Java?");
    assert_eq!(asked["answer"], "What is Java?");

    let stream = client
        .get(format!("{}/api/chatclient/stream", base))
        .query(&[("question", "Write a story")])
        .send()
        .await
        .expect("stream response");
    let body = tokio::time::timeout(Duration::from_secs(3), stream.text())
        .await
        .expect("stream body timeout")
        .expect("stream body");
    assert!(body.contains("data: Write "), "unexpected body: {body}");
    assert!(body.contains("data: story"), "unexpected body: {body}");

    // Each request carries only its own question.
    let requests = model.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|messages| messages.len() == 1));

    let missing = client
        .get(format!("{}/api/chatclient/ask", base))
        .send()
        .await
        .expect("ask response");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    handle.abort();
}

#[tokio::test]
async fn chatclient_assistant_plays_the_requested_role() {
    let model = Arc::new(MockChatModel::echo());
    let (base, handle) = spawn_server(state_with(model.clone())).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/api/chatclient/assistant", base))
        .json(&json!({"role": "Java expert", "question": "Explain generics"}))
        .send()
        .await
        .expect("assistant response")
        .json()
        .await
        .expect("assistant json");
    assert_eq!(body["role"], "Java expert");
    assert_eq!(body["question"], "Explain generics");
    assert_eq!(body["answer"], "Explain generics");

    let requests = model.requests();
    let messages = &requests[0];
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[0].content, "You are a Java expert. Provide detailed, accurate answers.");
    assert_eq!(messages[1].role, Role::User);

    let no_role = client
        .post(format!("{}/api/chatclient/assistant", base))
        .json(&json!({"question": "Explain generics"}))
        .send()
        .await
        .expect("assistant response");
    assert_eq!(no_role.status(), StatusCode::BAD_REQUEST);

    handle.abort();
}

#[tokio::test]
async fn model_failure_maps_to_bad_gateway() {
    let model = Arc::new(MockChatModel::new("unused"));
    model.set_failing(true);
    let (base, handle) = spawn_server(state_with(model.clone())).await;
    let client = reqwest::Client::new();
    add(&client, &base, "Guide", SPRING).await;

    let response = client
        .get(format!("{}/api/rag/query", base))
        .query(&[("question", "What is Spring Boot?")])
        .send()
        .await
        .expect("query response");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.expect("error json");
    assert_eq!(body["status"], "error");
    assert_eq!(model.calls(), 1);

    handle.abort();
}
