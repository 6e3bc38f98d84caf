//! End-to-end tests for the HTTP surface.
//!
//! The router runs in-process via `oneshot`; the LLM, embedding provider and
//! Wikipedia are replaced by in-memory fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use wiki_assistant::agent::ResponseMode;
use wiki_assistant::api;
use wiki_assistant::chunking::SentenceSplitter;
use wiki_assistant::config::Config;
use wiki_assistant::llm::{ChatMessage, ChatModel, ChatResponse, Embedder, ToolCall, ToolSchema};
use wiki_assistant::models::Document;
use wiki_assistant::rag::{
    ChatSessions, ContentFetcher, RagComponents, RagServiceFactory, TitleExtractor,
    WikipediaRagService, PROCESSING_FAILED_RESPONSE,
};
use wiki_assistant::state::AppState;

// ─── Fakes ───────────────────────────────────────────────

struct FakeTitles {
    titles: Vec<String>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TitleExtractor for FakeTitles {
    async fn extract_titles(&self, _query: &str) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.titles.clone()
    }
}

struct FakeWikipedia;

#[async_trait]
impl ContentFetcher for FakeWikipedia {
    async fn fetch_content(&self, titles: &[String]) -> Vec<Document> {
        titles
            .iter()
            .filter(|t| t.as_str() == "Paris")
            .map(|t| Document {
                title: t.clone(),
                url: format!("https://en.wikipedia.org/wiki/{t}"),
                text: "Paris is the capital and largest city of France. It lies on the Seine."
                    .to_string(),
            })
            .collect()
    }
}

struct FakeEmbedder;

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
    }
}

/// Agent turns: call the tool once, then answer with what it returned.
/// Tool synthesis turns (no tools offered): a fixed sentence.
struct FakeLlm;

#[async_trait]
impl ChatModel for FakeLlm {
    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolSchema]) -> anyhow::Result<ChatResponse> {
        if tools.is_empty() {
            return Ok(ChatResponse::Content("The capital of France is Paris.".into()));
        }
        match messages.last() {
            Some(m) if m.role == "tool" => Ok(ChatResponse::Content(format!(
                "{} (Source: Wikipedia)",
                m.content
            ))),
            _ => Ok(ChatResponse::ToolCalls(vec![ToolCall {
                id: "call_1".into(),
                name: tools[0].name.clone(),
                arguments: r#"{"input":"capital of France"}"#.into(),
            }])),
        }
    }
}

fn fake_factory(titles: &[&str], calls: Arc<AtomicUsize>) -> RagServiceFactory {
    let titles: Vec<String> = titles.iter().map(|t| t.to_string()).collect();
    Arc::new(move || -> anyhow::Result<WikipediaRagService> {
        Ok(WikipediaRagService::new(RagComponents {
            title_extractor: Arc::new(FakeTitles {
                titles: titles.clone(),
                calls: calls.clone(),
            }),
            content_fetcher: Arc::new(FakeWikipedia),
            embedder: Arc::new(FakeEmbedder),
            llm: Arc::new(FakeLlm),
            splitter: SentenceSplitter::default(),
            similarity_top_k: 5,
            response_mode: ResponseMode::Compact,
            max_iterations: 10,
        }))
    })
}

// ─── Helpers ─────────────────────────────────────────────

fn test_config(dir: &tempfile::TempDir) -> Config {
    Config {
        data_dir: dir.path().to_path_buf(),
        ..Config::default()
    }
}

fn app_with(dir: &tempfile::TempDir, chat: ChatSessions) -> Router {
    let state = AppState::with_chat_sessions(&test_config(dir), chat).unwrap();
    api::router(state)
}

fn app(dir: &tempfile::TempDir) -> Router {
    app_with(
        dir,
        ChatSessions::new(fake_factory(&["Paris"], Arc::new(AtomicUsize::new(0))), false),
    )
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

// ─── Courses ─────────────────────────────────────────────

#[tokio::test]
async fn test_course_crud_flow() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let (status, body) = send(&app, "GET", "/courses/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, created) = send(
        &app,
        "POST",
        "/courses/",
        Some(json!({"title": "Rust 101", "summary": "Ownership and borrowing"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["title"], "Rust 101");
    assert!(created["created_at"].is_string());

    let (status, fetched) = send(&app, "GET", "/courses/1/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = send(
        &app,
        "PATCH",
        "/courses/1/",
        Some(json!({"summary": "Lifetimes too"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Rust 101");
    assert_eq!(updated["summary"], "Lifetimes too");
    assert_eq!(updated["created_at"], created["created_at"]);

    let (status, list) = send(&app, "GET", "/courses", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", "/courses/1/", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", "/courses/1/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Not found."}));

    let (status, _) = send(&app, "DELETE", "/courses/1/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_course_validation() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        "POST",
        "/courses/",
        Some(json!({"title": "", "summary": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"title": ["This field may not be blank."]}));

    let (status, body) = send(&app, "POST", "/courses/", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], json!(["This field is required."]));
    assert_eq!(body["summary"], json!(["This field is required."]));

    let (status, body) = send(
        &app,
        "POST",
        "/courses/",
        Some(json!({"title": "a".repeat(101), "summary": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["title"].is_array());

    let (_, list) = send(&app, "GET", "/courses/", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_malformed_json_body() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let req = Request::builder()
        .method("POST")
        .uri("/courses/")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patch_missing_and_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let (status, _) = send(&app, "PATCH", "/courses/99/", Some(json!({"title": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(
        &app,
        "POST",
        "/courses/",
        Some(json!({"title": "Rust", "summary": "s"})),
    )
    .await;
    let (status, body) = send(&app, "PATCH", "/courses/1/", Some(json!({"title": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"title": ["This field may not be blank."]}));

    let (_, course) = send(&app, "GET", "/courses/1/", None).await;
    assert_eq!(course["title"], "Rust");
}

#[tokio::test]
async fn test_null_rejected_and_text_trimmed() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        "POST",
        "/courses/",
        Some(json!({"title": null, "summary": "s"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"title": ["This field may not be null."]}));

    let (status, course) = send(
        &app,
        "POST",
        "/courses/",
        Some(json!({"title": "  Rust basics \n", "summary": "\tOwnership "})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(course["title"], "Rust basics");
    assert_eq!(course["summary"], "Ownership");

    let (status, body) = send(&app, "PATCH", "/courses/1/", Some(json!({"summary": null}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"summary": ["This field may not be null."]}));

    let (_, course) = send(&app, "GET", "/courses/1/", None).await;
    assert_eq!(course["summary"], "Ownership");
}

#[tokio::test]
async fn test_non_numeric_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let (status, _) = send(&app, "GET", "/courses/abc/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_courses_survive_restart_and_ids_are_not_reused() {
    let dir = tempfile::tempdir().unwrap();

    {
        let app = app(&dir);
        for title in ["One", "Two"] {
            send(
                &app,
                "POST",
                "/courses/",
                Some(json!({"title": title, "summary": "s"})),
            )
            .await;
        }
        send(&app, "DELETE", "/courses/2/", None).await;
    }

    let app = app(&dir);
    let (_, list) = send(&app, "GET", "/courses/", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "One");

    let (_, created) = send(
        &app,
        "POST",
        "/courses/",
        Some(json!({"title": "Three", "summary": "s"})),
    )
    .await;
    assert_eq!(created["id"], 3);
}

// ─── Chat ────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_answers_from_wikipedia() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        "POST",
        "/chat/",
        Some(json!({"query": "What is the capital of France?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"response": "The capital of France is Paris. (Source: Wikipedia)"})
    );
}

#[tokio::test]
async fn test_chat_validation_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let (status, body) = send(&app, "POST", "/chat/", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Validation error", "details": ["Field 'query' is required"]})
    );

    let (status, body) = send(&app, "POST", "/chat/", Some(json!({"query": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"][0],
        "query field: String should have at least 1 character"
    );

    let (status, body) = send(&app, "POST", "/chat/", Some(json!({"query": 7}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0], "query field: Input should be a valid string");
}

#[tokio::test]
async fn test_chat_without_titles_gives_apology() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(
        &dir,
        ChatSessions::new(fake_factory(&[], Arc::new(AtomicUsize::new(0))), false),
    );

    let (status, body) = send(
        &app,
        "POST",
        "/chat/",
        Some(json!({"query": "Random gibberish xyz123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], PROCESSING_FAILED_RESPONSE);
}

#[tokio::test]
async fn test_chat_session_scope() {
    let dir = tempfile::tempdir().unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let per_request = app_with(
        &dir,
        ChatSessions::new(fake_factory(&["Paris"], calls.clone()), false),
    );
    for _ in 0..2 {
        send(&per_request, "POST", "/chat/", Some(json!({"query": "Paris?"}))).await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let calls = Arc::new(AtomicUsize::new(0));
    let shared = app_with(
        &dir,
        ChatSessions::new(fake_factory(&["Paris"], calls.clone()), true),
    );
    for _ in 0..2 {
        send(&shared, "POST", "/chat/", Some(json!({"query": "Paris?"}))).await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_chat_service_construction_failure() {
    let dir = tempfile::tempdir().unwrap();
    let factory: RagServiceFactory = Arc::new(|| -> anyhow::Result<WikipediaRagService> {
        anyhow::bail!("LLM_API_KEY (or OPENAI_API_KEY) is required for the openai provider")
    });
    let app = app_with(&dir, ChatSessions::new(factory, false));

    let (status, body) = send(&app, "POST", "/chat/", Some(json!({"query": "Paris?"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unexpected error");
    assert!(body["details"].as_str().unwrap().contains("LLM_API_KEY"));
}

#[tokio::test]
async fn test_production_sessions_without_api_key_fail_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.llm.api_key = None;
    let chat = ChatSessions::from_config(reqwest::Client::new(), &config);
    let app = app_with(&dir, chat);

    let (status, body) = send(&app, "POST", "/chat/", Some(json!({"query": "Paris?"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unexpected error");
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(&app(&dir), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}
