//! Integration tests for [`WorkflowApi`] against local stand-ins of the
//! webhooks.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use signaldesk_core::ports::{AuthError, SessionProvider};
use signaldesk_core::request::AnalysisRequest;
use signaldesk_workflows::{WorkflowApi, WorkflowEndpoints, WorkflowError};

struct Token(Option<&'static str>);

#[async_trait]
impl SessionProvider for Token {
    async fn access_token(&self) -> Result<String, AuthError> {
        self.0.map(str::to_string).ok_or(AuthError::NotAuthenticated)
    }
}

/// Last body received by any route.
type Received = Arc<Mutex<Option<Value>>>;

async fn trigger_ok(State(received): State<Received>, Json(body): Json<Value>) -> Json<Value> {
    *received.lock().unwrap() = Some(body);
    Json(json!({"jobId": "job-abc", "status": "queued"}))
}

async fn trigger_without_id() -> Json<Value> {
    Json(json!({"status": "queued"}))
}

async fn trigger_down() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "workflow inactive")
}

async fn chat_ok(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "analysis": format!(
            "{} is consolidating under resistance.",
            body["symbol"].as_str().unwrap()
        ),
        "sources": ["h4", "d1"]
    }))
}

async fn chat_malformed() -> Json<Value> {
    Json(json!({"answer": 42}))
}

async fn logs_ok(State(received): State<Received>, Json(body): Json<Value>) -> Json<Value> {
    *received.lock().unwrap() = Some(body);
    Json(json!([
        {"id": "job-1", "pair": "EUR/USD", "overall_status": "completed", "created_at": "2026-03-01T10:00:00Z"},
        {"pair": "GBP/USD"},
        {"id": "job-2", "pair": "XAU/USD", "overall_status": "failed"}
    ]))
}

async fn logs_object() -> Json<Value> {
    Json(json!({"logs": []}))
}

async fn serve(received: Received) -> String {
    let app = Router::new()
        .route("/trigger", post(trigger_ok))
        .route("/trigger-no-id", post(trigger_without_id))
        .route("/trigger-down", post(trigger_down))
        .route("/chat", post(chat_ok))
        .route("/chat-bad", post(chat_malformed))
        .route("/logs", post(logs_ok))
        .route("/logs-object", post(logs_object))
        .with_state(received);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn api(base: &str, trigger: &str, chat: &str, logs: &str) -> WorkflowApi {
    WorkflowApi::new(
        reqwest::Client::new(),
        WorkflowEndpoints {
            trigger_url: format!("{base}{trigger}"),
            chat_url: format!("{base}{chat}"),
            logs_url: format!("{base}{logs}"),
        },
    )
}

fn reference_request() -> AnalysisRequest {
    AnalysisRequest::parse("EUR/USD", "intraday", "moyenne", "moyen").unwrap()
}

#[tokio::test]
async fn trigger_returns_job_id_and_sends_parameters() {
    let received = Received::default();
    let base = serve(Arc::clone(&received)).await;
    let api = api(&base, "/trigger", "/chat", "/logs");

    let job_id = api
        .trigger_analysis(&reference_request(), &Token(Some("user-token")))
        .await
        .unwrap();
    assert_eq!(job_id, "job-abc");

    let body = received.lock().unwrap().clone().unwrap();
    assert_eq!(body["pair"], "EUR/USD");
    assert_eq!(body["style"], "intraday");
    assert_eq!(body["risk"], "moyenne");
    assert_eq!(body["gain"], "moyen");
    assert_eq!(body["accessToken"], "user-token");
    assert!(body["time"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn trigger_without_job_id_is_missing_field() {
    let base = serve(Received::default()).await;
    let api = api(&base, "/trigger-no-id", "/chat", "/logs");

    assert_matches!(
        api.trigger_analysis(&reference_request(), &Token(Some("t"))).await,
        Err(WorkflowError::MissingField("jobId"))
    );
}

#[tokio::test]
async fn trigger_non_2xx_is_api_error() {
    let base = serve(Received::default()).await;
    let api = api(&base, "/trigger-down", "/chat", "/logs");

    assert_matches!(
        api.trigger_analysis(&reference_request(), &Token(Some("t"))).await,
        Err(WorkflowError::ApiError { status: 502, body }) if body == "workflow inactive"
    );
}

#[tokio::test]
async fn trigger_requires_session() {
    let api = api("http://127.0.0.1:9", "/trigger", "/chat", "/logs");
    assert_matches!(
        api.trigger_analysis(&reference_request(), &Token(None)).await,
        Err(WorkflowError::Auth(AuthError::NotAuthenticated))
    );
}

#[tokio::test]
async fn trigger_unreachable_is_request_error() {
    let api = api("http://127.0.0.1:9", "/trigger", "/chat", "/logs");
    assert_matches!(
        api.trigger_analysis(&reference_request(), &Token(Some("t"))).await,
        Err(WorkflowError::Request(_))
    );
}

#[tokio::test]
async fn chat_returns_analysis_and_extras() {
    let base = serve(Received::default()).await;
    let api = api(&base, "/trigger", "/chat", "/logs");

    let reply = api.chat("EUR/USD").await.unwrap();
    assert!(reply.analysis.starts_with("EUR/USD"));
    assert!(reply.extra.contains_key("sources"));
}

#[tokio::test]
async fn chat_without_analysis_is_missing_field() {
    let base = serve(Received::default()).await;
    let api = api(&base, "/trigger", "/chat-bad", "/logs");

    assert_matches!(
        api.chat("BTC/USD").await,
        Err(WorkflowError::MissingField("analysis"))
    );
}

#[tokio::test]
async fn chat_rejects_blank_symbol_locally() {
    let api = api("http://127.0.0.1:9", "/trigger", "/chat", "/logs");
    assert_matches!(api.chat("   ").await, Err(WorkflowError::InvalidInput(_)));
}

#[tokio::test]
async fn logs_are_parsed_and_token_sent() {
    let received = Received::default();
    let base = serve(Arc::clone(&received)).await;
    let api = api(&base, "/trigger", "/chat", "/logs");

    let logs = api.fetch_logs(&Token(Some("user-token"))).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].id, "job-1");
    assert_eq!(logs[1].pair.as_deref(), Some("XAU/USD"));

    let body = received.lock().unwrap().clone().unwrap();
    assert_eq!(body["accessToken"], "user-token");
}

#[tokio::test]
async fn logs_object_body_is_format_error() {
    let base = serve(Received::default()).await;
    let api = api(&base, "/trigger", "/chat", "/logs-object");

    assert_matches!(
        api.fetch_logs(&Token(Some("t"))).await,
        Err(WorkflowError::Format(_))
    );
}
