//! Integration tests for [`RestJobStore`] against a local stand-in of
//! the REST endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use assert_matches::assert_matches;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use signaldesk_backend::{BackendConfig, RestJobStore, StaticToken};
use signaldesk_core::job::{JobStatus, StepStatus};
use signaldesk_core::ports::{JobStore, StoreError};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn jobs(
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some("anon") {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer user-token") {
        return Err(StatusCode::UNAUTHORIZED);
    }
    assert!(params["select"].contains("steps_status"));

    match params.get("id").map(String::as_str) {
        Some("eq.job-1") => Ok(Json(json!([{
            "overall_status": "in_progress",
            "steps_status": {
                "security_check": {"status": "completed", "message": "ok"}
            },
            "final_result": null,
            "error_message": null
        }]))),
        _ => Ok(Json(json!([]))),
    }
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "relation does not exist")
}

async fn store_for(table: &str) -> RestJobStore {
    let app = Router::new()
        .route("/rest/v1/analysis_jobs", get(jobs))
        .route("/rest/v1/broken", get(broken));
    let base = serve(app).await;
    let config = Arc::new(BackendConfig::new(base, "anon").with_jobs_table(table));
    RestJobStore::new(
        reqwest::Client::new(),
        config,
        Arc::new(StaticToken::new("user-token")),
    )
}

#[tokio::test]
async fn fetches_existing_job() {
    let store = store_for("analysis_jobs").await;
    let record = store.fetch_job("job-1").await.unwrap();
    assert_eq!(record.overall_status, JobStatus::InProgress);
    assert_eq!(
        record.steps_status["security_check"].status,
        StepStatus::Completed
    );
}

#[tokio::test]
async fn missing_job_is_not_found() {
    let store = store_for("analysis_jobs").await;
    assert_matches!(
        store.fetch_job("job-404").await,
        Err(StoreError::NotFound(id)) if id == "job-404"
    );
}

#[tokio::test]
async fn server_error_is_api_error() {
    let store = store_for("broken").await;
    assert_matches!(
        store.fetch_job("job-1").await,
        Err(StoreError::Api { status: 500, body }) if body.contains("relation")
    );
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let config = Arc::new(BackendConfig::new("http://127.0.0.1:9", "anon"));
    let store = RestJobStore::new(
        reqwest::Client::new(),
        config,
        Arc::new(StaticToken::new("user-token")),
    );
    assert_matches!(
        store.fetch_job("job-1").await,
        Err(StoreError::Transport(_))
    );
}
