// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP boundary: status codes and bodies for `/api/search`.

mod common;

use assert_json_diff::assert_json_eq;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{FakeSessions, StubRunner, LAPTOP_RESULTS};
use serde_json::{json, Value};
use shopfit_runtime::filter::{FittedBlock, FittedDocument};
use shopfit_runtime::rest::{router, AppState};
use shopfit_runtime::{FetchError, QueryService, ServiceConfig};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::ServiceExt;

async fn get(runner: Arc<StubRunner>, uri: &str) -> (StatusCode, Value) {
    let app = router(Arc::new(AppState::new(runner, 1)));
    send(app, uri).await
}

async fn send(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn document(texts: &[&str]) -> FittedDocument {
    FittedDocument::from_blocks(
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| FittedBlock {
                index,
                tag: "p".into(),
                text: text.to_string(),
                score: 2.0,
            })
            .collect(),
    )
}

#[tokio::test]
async fn missing_query_is_400_and_runner_not_called() {
    let runner = Arc::new(StubRunner::answering(Ok(document(&["x"]))));
    let (status, body) = get(runner.clone(), "/api/search").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_eq!(body, json!({ "error": "Missing required parameter: 'query'" }));
    assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_query_is_400_and_runner_not_called() {
    let runner = Arc::new(StubRunner::answering(Ok(document(&["x"]))));
    let (status, body) = get(runner.clone(), "/api/search?query=").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_eq!(body, json!({ "error": "Missing required parameter: 'query'" }));
    assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeated_query_runs_first_value() {
    let runner = Arc::new(StubRunner::answering(Ok(document(&["Lenovo IdeaPad laptop, $249"]))));
    let (status, body) = get(runner.clone(), "/api/search?query=laptop&query=mouse").await;

    assert_eq!(status, StatusCode::OK);
    assert_json_eq!(body, json!({ "markdown": "Lenovo IdeaPad laptop, $249" }));
    assert_eq!(runner.queries.lock().unwrap().as_slice(), ["laptop"]);
}

#[tokio::test]
async fn empty_first_query_is_400_json() {
    let runner = Arc::new(StubRunner::answering(Ok(document(&["x"]))));
    let (status, body) = get(runner.clone(), "/api/search?query=&query=mouse").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_eq!(body, json!({ "error": "Missing required parameter: 'query'" }));
    assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn success_returns_markdown() {
    let runner = Arc::new(StubRunner::answering(Ok(document(&[
        "Acer Aspire 3 laptop, 8GB RAM, $299",
        "Lenovo IdeaPad laptop, 4GB RAM, $249",
    ]))));
    let (status, body) = get(runner.clone(), "/api/search?query=gaming%20laptop").await;

    assert_eq!(status, StatusCode::OK);
    assert_json_eq!(
        body,
        json!({
            "markdown": "Acer Aspire 3 laptop, 8GB RAM, $299\n\nLenovo IdeaPad laptop, 4GB RAM, $249"
        })
    );
    assert_eq!(runner.queries.lock().unwrap().as_slice(), ["gaming laptop"]);
}

#[tokio::test]
async fn empty_document_is_still_200() {
    let runner = Arc::new(StubRunner::answering(Ok(FittedDocument::default())));
    let (status, body) = get(runner, "/api/search?query=laptop").await;

    assert_eq!(status, StatusCode::OK);
    assert_json_eq!(body, json!({ "markdown": "" }));
}

#[tokio::test]
async fn extraction_failure_is_500_with_cause() {
    let runner = Arc::new(StubRunner::answering(Err(FetchError::Extraction(
        "timeout".into(),
    ))));
    let (status, body) = get(runner.clone(), "/api/search?query=laptop").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Crawler failed: "));
    assert!(message.contains("timeout"));
    assert!(body.get("markdown").is_none());
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn session_start_failure_is_500() {
    let runner = Arc::new(StubRunner::answering(Err(FetchError::SessionStart(
        "no chromium binary".into(),
    ))));
    let (status, body) = get(runner, "/api/search?query=laptop").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("no chromium binary"));
}

#[tokio::test]
async fn health_reports_ok() {
    let runner = Arc::new(StubRunner::answering(Ok(FittedDocument::default())));
    let (status, body) = get(runner, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn end_to_end_with_fake_browser() {
    let mut config = ServiceConfig::default();
    config.extraction.settle_ms = 0;
    let sessions = Arc::new(FakeSessions::serving(LAPTOP_RESULTS));
    let service = Arc::new(QueryService::new(config, sessions.clone()));
    let app = router(Arc::new(AppState::new(service, 1)));

    let (status, body) = send(app, "/api/search?query=laptop").await;

    assert_eq!(status, StatusCode::OK);
    assert_json_eq!(
        body,
        json!({
            "markdown": "Acer Aspire 3 laptop, 8GB RAM, $299\n\nLenovo IdeaPad laptop, 4GB RAM, $249"
        })
    );
    assert_eq!(sessions.calls.released.load(Ordering::SeqCst), 1);
}
