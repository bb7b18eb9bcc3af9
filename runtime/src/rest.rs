// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP boundary.
//!
//! `GET /api/search?query=…` runs one query through a [`QueryRunner`] and
//! answers `{"markdown": …}`. This is the only place a [`FetchError`]
//! becomes a status code.

use crate::error::FetchError;
use crate::service::QueryRunner;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

pub const MISSING_QUERY: &str = "Missing required parameter: 'query'";

pub struct AppState {
    runner: Arc<dyn QueryRunner>,
    permits: Arc<Semaphore>,
}

impl AppState {
    /// `max_concurrent` queries run at once; further requests wait.
    pub fn new(runner: Arc<dyn QueryRunner>, max_concurrent: usize) -> Self {
        Self {
            runner,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }
}

type ApiResponse = (StatusCode, Json<Value>);

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", get(search))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve on `addr` until Ctrl-C.
pub async fn start(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn search(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> ApiResponse {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("search", %request_id);
    let query = raw.as_deref().and_then(first_query);
    handle_search(state, query).instrument(span).await
}

/// The first `query` value of a raw query string. Repeated parameters
/// and undecodable bytes never reject the request.
fn first_query(raw: &str) -> Option<String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .find(|(key, _)| key == "query")
        .map(|(_, value)| value.into_owned())
}

async fn handle_search(state: Arc<AppState>, query: Option<String>) -> ApiResponse {
    let query = match query {
        Some(q) if !q.is_empty() => q,
        _ => {
            tracing::debug!("rejecting request without query");
            return error_response(StatusCode::BAD_REQUEST, MISSING_QUERY.to_string());
        }
    };

    let permit = match Arc::clone(&state.permits).acquire_owned().await {
        Ok(p) => p,
        Err(e) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Crawler failed: {e}"))
        }
    };

    tracing::info!(%query, "search started");
    let runner = Arc::clone(&state.runner);
    let task = tokio::spawn(
        async move {
            let _permit = permit;
            runner.run(&query).await
        }
        .in_current_span(),
    );

    match task.await {
        Ok(Ok(document)) => {
            tracing::info!(blocks = document.blocks().len(), "search finished");
            (
                StatusCode::OK,
                Json(json!({ "markdown": document.into_markdown() })),
            )
        }
        Ok(Err(e)) => failure(e),
        Err(e) => {
            tracing::error!("search task aborted: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Crawler failed: {e}"))
        }
    }
}

fn failure(err: FetchError) -> ApiResponse {
    tracing::warn!(kind = err.kind(), "search failed: {err}");
    match err {
        FetchError::Input(_) => error_response(StatusCode::BAD_REQUEST, MISSING_QUERY.to_string()),
        other => error_response(
            StatusCode::from_u16(other.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            format!("Crawler failed: {other}"),
        ),
    }
}

fn error_response(status: StatusCode, message: String) -> ApiResponse {
    (status, Json(json!({ "error": message })))
}
