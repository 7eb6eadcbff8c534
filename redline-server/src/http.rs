//! Redline HTTP REST API
//!
//! Axum-based HTTP server exposing the moderation engine to the dashboard.
//! Runs alongside the Unix socket IPC server on port 8767 (configurable).
//!
//! Each endpoint is a thin axum handler over an inner function that can be
//! called directly from tests.
//!
//! Endpoints:
//! - GET  /health           — health check with record count
//! - GET  /version          — server version info
//! - GET  /categories       — category vocabulary
//! - GET  /filters/default  — initial filter panel state (last N days)
//! - POST /records          — ingest one record payload
//! - POST /records/query    — filter and page records
//! - POST /classify         — score to severity band
//! - POST /export           — filtered records as CSV or JSON download

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use redline_core::ipc::{RedlineRequest, RedlineResponse, PROTOCOL_VERSION};
use redline_core::{export, ExportFormat, FilterSpec, ModerationEngine, RedlineConfig, RedlineError, View};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::subsystems::ingest;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub engine: Arc<ModerationEngine>,
    pub config: RedlineConfig,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/categories", get(categories_handler))
        .route("/filters/default", get(default_filter_handler))
        .route("/records", post(insert_handler))
        .route("/records/query", post(query_handler))
        .route("/classify", post(classify_handler))
        .route("/export", post(export_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    engine: Arc<ModerationEngine>,
    config: RedlineConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { engine, config });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Redline HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct QueryRequest {
    #[serde(default)]
    pub filter: FilterSpec,
    pub page: Option<i64>,
    pub page_size: Option<usize>,
    pub view: Option<View>,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub score: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportRequest {
    #[serde(default)]
    pub filter: FilterSpec,
    #[serde(default)]
    pub format: ExportFormat,
}

/// A rendered export ready to be sent as a download.
#[derive(Debug)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

pub fn health_inner(engine: &ModerationEngine, socket_path: &str) -> (StatusCode, serde_json::Value) {
    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "records": engine.store().len(),
            "flag_threshold": engine.classifier().flag_threshold(),
            "socket": socket_path,
        }),
    )
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": PROTOCOL_VERSION,
    })
}

pub fn categories_inner(engine: &ModerationEngine, config: &RedlineConfig) -> (StatusCode, serde_json::Value) {
    let response = crate::router::handle_request(RedlineRequest::Categories, engine, config);
    into_http(response)
}

/// Inner default filter — the dashboard opens on the last `default_lookback_days`.
pub fn default_filter_inner(config: &RedlineConfig, today: chrono::NaiveDate) -> serde_json::Value {
    let spec = FilterSpec::last_days(today, config.filter.default_lookback_days);
    serde_json::to_value(spec).unwrap_or_else(|_| serde_json::json!({}))
}

/// Inner insert — validates the payload and appends it to the store.
pub fn insert_inner(engine: &ModerationEngine, payload: serde_json::Value) -> (StatusCode, serde_json::Value) {
    match ingest::ingest_payload(&payload, engine) {
        Ok(id) => (
            StatusCode::CREATED,
            serde_json::json!({
                "inserted": true,
                "id": id,
            }),
        ),
        Err(e) => (status_for(&e), error_body(e.to_string())),
    }
}

pub fn query_inner(
    engine: &ModerationEngine,
    config: &RedlineConfig,
    req: QueryRequest,
) -> (StatusCode, serde_json::Value) {
    let request = RedlineRequest::Query {
        filter: req.filter,
        page: req.page,
        page_size: req.page_size,
        view: req.view,
    };
    into_http(crate::router::handle_request(request, engine, config))
}

pub fn classify_inner(
    engine: &ModerationEngine,
    config: &RedlineConfig,
    req: ClassifyRequest,
) -> (StatusCode, serde_json::Value) {
    let score = match req.score {
        Some(s) => s,
        None => return (StatusCode::BAD_REQUEST, error_body("score field is required")),
    };

    let response = crate::router::handle_request(RedlineRequest::Classify { score }, engine, config);
    match response_to_http(response) {
        Ok(data) => (StatusCode::OK, data),
        Err(e) => (StatusCode::BAD_REQUEST, error_body(e)),
    }
}

/// Inner export — renders the whole filtered sequence, not a single page.
pub fn export_inner(
    engine: &ModerationEngine,
    req: ExportRequest,
) -> std::result::Result<ExportFile, (StatusCode, serde_json::Value)> {
    let records = engine.filtered(&req.filter);
    let body = export::render(&records, req.format)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string())))?;
    tracing::info!("Exported {} records as {}", records.len(), req.format);
    Ok(ExportFile {
        file_name: export::file_name(&req.filter, req.format),
        content_type: req.format.content_type(),
        body,
    })
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.engine, &state.config.service.socket_path);
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn categories_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = categories_inner(&state.engine, &state.config);
    (status, Json(body))
}

pub async fn default_filter_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let today = chrono::Local::now().date_naive();
    (StatusCode::OK, Json(default_filter_inner(&state.config, today)))
}

pub async fn insert_handler(
    State(state): State<Arc<HttpState>>,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    let (status, body) = insert_inner(&state.engine, payload);
    (status, Json(body))
}

pub async fn query_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    let (status, body) = query_inner(&state.engine, &state.config, req);
    (status, Json(body))
}

pub async fn classify_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ClassifyRequest>,
) -> impl IntoResponse {
    let (status, body) = classify_inner(&state.engine, &state.config, req);
    (status, Json(body))
}

pub async fn export_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ExportRequest>,
) -> Response {
    match export_inner(&state.engine, req) {
        Ok(file) => {
            let disposition = format!("attachment; filename=\"{}\"", file.file_name);
            let mut response = (StatusCode::OK, file.body).into_response();
            let headers = response.headers_mut();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(file.content_type));
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            response
        }
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Convert an IPC `RedlineResponse` into an HTTP body value, or an error string.
pub fn response_to_http(response: RedlineResponse) -> std::result::Result<serde_json::Value, String> {
    if response.is_ok() {
        Ok(response.data.unwrap_or(serde_json::json!({})))
    } else {
        Err(response.error.unwrap_or_else(|| "unknown error".to_string()))
    }
}

fn into_http(response: RedlineResponse) -> (StatusCode, serde_json::Value) {
    match response_to_http(response) {
        Ok(data) => (StatusCode::OK, data),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, error_body(e)),
    }
}

/// HTTP status for an engine error.
pub fn status_for(err: &RedlineError) -> StatusCode {
    match err {
        RedlineError::DuplicateId(_) => StatusCode::CONFLICT,
        e if e.is_invalid_input() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_body(msg: impl Into<String>) -> serde_json::Value {
    serde_json::json!({
        "error": msg.into(),
        "status": "error",
    })
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================
