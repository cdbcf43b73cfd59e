// src/dashboard/routes.rs

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::dashboard::assets;
use crate::supervisor::{RestartOutcome, WorkerRegistry};

const NO_CACHE: &str = "no-cache, no-store, must-revalidate";
const STATIC_CACHE: &str = "public, max-age=3600";
const MAX_ID_LEN: usize = 50;
const FORBIDDEN_ID_CHARS: &[char] = &['.', '/', '\\', '?', '*', '|', '<', '>', ':'];

pub fn router(registry: WorkerRegistry) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/processes", get(list_processes))
        .route("/api/process/:id", get(get_process))
        .route("/api/restart/:id", post(restart_process))
        .route("/static/:file", get(static_asset))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

#[derive(Debug, Serialize)]
struct RestartResponse {
    status: &'static str,
}

async fn index() -> Response {
    let mut response = assets::index_html().into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    with_security_headers(response)
}

async fn list_processes(State(registry): State<WorkerRegistry>) -> Response {
    no_cache(Json(registry.list()))
}

async fn get_process(
    State(registry): State<WorkerRegistry>,
    Path(id): Path<String>,
) -> Response {
    if !is_valid_id(&id) {
        return (StatusCode::BAD_REQUEST, "Invalid process ID").into_response();
    }

    match registry.view(&id) {
        Some(view) => no_cache(Json(view)),
        None => (StatusCode::NOT_FOUND, "Process not found").into_response(),
    }
}

async fn restart_process(
    State(registry): State<WorkerRegistry>,
    Path(id): Path<String>,
) -> Response {
    if !is_valid_id(&id) {
        return (StatusCode::BAD_REQUEST, "Invalid process ID").into_response();
    }

    let Some(outcome) = registry.restart(&id).await else {
        return (StatusCode::NOT_FOUND, "Process not found").into_response();
    };

    info!(process_id = %id, ?outcome, "restart requested from dashboard");

    let status = match outcome {
        RestartOutcome::Restarted => "restarted",
        RestartOutcome::NotRunning => "not_running",
        RestartOutcome::WorkerStopped => "stopped",
    };
    no_cache(Json(RestartResponse { status }))
}

async fn static_asset(Path(file): Path<String>) -> Response {
    if file.contains("..") || file.contains('/') || file.contains('\\') {
        return (StatusCode::BAD_REQUEST, "Invalid path").into_response();
    }

    let Some((content_type, body)) = assets::static_file(&file) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(STATIC_CACHE));
    with_security_headers(response)
}

/// Worker ids are short and never contain path or glob characters.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_ID_LEN && !id.contains(FORBIDDEN_ID_CHARS)
}

fn no_cache(body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    response
}

fn with_security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    response
}
