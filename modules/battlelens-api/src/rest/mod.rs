pub mod chart_data;
pub mod datasets;
pub mod keyword_search;
pub mod row_detail;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};

use crate::error::ApiError;
use crate::AppState;

// --- Helpers ---

pub fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Unwrap a JSON body, turning malformed or mistyped payloads into a 400.
pub fn parse_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    started: Instant,
) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text(), elapsed_ms(started)))
}

/// Blank strings count as absent.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// --- Handlers ---

/// Answers bare `OPTIONS` requests; real CORS preflights are handled by the layer.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}

pub async fn api_clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.clear_caches().await;
    tracing::info!("Caches cleared");
    Json(serde_json::json!({ "cleared": true }))
}
