use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::rest::{self, chart_data, datasets, keyword_search, row_detail};
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .route(
            "/api/datasets",
            get(datasets::api_datasets).options(rest::preflight),
        )
        .route(
            "/api/chart-data",
            post(chart_data::api_chart_data).options(rest::preflight),
        )
        .route(
            "/api/keyword-search",
            post(keyword_search::api_keyword_search).options(rest::preflight),
        )
        .route(
            "/api/row-detail",
            post(row_detail::api_row_detail).options(rest::preflight),
        )
        .route(
            "/api/cache/clear",
            post(rest::api_clear_cache).options(rest::preflight),
        )
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Method + path only; bodies and query strings stay out of the logs
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}
