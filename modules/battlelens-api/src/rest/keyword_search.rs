use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use battlelens_analytics::{
    cache_key, keyword_search, ClusterMatch, SearchDebug, SearchParams, DEFAULT_MIN_ITEMS,
};
use battlelens_common::{BattleLensError, ClusterLevel, Result};

use super::{elapsed_ms, non_blank, parse_body};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeywordSearchRequest {
    pub dataset: Option<String>,
    pub search_query: Option<String>,
    pub min_sample_threshold: Option<usize>,
    pub cluster_level: Option<ClusterLevel>,
    /// Fixes the order of equal-score results; random when absent.
    pub shuffle_seed: Option<u64>,
    pub debug: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSearchResponse {
    pub search_results: Vec<ClusterMatch>,
    pub search_query: String,
    pub cached: bool,
    pub compute_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<SearchDebug>,
}

pub async fn api_keyword_search(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<KeywordSearchRequest>, JsonRejection>,
) -> impl IntoResponse {
    let started = Instant::now();
    let request = match parse_body(payload, started) {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };

    match search(&state, request, started).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => ApiError::from_error(&e, elapsed_ms(started)).into_response(),
    }
}

async fn search(
    state: &AppState,
    request: KeywordSearchRequest,
    started: Instant,
) -> Result<KeywordSearchResponse> {
    let query = non_blank(request.search_query.as_deref())
        .ok_or_else(|| BattleLensError::Validation("searchQuery is required".to_string()))?
        .to_string();
    let dataset = state.registry.resolve(request.dataset.as_deref())?;
    let key =
        cache_key("keyword-search", &(&dataset.key, &request)).map_err(anyhow::Error::from)?;

    let hit = state.search_cache.lock().await.get(&key);
    if let Some(mut response) = hit {
        response.cached = true;
        response.compute_time = elapsed_ms(started);
        info!(dataset = %dataset.key, query = %query, "Keyword search served from cache");
        return Ok(response);
    }

    let rows = state.rows_for(dataset).await?;
    let params = SearchParams {
        query: query.clone(),
        level: request.cluster_level.unwrap_or_default(),
        min_items: request.min_sample_threshold.unwrap_or(DEFAULT_MIN_ITEMS),
        seed: request.shuffle_seed.unwrap_or_else(rand::random),
    };
    let output = keyword_search(&rows, &params);

    let response = KeywordSearchResponse {
        search_results: output.matches,
        search_query: query,
        cached: false,
        compute_time: elapsed_ms(started),
        debug_info: request.debug.unwrap_or(false).then_some(output.debug),
    };
    state
        .search_cache
        .lock()
        .await
        .insert(key, response.clone());

    info!(
        dataset = %dataset.key,
        query = %response.search_query,
        results = response.search_results.len(),
        duration_ms = response.compute_time,
        "Computed keyword search"
    );
    Ok(response)
}
