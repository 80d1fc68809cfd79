use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use battlelens_analytics::{
    build_chart, cache_key, ChartDebug, ChartFilters, ChartPoint, DEFAULT_DISCREPANCY_THRESHOLD,
    DEFAULT_MIN_ITEMS,
};
use battlelens_common::{BattleLensError, ClusterLevel, Result, RowSummary};

use super::{elapsed_ms, non_blank, parse_body};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartDataRequest {
    pub dataset: Option<String>,
    pub drill_level: Option<ClusterLevel>,
    pub coarse_cluster: Option<String>,
    pub fine_cluster: Option<String>,
    pub selected_models: Option<Vec<String>>,
    pub show_unexpected_only: Option<bool>,
    pub filter_battle_models: Option<bool>,
    pub show_discrepancy_only: Option<bool>,
    pub discrepancy_threshold: Option<f64>,
    pub min_sample_threshold: Option<usize>,
    pub debug: Option<bool>,
}

impl ChartDataRequest {
    fn filters(&self) -> Result<ChartFilters> {
        let level = self
            .drill_level
            .ok_or_else(|| BattleLensError::Validation("drillLevel is required".to_string()))?;
        let discrepancy_threshold = self
            .discrepancy_threshold
            .unwrap_or(DEFAULT_DISCREPANCY_THRESHOLD);
        if !discrepancy_threshold.is_finite() || discrepancy_threshold < 0.0 {
            return Err(BattleLensError::Validation(
                "discrepancyThreshold must be a non-negative number".to_string(),
            ));
        }
        Ok(ChartFilters {
            level,
            coarse_cluster: non_blank(self.coarse_cluster.as_deref()).map(String::from),
            fine_cluster: non_blank(self.fine_cluster.as_deref()).map(String::from),
            selected_models: self.selected_models.clone().unwrap_or_default(),
            show_unexpected_only: self.show_unexpected_only.unwrap_or(false),
            filter_battle_models: self.filter_battle_models.unwrap_or(false),
            show_discrepancy_only: self.show_discrepancy_only.unwrap_or(false),
            discrepancy_threshold,
            min_items: self.min_sample_threshold.unwrap_or(DEFAULT_MIN_ITEMS),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataResponse {
    pub chart_data: Vec<ChartPoint>,
    pub table_data: Vec<RowSummary>,
    pub total_count: usize,
    pub unique_models: Vec<String>,
    pub cached: bool,
    pub compute_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<ChartDebug>,
}

pub async fn api_chart_data(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ChartDataRequest>, JsonRejection>,
) -> impl IntoResponse {
    let started = Instant::now();
    let request = match parse_body(payload, started) {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };

    match chart_data(&state, request, started).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => ApiError::from_error(&e, elapsed_ms(started)).into_response(),
    }
}

async fn chart_data(
    state: &AppState,
    request: ChartDataRequest,
    started: Instant,
) -> Result<ChartDataResponse> {
    let filters = request.filters()?;
    let dataset = state.registry.resolve(request.dataset.as_deref())?;
    let key = cache_key("chart-data", &(&dataset.key, &request)).map_err(anyhow::Error::from)?;

    let hit = state.chart_cache.lock().await.get(&key);
    if let Some(mut response) = hit {
        response.cached = true;
        response.compute_time = elapsed_ms(started);
        info!(dataset = %dataset.key, level = %filters.level, "Chart data served from cache");
        return Ok(response);
    }

    let rows = state.rows_for(dataset).await?;
    let output = build_chart(&rows, &filters);

    let response = ChartDataResponse {
        chart_data: output.chart_data,
        table_data: output.table_data,
        total_count: output.total_count,
        unique_models: output.unique_models,
        cached: false,
        compute_time: elapsed_ms(started),
        debug_info: request.debug.unwrap_or(false).then_some(output.debug),
    };
    state
        .chart_cache
        .lock()
        .await
        .insert(key, response.clone());

    info!(
        dataset = %dataset.key,
        level = %filters.level,
        clusters = response.chart_data.len(),
        rows = response.total_count,
        duration_ms = response.compute_time,
        "Computed chart data"
    );
    Ok(response)
}
