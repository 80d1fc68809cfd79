use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Json},
};
use serde::Deserialize;

use battlelens_common::{BattleLensError, Row};

use super::{elapsed_ms, parse_body};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDetailRequest {
    dataset: Option<String>,
    row_id: Option<u64>,
}

/// Row ids are 1-based positions, so the lookup is an index.
pub fn find_row(rows: &[Row], row_id: u64) -> Option<&Row> {
    let idx = usize::try_from(row_id).ok()?.checked_sub(1)?;
    rows.get(idx).filter(|r| r.row_id == row_id)
}

pub async fn api_row_detail(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RowDetailRequest>, JsonRejection>,
) -> impl IntoResponse {
    let started = Instant::now();
    let request = match parse_body(payload, started) {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };

    let Some(row_id) = request.row_id else {
        let err = BattleLensError::Validation("rowId is required".to_string());
        return ApiError::from_error(&err, elapsed_ms(started)).into_response();
    };

    let dataset = match state.registry.resolve(request.dataset.as_deref()) {
        Ok(d) => d,
        Err(e) => return ApiError::from_error(&e, elapsed_ms(started)).into_response(),
    };

    match state.rows_for(dataset).await {
        Ok(rows) => match find_row(&rows, row_id) {
            Some(row) => Json(serde_json::json!({
                "row": row,
                "computeTime": elapsed_ms(started),
            }))
            .into_response(),
            None => ApiError::not_found(format!("Row {row_id} not found"), elapsed_ms(started))
                .into_response(),
        },
        Err(e) => ApiError::from_error(&e, elapsed_ms(started)).into_response(),
    }
}
