use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
};

use crate::AppState;

pub async fn api_datasets(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "datasets": state.registry.datasets(),
        "defaultDataset": state.registry.default_key(),
    }))
}
