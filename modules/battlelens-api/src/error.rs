use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::warn;

use battlelens_common::BattleLensError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub compute_time: u64,
}

/// An error response: status plus `{error, details?, computeTime}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, compute_time: u64) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                details: None,
                compute_time,
            },
        }
    }

    pub fn bad_request(error: impl Into<String>, compute_time: u64) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, compute_time)
    }

    pub fn not_found(error: impl Into<String>, compute_time: u64) -> Self {
        Self::new(StatusCode::NOT_FOUND, error, compute_time)
    }

    /// Client mistakes map to 400; anything else is a 500 with best-effort detail.
    pub fn from_error(err: &BattleLensError, compute_time: u64) -> Self {
        match err {
            BattleLensError::Validation(_) | BattleLensError::Config(_) => {
                Self::bad_request(err.detail(), compute_time)
            }
            _ => {
                warn!(error = %err, "Request failed");
                let mut api_error = Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    compute_time,
                );
                api_error.body.details = Some(err.to_string());
                api_error
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_bad_request_without_details() {
        let err = BattleLensError::Validation("searchQuery is required".into());
        let api = ApiError::from_error(&err, 3);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.body.error, "searchQuery is required");
        assert!(api.body.details.is_none());
    }

    #[test]
    fn unknown_dataset_is_bad_request() {
        let api = ApiError::from_error(&BattleLensError::unknown_dataset("FOO"), 0);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.body.error, "Unknown dataset: FOO");
    }

    #[test]
    fn fetch_failure_is_internal_with_details() {
        let api = ApiError::from_error(&BattleLensError::Fetch("arena: HTTP 503".into()), 12);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body.details.as_deref(), Some("Fetch error: arena: HTTP 503"));
        assert_eq!(api.body.compute_time, 12);
    }
}
