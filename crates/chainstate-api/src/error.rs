use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use chainstate_common::ChainStateError;

/// Newtype wrapper for ChainStateError to implement IntoResponse
/// (orphan rule prevents implementing external trait on external type)
pub struct ApiError(pub ChainStateError);

impl From<ChainStateError> for ApiError {
    fn from(err: ChainStateError) -> Self {
        ApiError(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError(ChainStateError::Database(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        let body = Json(json!({
            "error": self.0.to_string()
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
