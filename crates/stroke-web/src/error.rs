//! 错误到HTTP响应的映射

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use stroke_core::StrokeError;

/// HTTP层错误包装
#[derive(Debug)]
pub struct ApiError(pub StrokeError);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<StrokeError> for ApiError {
    fn from(error: StrokeError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StrokeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            StrokeError::NotFound(_) => StatusCode::NOT_FOUND,
            StrokeError::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": true,
            "message": self.0.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
