// HTTP response utilities - error envelope mapping
use crate::application::error::EngineError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper that lets handlers return `EngineError` with `?` and get a typed
/// JSON error envelope back.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, error_body(&self.0)).into_response()
    }
}

/// The `{error, message}` envelope, shared by single responses and per-item
/// batch outcomes.
pub fn error_body(err: &EngineError) -> Json<serde_json::Value> {
    Json(json!({
        "error": err.kind(),
        "message": err.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError(EngineError::dataset_not_found("ds-1")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unsupported_format_maps_to_415() {
        let response =
            ApiError(EngineError::UnsupportedFormat("row 2: bad".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn envelope_carries_kind_and_message() {
        let Json(body) = error_body(&EngineError::Validation("device_id is required".to_string()));
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "validation error: device_id is required");
    }
}
