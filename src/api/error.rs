//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::image_prep::PrepError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request is missing the 'image' field")]
    MissingImage,
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Uploaded image is too large")]
    PayloadTooLarge,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::MissingImage => (
                StatusCode::BAD_REQUEST,
                "MISSING_IMAGE",
                "Multipart request must include an 'image' file field".to_string(),
            ),
            ApiError::InvalidImage(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_IMAGE",
                detail.clone(),
            ),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Uploaded image exceeds the size limit".to_string(),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<PrepError> for ApiError {
    fn from(err: PrepError) -> Self {
        match err {
            PrepError::TooLarge { .. } => ApiError::PayloadTooLarge,
            PrepError::TooManyPixels { .. }
            | PrepError::Decode(_)
            | PrepError::BudgetExceeded(_) => ApiError::InvalidImage(err.to_string()),
            // The file at this point is our own temp file.
            PrepError::Read(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_image_returns_400() {
        let response = ApiError::MissingImage.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "MISSING_IMAGE");
    }

    #[tokio::test]
    async fn invalid_image_returns_422_with_detail() {
        let response = ApiError::InvalidImage("Not a decodable image: bad magic".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "INVALID_IMAGE");
        assert!(json["error"]["message"].as_str().unwrap().contains("decodable"));
    }

    #[tokio::test]
    async fn internal_hides_details_from_the_client() {
        let response = ApiError::Internal("disk exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn prep_errors_map_to_client_statuses() {
        let too_large: ApiError = PrepError::TooLarge { limit_mb: 50, actual_mb: 80 }.into();
        assert_eq!(
            too_large.into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );

        let bad: ApiError = PrepError::Decode("bad magic".into()).into();
        assert_eq!(bad.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
