use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::documents::ExtractionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid multipart request: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Invalid multipart request: {0}")]
    MultipartRejection(#[from] MultipartRejection),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Every resume in the batch failed.
    #[error("Batch failed: {0}")]
    BatchFailed(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Multipart(e) => (e.status(), "INVALID_MULTIPART", e.body_text()),
            AppError::MultipartRejection(e) => (e.status(), "INVALID_MULTIPART", e.body_text()),
            AppError::Extraction(ExtractionError::Worker(e)) => {
                tracing::error!("Extraction worker failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::Extraction(e) => (StatusCode::BAD_REQUEST, "EXTRACTION_ERROR", e.to_string()),
            AppError::BatchFailed(msg) => {
                tracing::error!("Batch failed: {msg}");
                (StatusCode::BAD_REQUEST, "BATCH_FAILED", msg.clone())
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_maps_to_400() {
        let response = AppError::Validation("Missing 'file' file".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Missing 'file' file");
    }

    #[tokio::test]
    async fn test_extraction_error_message_is_surfaced() {
        let response = AppError::from(ExtractionError::UnsupportedType("cv.txt".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "EXTRACTION_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("cv.txt"));
    }

    #[tokio::test]
    async fn test_extraction_worker_failure_is_internal() {
        let response = AppError::from(ExtractionError::Worker("task panicked".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert!(!body["error"]["message"].as_str().unwrap().contains("panicked"));
    }

    #[tokio::test]
    async fn test_llm_error_hides_details() {
        let response = AppError::Llm("API error (status 401): bad key".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "LLM_ERROR");
        assert!(!body["error"]["message"].as_str().unwrap().contains("bad key"));
    }
}
