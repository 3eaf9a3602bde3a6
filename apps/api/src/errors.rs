#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractError;
use crate::pipeline::PipelineFailure;
use crate::store::IngestError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("{}", .0.error)]
    Stage(Box<PipelineFailure>),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<Box<PipelineFailure>> for AppError {
    fn from(failure: Box<PipelineFailure>) -> Self {
        AppError::Stage(failure)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Stage failures carry the partial pipeline state for diagnostics,
        // so they build their own body.
        if let AppError::Stage(failure) = self {
            tracing::error!("pipeline aborted: {}", failure.error);
            let body = Json(json!({
                "error": {
                    "code": "STAGE_ERROR",
                    "stage": failure.error.stage.as_str(),
                    "message": failure.error.to_string()
                },
                "partial_state": failure.partial
            }));
            return (StatusCode::BAD_GATEWAY, body).into_response();
        }

        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Extract(ExtractError::UnsupportedFormat(_)) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FORMAT",
                self.to_string(),
            ),
            AppError::Extract(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_ERROR",
                e.to_string(),
            ),
            AppError::Ingest(IngestError::EmptyResume) => (
                StatusCode::BAD_REQUEST,
                "EMPTY_RESUME",
                self.to_string(),
            ),
            AppError::Ingest(e) => {
                tracing::error!("embedding dependency failed: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "EMBEDDING_ERROR",
                    "The embedding service failed".to_string(),
                )
            }
            AppError::Stage(_) => unreachable!("handled above"),
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
    use axum::response::IntoResponse;

    use super::*;
    use crate::pipeline::{PipelineState, Stage, StageError, StageFailure};

    #[test]
    fn test_validation_maps_to_400() {
        let response = AppError::Validation("bad input".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unsupported_format_maps_to_415() {
        let response =
            AppError::Extract(ExtractError::UnsupportedFormat("docx".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_empty_resume_maps_to_400() {
        let response = AppError::Ingest(IngestError::EmptyResume).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_stage_failure_maps_to_502() {
        let failure = Box::new(PipelineFailure {
            partial: PipelineState::new("jd".to_string(), None),
            error: StageError {
                stage: Stage::Email,
                failure: StageFailure::EmptyCompletion,
            },
        });
        let response = AppError::Stage(failure).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
