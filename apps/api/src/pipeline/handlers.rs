//! Axum handler for the analyze endpoint — the single externally exposed
//! pipeline operation.

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipeline::PipelineState;
use crate::state::AppState;
use crate::store::DEFAULT_NAMESPACE;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub job_description: String,
    /// Optional inline resume; ingested before the run if present.
    /// Leave empty when the resume was already uploaded.
    #[serde(default)]
    pub resume_text: Option<String>,
    /// Session namespace for resume chunks; omitted means the shared
    /// default namespace.
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

/// POST /api/v1/analyze
///
/// Runs the full five-stage pipeline synchronously and returns the filled
/// `PipelineState`. On a stage failure the response is 502 with the failing
/// stage, the reason, and every previously completed stage's output.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<PipelineState>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }

    let namespace = request
        .session_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

    if let Some(resume_text) = request.resume_text.as_deref() {
        if !resume_text.trim().is_empty() {
            state.store.ingest(&namespace, resume_text).await?;
        }
    }

    let final_state = state
        .runner
        .run(&request.job_description, request.resume_text, &namespace)
        .await?;

    Ok(Json(final_state))
}
