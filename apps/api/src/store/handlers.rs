//! Axum handlers for resume ingestion: raw text and file upload.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::extract_text;
use crate::state::AppState;
use crate::store::DEFAULT_NAMESPACE;

/// Minimum characters an uploaded file must yield to be usable.
const MIN_EXTRACTED_CHARS: usize = 50;

const PREVIEW_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
pub struct IngestResumeRequest {
    pub resume_text: String,
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct IngestResumeResponse {
    pub chunks_stored: usize,
    pub session_id: String,
    pub ingested_at: Option<DateTime<Utc>>,
}

/// POST /api/v1/resume
///
/// Stores resume text as embedded chunks. Call once per session; later
/// analyze calls retrieve against the stored chunks.
pub async fn handle_ingest_resume(
    State(state): State<AppState>,
    Json(request): Json<IngestResumeRequest>,
) -> Result<Json<IngestResumeResponse>, AppError> {
    let namespace = namespace_for(request.session_id);
    let chunks_stored = state.store.ingest(&namespace, &request.resume_text).await?;
    let ingested_at = state.store.ingested_at(&namespace).await;

    Ok(Json(IngestResumeResponse {
        chunks_stored,
        session_id: namespace,
        ingested_at,
    }))
}

#[derive(Debug, Serialize)]
pub struct UploadResumeResponse {
    pub filename: String,
    pub characters_extracted: usize,
    pub preview: String,
    pub chunks_stored: usize,
    pub session_id: String,
}

/// POST /api/v1/resume/upload
///
/// Multipart upload of a resume file (`file` field, PDF or TXT; optional
/// `session_id` field). Extracts text and ingests it like the JSON route.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResumeResponse>, AppError> {
    let mut filename = String::new();
    let mut data: Option<Bytes> = None;
    let mut session_id: Option<Uuid> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                filename = field.file_name().unwrap_or_default().to_string();
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?,
                );
            }
            Some("session_id") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read session_id: {e}")))?;
                session_id = Some(
                    raw.parse()
                        .map_err(|_| AppError::Validation("session_id must be a UUID".to_string()))?,
                );
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::Validation("missing 'file' field".to_string()))?;
    if data.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }

    let resume_text = extract_text(&data, &filename)?;
    if resume_text.chars().count() < MIN_EXTRACTED_CHARS {
        return Err(AppError::UnprocessableEntity(
            "Could not extract enough text from the file. Try a different format.".to_string(),
        ));
    }

    let namespace = namespace_for(session_id);
    let chunks_stored = state.store.ingest(&namespace, &resume_text).await?;

    let characters_extracted = resume_text.chars().count();
    let preview = if characters_extracted > PREVIEW_CHARS {
        format!("{}...", resume_text.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        resume_text
    };

    Ok(Json(UploadResumeResponse {
        filename,
        characters_extracted,
        preview,
        chunks_stored,
        session_id: namespace,
    }))
}

fn namespace_for(session_id: Option<Uuid>) -> String {
    session_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
}
