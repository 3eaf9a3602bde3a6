//! File-to-text extraction for uploaded resumes.
//!
//! Thin collaborator in front of the store: PDF via `pdf-extract`, plain
//! text as UTF-8 (lossy). DOCX and anything else is rejected — callers get
//! a clear unsupported-format error rather than garbage text.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type '{0}'. Please upload a PDF or TXT file")]
    UnsupportedFormat(String),

    #[error("could not parse PDF: {0}")]
    Pdf(String),
}

/// Extracts plain text from an uploaded file, dispatching on the filename
/// extension.
pub fn extract_text(file_bytes: &[u8], filename: &str) -> Result<String, ExtractError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(file_bytes)
            .map(|t| t.trim().to_string())
            .map_err(|e| ExtractError::Pdf(e.to_string())),
        "txt" => Ok(String::from_utf8_lossy(file_bytes).trim().to_string()),
        other => Err(ExtractError::UnsupportedFormat(other.to_string())),
    }
}
