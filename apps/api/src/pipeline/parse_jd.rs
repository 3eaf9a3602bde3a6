//! Stage 1 — extracts a typed job record from the raw job description.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::llm_client::{complete_json, Completion};
use crate::pipeline::prompts::{PARSE_JD_PROMPT_TEMPLATE, PARSE_JD_SYSTEM};
use crate::pipeline::{ParsedJob, StageFailure};

const TEMPERATURE: f32 = 0.1;

/// Raw model reply, before normalization.
#[derive(Debug, Deserialize)]
struct RawParsedJob {
    job_title: String,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    skills_required: Vec<String>,
    #[serde(default)]
    responsibilities: Vec<String>,
}

/// Parses a job description into a `ParsedJob`. One completion request with
/// a JSON-only template; malformed output gets the bounded corrective
/// re-prompt before `StageFailure::Schema` surfaces.
pub async fn parse_jd(
    model: &dyn Completion,
    jd_text: &str,
    retry_limit: u32,
) -> Result<ParsedJob, StageFailure> {
    if jd_text.trim().is_empty() {
        return Err(StageFailure::MissingInput("job_description"));
    }

    let prompt = PARSE_JD_PROMPT_TEMPLATE.replace("{jd_text}", jd_text);
    let raw: RawParsedJob =
        complete_json(model, &prompt, PARSE_JD_SYSTEM, TEMPERATURE, retry_limit).await?;
    Ok(normalize(raw))
}

/// Dedup + case-normalize skills; trim everything; drop empties.
fn normalize(raw: RawParsedJob) -> ParsedJob {
    let required_skills: BTreeSet<String> = raw
        .skills_required
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    ParsedJob {
        title: raw.job_title.trim().to_string(),
        company: raw
            .company
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        required_skills,
        responsibilities: raw
            .responsibilities
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect(),
    }
}
