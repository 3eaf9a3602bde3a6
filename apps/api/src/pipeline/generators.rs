//! Stages 3–5 — template-filling generators: cover letter, application
//! email, and interview prep. Each renders one fixed prompt from prior
//! stage outputs, makes one completion call, and stores the raw text.
//! The only validation is non-emptiness; interview prep may degrade to an
//! unstructured text block when the model ignores the JSON shape.

use serde::Deserialize;

use crate::llm_client::{strip_json_fences, Completion};
use crate::pipeline::prompts::{
    COVER_LETTER_PROMPT_TEMPLATE, COVER_LETTER_SYSTEM, EMAIL_PROMPT_TEMPLATE, EMAIL_SYSTEM,
    INTERVIEW_PREP_PROMPT_TEMPLATE, INTERVIEW_PREP_SYSTEM,
};
use crate::pipeline::{InterviewPrep, ParsedJob, SkillGapReport, StageFailure};
use crate::store::ResumeStore;

const LETTER_TEMPERATURE: f32 = 0.7;
const EMAIL_TEMPERATURE: f32 = 0.5;
const PREP_TEMPERATURE: f32 = 0.6;

/// Targeted retrieval query for the candidate's contact details.
const CONTACT_QUERY: &str = "name address phone email contact location";

/// Max cover-letter characters echoed into the email prompt.
const LETTER_EXCERPT_CHARS: usize = 400;

/// Cap on responsibilities / missing skills forwarded to the prep prompt.
const PREP_RESPONSIBILITY_CAP: usize = 4;
const PREP_MISSING_SKILL_CAP: usize = 5;

pub async fn generate_cover_letter(
    model: &dyn Completion,
    store: &ResumeStore,
    namespace: &str,
    parsed: &ParsedJob,
    gap: &SkillGapReport,
    top_k: usize,
) -> Result<String, StageFailure> {
    let experience_query = format!("{} experience projects achievements", parsed.title);
    let experience = joined_context(store, namespace, &experience_query, top_k).await?;
    let contact = joined_context(store, namespace, CONTACT_QUERY, top_k).await?;

    let prompt = COVER_LETTER_PROMPT_TEMPLATE
        .replace("{job_title}", &parsed.title)
        .replace("{company}", company_name(parsed))
        .replace("{matched_skills}", &gap.matched_skills.join(", "))
        .replace("{missing_skills}", &gap.missing_skills.join(", "))
        .replace("{contact_context}", &contact)
        .replace("{resume_context}", &experience);

    non_empty(model.complete(&prompt, COVER_LETTER_SYSTEM, LETTER_TEMPERATURE).await?)
}

pub async fn generate_email(
    model: &dyn Completion,
    store: &ResumeStore,
    namespace: &str,
    parsed: &ParsedJob,
    gap: &SkillGapReport,
    cover_letter: &str,
    top_k: usize,
) -> Result<String, StageFailure> {
    let contact = joined_context(store, namespace, CONTACT_QUERY, top_k).await?;
    let excerpt: String = cover_letter.chars().take(LETTER_EXCERPT_CHARS).collect();

    let prompt = EMAIL_PROMPT_TEMPLATE
        .replace("{job_title}", &parsed.title)
        .replace("{company}", company_name(parsed))
        .replace("{score}", &gap.match_score.to_string())
        .replace("{matched_skills}", &gap.matched_skills.join(", "))
        .replace("{contact_context}", &contact)
        .replace("{cover_letter_excerpt}", &excerpt);

    non_empty(model.complete(&prompt, EMAIL_SYSTEM, EMAIL_TEMPERATURE).await?)
}

/// Shape requested from the model for interview prep.
#[derive(Debug, Deserialize)]
struct RawPrep {
    #[serde(default)]
    technical_questions: Vec<String>,
    #[serde(default)]
    behavioral_questions: Vec<String>,
    #[serde(default)]
    prep_tips: String,
}

pub async fn generate_interview_prep(
    model: &dyn Completion,
    parsed: &ParsedJob,
    gap: &SkillGapReport,
) -> Result<InterviewPrep, StageFailure> {
    let responsibilities: Vec<&String> = parsed
        .responsibilities
        .iter()
        .take(PREP_RESPONSIBILITY_CAP)
        .collect();
    let missing: Vec<&String> = gap.missing_skills.iter().take(PREP_MISSING_SKILL_CAP).collect();

    let prompt = INTERVIEW_PREP_PROMPT_TEMPLATE
        .replace("{job_title}", &parsed.title)
        .replace("{company}", company_name(parsed))
        .replace(
            "{responsibilities}",
            &serde_json::to_string(&responsibilities).unwrap_or_default(),
        )
        .replace(
            "{missing_skills}",
            &missing.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "),
        );

    let text = non_empty(
        model
            .complete(&prompt, INTERVIEW_PREP_SYSTEM, PREP_TEMPERATURE)
            .await?,
    )?;

    // Free text instead of the requested list is an accepted degraded
    // result, not a failure.
    match serde_json::from_str::<RawPrep>(strip_json_fences(&text)) {
        Ok(raw) => Ok(InterviewPrep::Structured {
            technical_questions: raw.technical_questions,
            behavioral_questions: raw.behavioral_questions,
            prep_tips: raw.prep_tips,
        }),
        Err(_) => Ok(InterviewPrep::Unstructured(text)),
    }
}

fn company_name(parsed: &ParsedJob) -> &str {
    parsed.company.as_deref().unwrap_or("the company")
}

async fn joined_context(
    store: &ResumeStore,
    namespace: &str,
    query: &str,
    top_k: usize,
) -> Result<String, StageFailure> {
    let hits = store.query(namespace, query, top_k).await?;
    Ok(hits
        .into_iter()
        .map(|h| h.text)
        .collect::<Vec<_>>()
        .join("\n\n"))
}

/// An empty completion is a generation failure.
fn non_empty(text: String) -> Result<String, StageFailure> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(StageFailure::EmptyCompletion)
    } else {
        Ok(trimmed.to_string())
    }
}
