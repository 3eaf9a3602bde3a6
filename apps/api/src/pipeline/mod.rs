//! Pipeline — the five-stage job application workflow.
//!
//! Flow: parse_jd → skill_gap → cover_letter → email → interview_prep.
//! A single typed `PipelineState` is threaded through every stage; each
//! stage validates its inputs, commits exactly one output field, and is
//! never revisited within a run. There is no branching and no cross-stage
//! retry — a stage failure aborts the run with the partial state attached.

pub mod generators;
pub mod handlers;
pub mod parse_jd;
pub mod prompts;
pub mod runner;
pub mod skill_gap;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embeddings::EmbeddingError;
use crate::llm_client::{LlmError, StructuredCallError};

/// How far a run has progressed. Single forward path, no cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Parsed,
    GapAnalyzed,
    LetterDone,
    EmailDone,
    PrepDone,
    Complete,
}

/// The five stages, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ParseJd,
    SkillGap,
    CoverLetter,
    Email,
    InterviewPrep,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ParseJd => "parse_jd",
            Stage::SkillGap => "skill_gap",
            Stage::CoverLetter => "cover_letter",
            Stage::Email => "email",
            Stage::InterviewPrep => "interview_prep",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured output of JD parsing.
/// `required_skills` is a deduplicated, lower-case-normalized set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedJob {
    pub title: String,
    pub company: Option<String>,
    pub required_skills: BTreeSet<String>,
    pub responsibilities: Vec<String>,
}

/// Skill-gap report: 0–100 fit score plus matched/missing skill lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGapReport {
    pub match_score: u8,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub summary: Option<String>,
}

/// Interview preparation material. `Structured` when the model returns the
/// requested Q&A shape; `Unstructured` keeps the raw text as an accepted
/// degraded result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InterviewPrep {
    Structured {
        technical_questions: Vec<String>,
        behavioral_questions: Vec<String>,
        prep_tips: String,
    },
    Unstructured(String),
}

/// The single record threaded through all stages. Stage fields stay `None`
/// until their producing stage commits; a later stage fails fast if a
/// required input is absent. Owned by the runner for one invocation only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineState {
    pub job_description: String,
    pub resume_text: Option<String>,
    pub parsed_job: Option<ParsedJob>,
    pub skill_gap: Option<SkillGapReport>,
    pub cover_letter: Option<String>,
    pub email_draft: Option<String>,
    pub interview_prep: Option<InterviewPrep>,
    pub phase: Phase,
}

impl PipelineState {
    pub fn new(job_description: String, resume_text: Option<String>) -> Self {
        Self {
            job_description,
            resume_text,
            parsed_job: None,
            skill_gap: None,
            cover_letter: None,
            email_draft: None,
            interview_prep: None,
            phase: Phase::Init,
        }
    }
}

/// Why a single stage failed.
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    #[error(transparent)]
    Model(#[from] LlmError),

    #[error("model output failed schema validation after {attempts} attempt(s): {message}")]
    Schema { attempts: u32, message: String },

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] EmbeddingError),

    #[error("model returned an empty completion")]
    EmptyCompletion,
}

impl From<StructuredCallError> for StageFailure {
    fn from(e: StructuredCallError) -> Self {
        match e {
            StructuredCallError::Model(m) => StageFailure::Model(m),
            StructuredCallError::Schema { attempts, source } => StageFailure::Schema {
                attempts,
                message: source.to_string(),
            },
        }
    }
}

/// A stage failure with the failing stage attached.
#[derive(Debug, Error)]
#[error("stage '{stage}' failed: {failure}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub failure: StageFailure,
}

/// An aborted run: every stage completed before the failure is still
/// visible in `partial` for diagnostics.
#[derive(Debug)]
pub struct PipelineFailure {
    pub partial: PipelineState,
    pub error: StageError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::ParseJd.to_string(), "parse_jd");
        assert_eq!(Stage::InterviewPrep.to_string(), "interview_prep");
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Phase::GapAnalyzed).unwrap(),
            "\"gap_analyzed\""
        );
    }

    #[test]
    fn test_new_state_has_no_stage_outputs() {
        let state = PipelineState::new("jd".to_string(), None);
        assert_eq!(state.phase, Phase::Init);
        assert!(state.parsed_job.is_none());
        assert!(state.skill_gap.is_none());
        assert!(state.cover_letter.is_none());
        assert!(state.email_draft.is_none());
        assert!(state.interview_prep.is_none());
    }

    #[test]
    fn test_interview_prep_serializes_untagged() {
        let prep = InterviewPrep::Unstructured("just read the JD".to_string());
        assert_eq!(
            serde_json::to_string(&prep).unwrap(),
            "\"just read the JD\""
        );
    }
}
