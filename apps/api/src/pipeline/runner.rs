//! Pipeline Runner — sequences the five stages over one `PipelineState`.
//!
//! Strictly sequential: each stage consumes the previous stage's committed
//! output, so nothing inside a run is parallelizable without changing the
//! data dependencies. A failure aborts immediately and hands back the
//! partial state; there is no cross-stage retry and no rollback.

use std::sync::Arc;

use tracing::{info, warn};

use crate::llm_client::Completion;
use crate::pipeline::{
    generators, parse_jd, skill_gap, Phase, PipelineFailure, PipelineState, Stage, StageError,
    StageFailure,
};
use crate::store::ResumeStore;

/// Knobs for one runner, supplied at construction. No globals.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Max corrective re-prompts per structured model call.
    pub schema_retry_limit: u32,
    /// Chunks per retrieval query.
    pub retrieval_top_k: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            schema_retry_limit: 1,
            retrieval_top_k: 3,
        }
    }
}

pub struct PipelineRunner {
    model: Arc<dyn Completion>,
    store: Arc<ResumeStore>,
    options: RunnerOptions,
}

impl PipelineRunner {
    pub fn new(model: Arc<dyn Completion>, store: Arc<ResumeStore>, options: RunnerOptions) -> Self {
        Self {
            model,
            store,
            options,
        }
    }

    /// Runs the full pipeline for one job description against the resume
    /// chunks stored under `namespace`. The returned state is fully
    /// populated on success; on failure the boxed `PipelineFailure` carries
    /// the failing stage and everything completed before it.
    pub async fn run(
        &self,
        job_description: &str,
        resume_text: Option<String>,
        namespace: &str,
    ) -> Result<PipelineState, Box<PipelineFailure>> {
        let mut state = PipelineState::new(job_description.to_string(), resume_text);
        let retry = self.options.schema_retry_limit;
        let top_k = self.options.retrieval_top_k;

        // Stage 1: parse the job description.
        info!("stage {} starting", Stage::ParseJd);
        match parse_jd::parse_jd(self.model.as_ref(), &state.job_description, retry).await {
            Ok(parsed) => {
                info!(
                    "stage {} done: '{}', {} required skills",
                    Stage::ParseJd,
                    parsed.title,
                    parsed.required_skills.len()
                );
                state.parsed_job = Some(parsed);
                state.phase = Phase::Parsed;
            }
            Err(failure) => return Err(abort(state, Stage::ParseJd, failure)),
        }

        // Stage 2: skill-gap analysis over retrieved resume chunks.
        let parsed = match state.parsed_job.clone() {
            Some(p) => p,
            None => {
                return Err(abort(
                    state,
                    Stage::SkillGap,
                    StageFailure::MissingInput("parsed_job"),
                ))
            }
        };
        info!("stage {} starting", Stage::SkillGap);
        match skill_gap::analyze_skill_gap(
            self.model.as_ref(),
            &self.store,
            namespace,
            &parsed,
            top_k,
            retry,
        )
        .await
        {
            Ok(report) => {
                info!(
                    "stage {} done: score {}/100, {} gaps",
                    Stage::SkillGap,
                    report.match_score,
                    report.missing_skills.len()
                );
                state.skill_gap = Some(report);
                state.phase = Phase::GapAnalyzed;
            }
            Err(failure) => return Err(abort(state, Stage::SkillGap, failure)),
        }

        let gap = match state.skill_gap.clone() {
            Some(g) => g,
            None => {
                return Err(abort(
                    state,
                    Stage::CoverLetter,
                    StageFailure::MissingInput("skill_gap"),
                ))
            }
        };

        // Stage 3: cover letter.
        info!("stage {} starting", Stage::CoverLetter);
        match generators::generate_cover_letter(
            self.model.as_ref(),
            &self.store,
            namespace,
            &parsed,
            &gap,
            top_k,
        )
        .await
        {
            Ok(letter) => {
                state.cover_letter = Some(letter);
                state.phase = Phase::LetterDone;
            }
            Err(failure) => return Err(abort(state, Stage::CoverLetter, failure)),
        }

        // Stage 4: application email, referencing the letter.
        let letter = match state.cover_letter.clone() {
            Some(l) => l,
            None => {
                return Err(abort(
                    state,
                    Stage::Email,
                    StageFailure::MissingInput("cover_letter"),
                ))
            }
        };
        info!("stage {} starting", Stage::Email);
        match generators::generate_email(
            self.model.as_ref(),
            &self.store,
            namespace,
            &parsed,
            &gap,
            &letter,
            top_k,
        )
        .await
        {
            Ok(email) => {
                state.email_draft = Some(email);
                state.phase = Phase::EmailDone;
            }
            Err(failure) => return Err(abort(state, Stage::Email, failure)),
        }

        // Stage 5: interview prep.
        info!("stage {} starting", Stage::InterviewPrep);
        match generators::generate_interview_prep(self.model.as_ref(), &parsed, &gap).await {
            Ok(prep) => {
                state.interview_prep = Some(prep);
                state.phase = Phase::PrepDone;
            }
            Err(failure) => return Err(abort(state, Stage::InterviewPrep, failure)),
        }

        state.phase = Phase::Complete;
        info!("pipeline complete for namespace '{namespace}'");
        Ok(state)
    }
}

fn abort(partial: PipelineState, stage: Stage, failure: StageFailure) -> Box<PipelineFailure> {
    warn!("stage {stage} failed: {failure}");
    Box::new(PipelineFailure {
        partial,
        error: StageError { stage, failure },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::test_support::HashEmbedder;
    use crate::llm_client::test_support::{FailingModel, ScriptedModel};

    const JD: &str = "Senior Rust Engineer at Acme. Required: Rust, Tokio. \
        You will build and operate async services.";

    const RESUME: &str = "Jane Doe — jane@example.com, +1 555 0100. \
        Six years of Rust, shipped Tokio-based services at scale.";

    const PARSE_REPLY: &str = r#"{
        "job_title": "Senior Rust Engineer",
        "company": "Acme",
        "skills_required": ["Rust", "Tokio"],
        "responsibilities": ["build async services", "operate async services"]
    }"#;

    const GAP_REPLY: &str = r#"{
        "match_score": 82,
        "matched_skills": ["rust", "tokio"],
        "missing_skills": [],
        "summary": "Strong fit."
    }"#;

    const PREP_REPLY: &str = r#"{
        "technical_questions": ["How do you avoid blocking the Tokio runtime?"],
        "behavioral_questions": ["Describe a production incident you owned."],
        "prep_tips": "Walk through a real async service you built."
    }"#;

    fn scripted_runner(replies: Vec<&str>) -> (Arc<ScriptedModel>, PipelineRunner, Arc<ResumeStore>) {
        let model = Arc::new(ScriptedModel::new(replies));
        let store = Arc::new(ResumeStore::new(Arc::new(HashEmbedder)));
        let runner = PipelineRunner::new(model.clone(), store.clone(), RunnerOptions::default());
        (model, runner, store)
    }

    #[tokio::test]
    async fn test_full_run_populates_every_stage_field() {
        let (model, runner, store) = scripted_runner(vec![
            PARSE_REPLY,
            GAP_REPLY,
            "Dear Hiring Manager, ...",
            "Subject: Application for Senior Rust Engineer — Jane Doe",
            PREP_REPLY,
        ]);
        store.ingest("default", RESUME).await.unwrap();

        let state = runner.run(JD, None, "default").await.unwrap();

        assert_eq!(state.phase, Phase::Complete);
        assert!(state.parsed_job.is_some());
        assert!(state.skill_gap.is_some());
        assert!(state.cover_letter.is_some());
        assert!(state.email_draft.is_some());
        assert!(state.interview_prep.is_some());
        // One completion per stage.
        assert_eq!(model.calls(), 5);
    }

    #[tokio::test]
    async fn test_empty_skill_set_skips_gap_model_call() {
        let no_skills_parse = r#"{
            "job_title": "Generalist",
            "company": null,
            "skills_required": [],
            "responsibilities": []
        }"#;
        let (model, runner, _store) = scripted_runner(vec![
            no_skills_parse,
            "Dear Hiring Manager, ...",
            "Subject: Application",
            PREP_REPLY,
        ]);

        let state = runner.run(JD, None, "default").await.unwrap();
        let gap = state.skill_gap.unwrap();

        assert_eq!(gap.match_score, 100);
        assert!(gap.matched_skills.is_empty());
        assert!(gap.missing_skills.is_empty());
        // Four calls, not five: the gap stage never hit the model.
        assert_eq!(model.calls(), 4);
    }

    #[tokio::test]
    async fn test_failure_at_email_preserves_earlier_stages() {
        // Blank email completion aborts stage 4.
        let (_, runner, store) = scripted_runner(vec![
            PARSE_REPLY,
            GAP_REPLY,
            "Dear Hiring Manager, ...",
            "   ",
            "   ",
        ]);
        store.ingest("default", RESUME).await.unwrap();

        let failure = runner.run(JD, None, "default").await.unwrap_err();

        assert_eq!(failure.error.stage, Stage::Email);
        assert!(matches!(failure.error.failure, StageFailure::EmptyCompletion));
        assert_eq!(failure.partial.phase, Phase::LetterDone);
        assert!(failure.partial.parsed_job.is_some());
        assert!(failure.partial.skill_gap.is_some());
        assert!(failure.partial.cover_letter.is_some());
        assert!(failure.partial.email_draft.is_none());
        assert!(failure.partial.interview_prep.is_none());
    }

    #[tokio::test]
    async fn test_model_outage_aborts_at_first_stage() {
        let store = Arc::new(ResumeStore::new(Arc::new(HashEmbedder)));
        let runner = PipelineRunner::new(Arc::new(FailingModel), store, RunnerOptions::default());

        let failure = runner.run(JD, None, "default").await.unwrap_err();

        assert_eq!(failure.error.stage, Stage::ParseJd);
        assert_eq!(failure.partial.phase, Phase::Init);
        assert!(failure.partial.parsed_job.is_none());
    }

    #[tokio::test]
    async fn test_identical_inputs_yield_identical_state() {
        let replies = vec![
            PARSE_REPLY,
            GAP_REPLY,
            "Dear Hiring Manager, ...",
            "Subject: Application for Senior Rust Engineer — Jane Doe",
            PREP_REPLY,
        ];

        let (_, runner_a, store_a) = scripted_runner(replies.clone());
        store_a.ingest("default", RESUME).await.unwrap();
        let first = runner_a.run(JD, None, "default").await.unwrap();

        let (_, runner_b, store_b) = scripted_runner(replies);
        store_b.ingest("default", RESUME).await.unwrap();
        let second = runner_b.run(JD, None, "default").await.unwrap();

        assert_eq!(first, second);
    }
}
