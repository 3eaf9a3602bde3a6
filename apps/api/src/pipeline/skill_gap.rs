//! Stage 2 — skill-gap analysis: retrieval-augmented fit scoring.
//!
//! One retrieval query per required skill, aggregated into a single scoring
//! call. An empty requirement set is a perfect fit by definition and makes
//! no retrieval or model call at all.

use serde::Deserialize;
use tracing::debug;

use crate::llm_client::{complete_json, Completion};
use crate::pipeline::prompts::{SKILL_GAP_PROMPT_TEMPLATE, SKILL_GAP_SYSTEM};
use crate::pipeline::{ParsedJob, SkillGapReport, StageFailure};
use crate::store::ResumeStore;

const TEMPERATURE: f32 = 0.1;

/// Raw model reply; the score arrives as a plain integer and is clamped.
#[derive(Debug, Deserialize)]
struct RawGapReport {
    match_score: i64,
    #[serde(default)]
    matched_skills: Vec<String>,
    #[serde(default)]
    missing_skills: Vec<String>,
    #[serde(default)]
    summary: Option<String>,
}

pub async fn analyze_skill_gap(
    model: &dyn Completion,
    store: &ResumeStore,
    namespace: &str,
    parsed: &ParsedJob,
    top_k: usize,
    retry_limit: u32,
) -> Result<SkillGapReport, StageFailure> {
    if parsed.required_skills.is_empty() {
        return Ok(SkillGapReport {
            match_score: 100,
            matched_skills: vec![],
            missing_skills: vec![],
            summary: None,
        });
    }

    // One retrieval query per required skill; keep unique chunk texts in
    // first-seen order so the aggregated context is deterministic.
    let mut context: Vec<String> = Vec::new();
    for skill in &parsed.required_skills {
        let hits = store.query(namespace, skill, top_k).await?;
        for hit in hits {
            if !context.contains(&hit.text) {
                context.push(hit.text);
            }
        }
    }
    debug!(
        "aggregated {} unique resume chunks for gap analysis",
        context.len()
    );

    let skills_json = serde_json::to_string(&parsed.required_skills).unwrap_or_default();
    let prompt = SKILL_GAP_PROMPT_TEMPLATE
        .replace("{skills}", &skills_json)
        .replace("{resume_context}", &context.join("\n\n"));

    let raw: RawGapReport =
        complete_json(model, &prompt, SKILL_GAP_SYSTEM, TEMPERATURE, retry_limit).await?;

    Ok(SkillGapReport {
        match_score: raw.match_score.clamp(0, 100) as u8,
        matched_skills: raw.matched_skills,
        missing_skills: raw.missing_skills,
        summary: raw.summary.filter(|s| !s.trim().is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use super::*;
    use crate::embeddings::test_support::HashEmbedder;
    use crate::llm_client::test_support::ScriptedModel;

    fn job_with_skills(skills: &[&str]) -> ParsedJob {
        ParsedJob {
            title: "Backend Engineer".to_string(),
            company: Some("Acme".to_string()),
            required_skills: skills.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            responsibilities: vec!["build services".to_string()],
        }
    }

    fn empty_store() -> ResumeStore {
        ResumeStore::new(Arc::new(HashEmbedder))
    }

    #[tokio::test]
    async fn test_empty_required_skills_scores_100_without_model_call() {
        let model = ScriptedModel::new(vec!["should never be used"]);
        let report = analyze_skill_gap(&model, &empty_store(), "default", &job_with_skills(&[]), 3, 1)
            .await
            .unwrap();

        assert_eq!(report.match_score, 100);
        assert!(report.matched_skills.is_empty());
        assert!(report.missing_skills.is_empty());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_wholly_absent_skills_yield_low_score_and_gaps() {
        let store = empty_store();
        store
            .ingest("default", "Pastry chef with ten years of baking experience.")
            .await
            .unwrap();

        let model = ScriptedModel::new(vec![
            r#"{"match_score": 5, "matched_skills": [], "missing_skills": ["kubernetes", "rust"], "summary": "No overlap."}"#,
        ]);
        let report = analyze_skill_gap(
            &model,
            &store,
            "default",
            &job_with_skills(&["rust", "kubernetes"]),
            3,
            1,
        )
        .await
        .unwrap();

        assert!(report.match_score < 30);
        assert!(!report.missing_skills.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_clamped() {
        let model = ScriptedModel::new(vec![
            r#"{"match_score": 150, "matched_skills": ["rust"], "missing_skills": []}"#,
        ]);
        let report = analyze_skill_gap(&model, &empty_store(), "default", &job_with_skills(&["rust"]), 3, 1)
            .await
            .unwrap();
        assert_eq!(report.match_score, 100);
        assert_eq!(report.summary, None);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_reprompted_once() {
        let model = ScriptedModel::new(vec![
            "definitely not json",
            r#"{"match_score": 60, "matched_skills": ["rust"], "missing_skills": ["go"]}"#,
        ]);
        let report = analyze_skill_gap(&model, &empty_store(), "default", &job_with_skills(&["rust", "go"]), 3, 1)
            .await
            .unwrap();
        assert_eq!(report.match_score, 60);
        assert_eq!(model.calls(), 2);
    }
}
