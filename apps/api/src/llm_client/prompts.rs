#![allow(dead_code)]

// Cross-cutting prompt fragments shared by every stage.
// Each stage defines its own prompts alongside it (pipeline/prompts.rs);
// this file holds only the pieces reused across stages.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Corrective suffix appended to the prompt on a schema-validation re-prompt.
pub const REPROMPT_SUFFIX: &str = "\
    Your previous reply was not valid JSON matching the required schema. \
    Respond again with ONLY the JSON object, exactly matching the schema above. \
    No prose, no code fences.";
