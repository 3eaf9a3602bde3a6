use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Passed explicitly wherever it is needed — there is no process-wide
/// singleton; the pipeline runner receives its knobs at construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_model: String,
    pub embeddings_api_key: String,
    pub embeddings_api_base: String,
    pub embeddings_model: String,
    /// Max corrective re-prompts when a model reply fails schema validation.
    pub schema_retry_limit: u32,
    /// Chunks fetched per retrieval query in the skill-gap stage.
    pub retrieval_top_k: usize,
    /// Per-request timeout applied to every outbound completion/embedding call.
    pub request_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_model: env_or("ANTHROPIC_MODEL", "claude-sonnet-4-5"),
            embeddings_api_key: require_env("EMBEDDINGS_API_KEY")?,
            embeddings_api_base: env_or("EMBEDDINGS_API_BASE", "https://api.openai.com/v1"),
            embeddings_model: env_or("EMBEDDINGS_MODEL", "text-embedding-3-small"),
            schema_retry_limit: env_or("SCHEMA_RETRY_LIMIT", "1")
                .parse::<u32>()
                .context("SCHEMA_RETRY_LIMIT must be a non-negative integer")?,
            retrieval_top_k: env_or("RETRIEVAL_TOP_K", "3")
                .parse::<usize>()
                .context("RETRIEVAL_TOP_K must be a positive integer")?,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", "120")
                .parse::<u64>()
                .context("REQUEST_TIMEOUT_SECS must be a number of seconds")?,
            port: env_or("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
