/// LLM Client — the single point of entry for all completion calls.
///
/// ARCHITECTURAL RULE: no pipeline stage may call the Anthropic API directly.
/// Stages depend on the `Completion` trait; the concrete `AnthropicClient`
/// lives here and is swapped for a scripted stub in tests.
use std::borrow::Cow;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
/// Transport-level retries on 429/5xx. Schema retries are separate and
/// bounded by `Config::schema_retry_limit`.
const MAX_TRANSPORT_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("completion request timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A malformed structured reply, surfaced only after the bounded
/// corrective re-prompt is exhausted.
#[derive(Debug, Error)]
pub enum StructuredCallError {
    #[error(transparent)]
    Model(#[from] LlmError),

    #[error("model output failed schema validation after {attempts} attempt(s): {source}")]
    Schema {
        attempts: u32,
        source: serde_json::Error,
    },
}

/// Opaque completion boundary: returns text, may fail, may be slow.
/// Carried in `PipelineRunner` as `Arc<dyn Completion>`.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system: &str,
        temperature: f32,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Production completion backend over the Anthropic Messages API.
/// Retries 429/5xx with exponential backoff; a timeout is surfaced
/// immediately as `LlmError::Timeout` and treated as fatal by the runner.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl Completion for AnthropicClient {
    async fn complete(
        &self,
        prompt: &str,
        system: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let request_body = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_TRANSPORT_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) if e.is_timeout() => return Err(LlmError::Timeout),
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: MessagesResponse = response.json().await.map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Http(e)
                }
            })?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                parsed.usage.input_tokens, parsed.usage.output_tokens
            );

            return match parsed.text() {
                Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
                _ => Err(LlmError::EmptyContent),
            };
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_TRANSPORT_RETRIES,
        }))
    }
}

/// Calls the model and deserializes the reply as JSON.
///
/// On a malformed reply the model is re-prompted with a corrective suffix at
/// most `retry_limit` times before `StructuredCallError::Schema` surfaces.
/// The prompt itself must already instruct the model to return valid JSON.
pub async fn complete_json<T: DeserializeOwned>(
    model: &dyn Completion,
    prompt: &str,
    system: &str,
    temperature: f32,
    retry_limit: u32,
) -> Result<T, StructuredCallError> {
    let mut attempt: u32 = 0;

    loop {
        let effective_prompt: Cow<'_, str> = if attempt == 0 {
            Cow::Borrowed(prompt)
        } else {
            Cow::Owned(format!("{prompt}\n\n{}", prompts::REPROMPT_SUFFIX))
        };

        let text = model.complete(&effective_prompt, system, temperature).await?;
        let cleaned = strip_json_fences(&text);

        match serde_json::from_str::<T>(cleaned) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retry_limit => {
                warn!("schema validation failed on attempt {}: {e}", attempt + 1);
                attempt += 1;
            }
            Err(e) => {
                return Err(StructuredCallError::Schema {
                    attempts: attempt + 1,
                    source: e,
                })
            }
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Deterministic completion stub. Replies are consumed in order; the
    /// last reply repeats once the script is exhausted.
    pub struct ScriptedModel {
        replies: Mutex<Vec<String>>,
        cursor: AtomicUsize,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(String::from).collect()),
                cursor: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.cursor.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Completion for ScriptedModel {
        async fn complete(
            &self,
            _prompt: &str,
            _system: &str,
            _temperature: f32,
        ) -> Result<String, LlmError> {
            let replies = self.replies.lock().unwrap();
            let i = self.cursor.fetch_add(1, Ordering::SeqCst);
            replies
                .get(i.min(replies.len().saturating_sub(1)))
                .cloned()
                .ok_or(LlmError::EmptyContent)
        }
    }

    /// Completion stub that always fails, for abort-path tests.
    pub struct FailingModel;

    #[async_trait]
    impl Completion for FailingModel {
        async fn complete(
            &self,
            _prompt: &str,
            _system: &str,
            _temperature: f32,
        ) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 500,
                message: "simulated outage".to_string(),
            })
        }
    }
}
