use std::time::Duration;

use serde_json::{Map, Value};

use crate::client::{ClientConfig, GeminiClient};
use crate::draft::ProjectDraft;
use crate::extract::parse_reply;
use crate::prompt::{self, SpecField};
use crate::types::{GenerateRequest, GenerateResponse, GenerationConfig};
use crate::{AgentError, Result};

// ─── RetryPolicy ──────────────────────────────────────────────────────────

/// How hard [`ProjectAgent`] tries before giving up with an empty result.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause after a failed attempt (bad status, transport error, bad JSON).
    pub retry_delay: Duration,
    /// Pause after an attempt that parsed to an empty object.
    pub empty_retry_delay: Duration,
    /// Send one last request with a stricter prompt once attempts run out.
    pub fallback: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(1500),
            empty_retry_delay: Duration::from_millis(2000),
            fallback: true,
        }
    }
}

// ─── AgentConfig ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub client: ClientConfig,
    pub generation: GenerationConfig,
    pub retry: RetryPolicy,
    /// Natural language the model should write values in.
    pub language: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            generation: GenerationConfig::default(),
            retry: RetryPolicy::default(),
            language: prompt::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

// ─── ProjectAgent ─────────────────────────────────────────────────────────

/// Drafts project specifications through the Gemini API.
///
/// The public operations never fail: every error is logged and retried, and
/// exhausting the retry budget yields an empty object that callers treat as
/// "nothing to show".
#[derive(Debug, Clone)]
pub struct ProjectAgent {
    client: GeminiClient,
    generation: GenerationConfig,
    retry: RetryPolicy,
    language: String,
}

impl ProjectAgent {
    pub fn new(config: AgentConfig) -> Result<Self> {
        Ok(Self {
            client: GeminiClient::new(config.client)?,
            generation: config.generation,
            retry: config.retry,
            language: config.language,
        })
    }

    /// Ask for a full first draft of `project_name`.
    pub async fn generate_project_json(&self, project_name: &str) -> Map<String, Value> {
        let text = prompt::generate_prompt(project_name, &self.language);
        self.send_request(&text).await
    }

    /// Ask for new values of `fields` only.
    pub async fn regenerate_fields(
        &self,
        project_name: &str,
        fields: &[SpecField],
    ) -> Map<String, Value> {
        let text = prompt::regenerate_prompt(project_name, fields, &self.language);
        self.send_request(&text).await
    }

    pub async fn generate_project(&self, project_name: &str) -> ProjectDraft {
        ProjectDraft::from_reply(&self.generate_project_json(project_name).await)
    }

    pub async fn regenerate(&self, project_name: &str, fields: &[SpecField]) -> ProjectDraft {
        ProjectDraft::from_reply(&self.regenerate_fields(project_name, fields).await)
    }

    /// Send `prompt` with retries and an optional fallback request.
    pub async fn send_request(&self, prompt_text: &str) -> Map<String, Value> {
        let request = GenerateRequest::from_prompt(prompt_text, Some(self.generation.clone()));
        let attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=attempts {
            let delay = match self.attempt(&request).await {
                Ok(map) if map.is_empty() => {
                    tracing::warn!(attempt, "model returned an empty object, retrying");
                    self.retry.empty_retry_delay
                }
                Ok(map) => return map,
                Err(AgentError::MissingApiKey) => {
                    tracing::warn!("no API key configured, skipping model call");
                    return Map::new();
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "model request failed");
                    self.retry.retry_delay
                }
            };
            if attempt < attempts {
                tokio::time::sleep(delay).await;
            }
        }

        if !self.retry.fallback {
            tracing::warn!(attempts, "all attempts failed, returning empty result");
            return Map::new();
        }

        tracing::warn!(attempts, "all attempts failed, sending fallback prompt");
        match self.fallback(prompt_text).await {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(error = %e, "fallback request failed, returning empty result");
                Map::new()
            }
        }
    }

    async fn attempt(&self, request: &GenerateRequest) -> Result<Map<String, Value>> {
        let response = self.client.generate(request).await?;
        let text = response.reply_text();
        tracing::debug!(text = %text, "raw model reply");
        let map = parse_reply(text)?;
        tracing::debug!(keys = map.len(), "parsed model reply");
        Ok(map)
    }

    /// Last-chance request: stricter prompt, service-default sampling, and a
    /// lenient read of whatever body comes back.
    async fn fallback(&self, original: &str) -> Result<Map<String, Value>> {
        let text = format!("{original}{}", prompt::FALLBACK_SUFFIX);
        let request = GenerateRequest::from_prompt(text, None);
        let body = self.client.generate_raw(&request).await?;
        let body = body.trim();

        if let Ok(envelope) = serde_json::from_str::<GenerateResponse>(body) {
            if !envelope.candidates.is_empty() {
                return parse_reply(envelope.reply_text());
            }
        }

        match (body.find('{'), body.rfind('}')) {
            (Some(first), Some(last)) if first < last => {
                let slice = &body[first..=last];
                match serde_json::from_str::<Value>(slice) {
                    Ok(Value::Object(map)) => Ok(map),
                    Ok(_) => Err(AgentError::EmptyReply),
                    Err(source) => Err(AgentError::Parse {
                        text: slice.to_string(),
                        source,
                    }),
                }
            }
            _ => Err(AgentError::EmptyReply),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
