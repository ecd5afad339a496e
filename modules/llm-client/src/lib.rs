//! JSON-mode chat client for an OpenAI-compatible provider.
//!
//! Every call demands a single JSON object back, retries transient provider
//! failures with exponential backoff, and reports per-attempt call and token
//! metrics. Authentication failures and non-429 4xx responses are terminal.

mod error;
mod types;

pub use error::{LlmError, Result};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use brandscope_core::AppMetrics;

use types::{ChatRequest, ChatResponse, ResponseFormat, WireMessage};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const SYSTEM_PROMPT: &str =
    "You are a precise analyst. Respond with a single valid JSON object and nothing else.";
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_secs(2);
const TEMPERATURE: f32 = 0.7;

pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
    metrics: Arc<AppMetrics>,
}

impl LlmClient {
    pub fn new(
        api_key: &str,
        model: &str,
        timeout: Duration,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: OPENAI_API_URL.to_string(),
            model: model.to_string(),
            timeout,
            metrics,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One JSON-mode chat call: up to three attempts, 2 s then 4 s between
    /// them. 401 and non-429 4xx responses are never retried.
    pub async fn call_json(&self, endpoint: &str, prompt: &str) -> Result<serde_json::Value> {
        let mut last_err = None;
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let backoff = BACKOFF_BASE * 2u32.pow(attempt - 1);
                debug!(endpoint, attempt, backoff_secs = backoff.as_secs(), "Retrying LLM call");
                tokio::time::sleep(backoff).await;
            }
            match self.attempt(endpoint, prompt).await {
                Ok(value) => return Ok(value),
                Err(e) if retryable(&e) => {
                    warn!(endpoint, attempt, error = %e, "LLM call attempt failed");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.expect("at least one attempt ran"))
    }

    async fn attempt(&self, endpoint: &str, prompt: &str) -> Result<serde_json::Value> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage::system(SYSTEM_PROMPT),
                WireMessage::user(prompt),
            ],
            temperature: TEMPERATURE,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(endpoint, model = %self.model, "LLM chat request");

        let response = match self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                self.metrics.record_openai_call(&self.model, endpoint, "timeout");
                return Err(LlmError::Timeout(self.timeout));
            }
            Err(e) => {
                self.metrics.record_openai_call(&self.model, endpoint, "transport");
                return Err(LlmError::Transport(e));
            }
        };

        let status = response.status();
        self.metrics
            .record_openai_call(&self.model, endpoint, status.as_str());

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), message));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Protocol(e.to_string()))?;

        if let Some(usage) = body.usage {
            self.metrics
                .add_openai_tokens(&self.model, endpoint, usage.total_tokens as u64);
        }

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::Empty)?;

        serde_json::from_str(strip_code_fences(&content))
            .map_err(|e| LlmError::Protocol(e.to_string()))
    }
}

/// Strip markdown code fences some models wrap JSON in despite instructions.
pub fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn classify_status(status: u16, message: String) -> LlmError {
    match status {
        401 => LlmError::Auth,
        429 => LlmError::RateLimited,
        _ => LlmError::Api { status, message },
    }
}

fn retryable(error: &LlmError) -> bool {
    match error {
        LlmError::Auth => false,
        LlmError::Api { status, .. } => *status >= 500,
        LlmError::Timeout(_)
        | LlmError::RateLimited
        | LlmError::Transport(_)
        | LlmError::Protocol(_)
        | LlmError::Empty => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_code_fences_unwraps_json_blocks() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("{}"), "{}");
    }

    #[test]
    fn auth_and_client_errors_are_terminal() {
        assert!(!retryable(&classify_status(401, String::new())));
        assert!(!retryable(&classify_status(400, "bad request".into())));
        assert!(!retryable(&classify_status(422, "schema".into())));
    }

    #[test]
    fn rate_limit_timeouts_and_server_errors_retry() {
        assert!(retryable(&classify_status(429, String::new())));
        assert!(retryable(&classify_status(500, String::new())));
        assert!(retryable(&classify_status(503, String::new())));
        assert!(retryable(&LlmError::Timeout(Duration::from_secs(60))));
        assert!(retryable(&LlmError::Protocol("trailing garbage".into())));
    }

    #[test]
    fn classify_maps_status_to_variant() {
        assert!(matches!(classify_status(401, String::new()), LlmError::Auth));
        assert!(matches!(
            classify_status(429, String::new()),
            LlmError::RateLimited
        ));
        assert!(matches!(
            classify_status(500, String::new()),
            LlmError::Api { status: 500, .. }
        ));
    }
}
