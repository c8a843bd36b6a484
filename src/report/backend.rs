//! Hosted-LLM backend abstraction.
//!
//! The pipeline only needs "prompt in, text out", so the hosted model sits
//! behind `LlmBackend` and the HTTP specifics stay in one place. The
//! concrete backend speaks the Gemini `generateContent` API, which is what
//! the report pipeline runs against in production.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ReportError;

/// Trait for hosted LLM backends.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Generate a completion for a single system + user prompt pair.
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ReportError>;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> bool;
}

/// Google Gemini `generateContent` backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

// Gemini API wire format.

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiBackend {
    pub fn new(
        base_url: String,
        model: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            model,
            api_key,
        })
    }

    /// Build the backend with the API key read from `api_key_env`.
    pub fn from_env(
        base_url: String,
        model: String,
        api_key_env: &str,
        timeout: Duration,
    ) -> Result<Self, ReportError> {
        let api_key = std::env::var(api_key_env).map_err(|_| {
            ReportError::BackendUnavailable(format!("{api_key_env} env var not set"))
        })?;
        Self::new(base_url, model, api_key, timeout)
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ReportError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: system.to_string(),
                }],
            }),
        };

        debug!(model = %self.model, "sending generateContent request");

        // Bounded retry on 429; everything else surfaces immediately.
        let max_retries = 3;
        for attempt in 0..=max_retries {
            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| ReportError::BackendUnavailable(e.to_string()))?;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if attempt == max_retries {
                    return Err(ReportError::RateLimited(max_retries + 1));
                }
                let wait_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(15 * (1 << attempt));
                warn!(
                    attempt = attempt + 1,
                    wait_secs, "LLM backend rate limited, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(ReportError::BackendUnavailable(format!(
                    "Gemini returned {status}: {body}"
                )));
            }

            let parsed: GeminiResponse = response
                .json()
                .await
                .map_err(|e| ReportError::ResponseParse(e.to_string()))?;

            let text: String = parsed
                .candidates
                .into_iter()
                .flat_map(|c| c.content.parts)
                .map(|p| p.text)
                .collect();

            if text.is_empty() {
                return Err(ReportError::ResponseParse(
                    "no candidates in Gemini response".to_string(),
                ));
            }
            return Ok(text);
        }

        Err(ReportError::RateLimited(max_retries + 1))
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/v1beta/models/{}", self.base_url, self.model);
        match self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Gemini health check failed: {}", e);
                false
            }
        }
    }
}

/// Canned backend for tests.
#[cfg(test)]
pub struct MockBackend {
    response: String,
    pub fail: bool,
}

#[cfg(test)]
impl MockBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            response: String::new(),
            fail: true,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl LlmBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, ReportError> {
        if self.fail {
            return Err(ReportError::BackendUnavailable("mock failure".to_string()));
        }
        Ok(self.response.clone())
    }

    async fn health_check(&self) -> bool {
        !self.fail
    }
}
