use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::SynthesisError;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Thin client for an OpenRouter-compatible API: one blocking-style request
/// with a bounded timeout per call, no retries.
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build chat HTTP client")?;
        Ok(Self { http, base_url: base_url.into(), timeout_secs })
    }

    pub fn openrouter(timeout_secs: u64) -> anyhow::Result<Self> {
        Self::new(OPENROUTER_BASE_URL, timeout_secs)
    }

    fn auth_headers(api_key: &str) -> Result<HeaderMap, SynthesisError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| SynthesisError::Transport("API key is not a valid header value".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn transport_error(&self, e: reqwest::Error) -> SynthesisError {
        if e.is_timeout() {
            return SynthesisError::Timeout(self.timeout_secs);
        }
        // reqwest's Display contains URLs at most, never headers
        SynthesisError::Transport(e.without_url().to_string())
    }

    /// Single chat-completion round trip. Provider rejections come back as
    /// `Provider { status, message }`; the raw body goes to debug logs only.
    pub async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        api_key: &str,
    ) -> Result<String, SynthesisError> {
        let body = ChatRequest { model, messages };
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .headers(Self::auth_headers(api_key)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|_| "<body unavailable>".to_string());
            tracing::debug!(status = status.as_u16(), %body, "chat provider rejected request");
            return Err(SynthesisError::Provider {
                status: status.as_u16(),
                message: interpret_error_body(&body),
            });
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| SynthesisError::Transport(format!("malformed provider response: {}", e.without_url())))?;
        let answer = parsed
            .choices
            .into_iter()
            .map(|choice| choice.message.content)
            .next()
            .unwrap_or_default();
        if answer.is_empty() {
            return Err(SynthesisError::EmptyResponse);
        }
        Ok(answer)
    }

    /// Fetch the provider's model catalog (ids only).
    pub async fn list_models(&self, api_key: &str) -> Result<Vec<String>, SynthesisError> {
        let resp = self
            .http
            .get(format!("{}/models", self.base_url))
            .headers(Self::auth_headers(api_key)?)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|_| "<body unavailable>".to_string());
            tracing::debug!(status = status.as_u16(), %body, "model listing rejected");
            return Err(SynthesisError::Provider {
                status: status.as_u16(),
                message: interpret_error_body(&body),
            });
        }
        let parsed: ModelsResponse = resp
            .json()
            .await
            .map_err(|e| SynthesisError::Transport(format!("malformed model list: {}", e.without_url())))?;
        Ok(parsed.data.into_iter().map(|m| m.id).collect())
    }
}

/// Pull the short human message out of a provider error body; the full body
/// is never forwarded to callers.
fn interpret_error_body(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ => "provider rejected the request".to_string(),
    }
}
