//! Context-grounded answer synthesis over an OpenRouter-compatible chat API.
//!
//! The synthesizer never raises on provider trouble: every failure comes back
//! as a [`SynthesisError`] value carrying the provider status and an
//! interpreted message. Raw provider bodies only ever reach diagnostic logs,
//! and the API credential appears in no error, log line, or prompt.

use thiserror::Error;

mod client;
mod prompt;

pub use client::{ChatClient, ChatMessage, OPENROUTER_BASE_URL};
pub use prompt::{build_prompt, SYSTEM_PROMPT};

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("chat provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("chat request timed out after {0} seconds")]
    Timeout(u64),

    #[error("chat transport failed: {0}")]
    Transport(String),

    #[error("chat provider returned no content")]
    EmptyResponse,
}

impl From<SynthesisError> for passage_core::error::Error {
    fn from(e: SynthesisError) -> Self {
        let status = match &e {
            SynthesisError::Provider { status, .. } => status.to_string(),
            SynthesisError::Timeout(_) => "timeout".to_string(),
            SynthesisError::Transport(_) => "transport".to_string(),
            SynthesisError::EmptyResponse => "empty".to_string(),
        };
        passage_core::error::Error::Synthesis { status, message: e.to_string() }
    }
}

/// Builds the grounded prompt for a query and delegates generation to the
/// external chat service, one bounded-timeout request per call.
pub struct Synthesizer {
    client: ChatClient,
}

impl Synthesizer {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// `retrieved` must already be in ranked order; it is concatenated as-is.
    pub async fn synthesize(
        &self,
        query: &str,
        retrieved: &[String],
        model: &str,
        api_key: &str,
    ) -> Result<String, SynthesisError> {
        let messages = vec![
            ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
            ChatMessage { role: "user", content: build_prompt(query, retrieved) },
        ];
        self.client.chat(model, &messages, api_key).await
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }
}
