//! Remote completion adapters

pub mod openai;
pub mod openai_compat;
pub mod stub;

pub use openai::OpenAiCompletionClient;
pub use openai_compat::ChatCompletionClient;
pub use stub::StubCompletionClient;

use postcraft_domain::CompletionFailure;
use serde::{Deserialize, Serialize};

/// System instructions sent with every rewrite request
pub(crate) const SYSTEM_INSTRUCTIONS: &str =
    "You are a social media writing assistant. Rewrite drafts in the author's voice. \
     Output only the post text.";

/// Common LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name/ID
    pub model: String,
    /// Temperature (0.0-1.0)
    pub temperature: f64,
    /// Maximum output tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_output_tokens: 300,
            timeout_secs: 45,
        }
    }
}

/// Map a transport error from reqwest
pub(crate) fn send_failure(error: reqwest::Error) -> CompletionFailure {
    if error.is_timeout() {
        CompletionFailure::Timeout
    } else {
        CompletionFailure::ServiceError(error.to_string())
    }
}

/// Turn a non-success response into a failure, draining the body for context
pub(crate) async fn status_failure(response: reqwest::Response) -> CompletionFailure {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();

    let message = if body.is_empty() {
        format!("API returned {}", status)
    } else {
        format!("API returned {}: {}", status, body)
    };

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        tracing::warn!(status = %status, "Completion endpoint rejected the credential");
        CompletionFailure::AuthRejected(message)
    } else {
        CompletionFailure::ServiceError(message)
    }
}

/// Reject empty completions
pub(crate) fn non_empty(text: String) -> Result<String, CompletionFailure> {
    if text.trim().is_empty() {
        Err(CompletionFailure::MalformedResponse(
            "Empty response".to_string(),
        ))
    } else {
        Ok(text)
    }
}
