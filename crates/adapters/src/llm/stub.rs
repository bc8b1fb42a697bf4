//! Stub completion client for testing and offline mode

use async_trait::async_trait;
use postcraft_domain::{CompletionClient, CompletionFailure, CompletionRequest};

enum StubMode {
    Fixed(String),
    Echo,
    Fail(CompletionFailure),
}

/// Completion client that never leaves the process
pub struct StubCompletionClient {
    mode: StubMode,
}

impl StubCompletionClient {
    /// Always return `text`
    pub fn with_response(text: impl Into<String>) -> Self {
        Self {
            mode: StubMode::Fixed(text.into()),
        }
    }

    /// Always fail with `failure`
    pub fn with_failure(failure: CompletionFailure) -> Self {
        Self {
            mode: StubMode::Fail(failure),
        }
    }

    /// Return the draft from the prompt with a tone-specific lead-in
    pub fn echo() -> Self {
        Self {
            mode: StubMode::Echo,
        }
    }
}

impl Default for StubCompletionClient {
    fn default() -> Self {
        Self::echo()
    }
}

/// Pull the draft back out of a refine prompt, or use the prompt as-is
fn extract_draft(prompt: &str) -> &str {
    prompt
        .split_once("## Draft\n")
        .map(|(_, rest)| rest.split_once("\n\n").map(|(draft, _)| draft).unwrap_or(rest))
        .unwrap_or(prompt)
        .trim()
}

#[async_trait]
impl CompletionClient for StubCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionFailure> {
        match &self.mode {
            StubMode::Fixed(text) => Ok(text.clone()),
            StubMode::Fail(failure) => Err(failure.clone()),
            StubMode::Echo => {
                let lead = match request.constraints.tone {
                    postcraft_domain::Tone::Professional => "An update worth sharing:",
                    postcraft_domain::Tone::Casual => "Quick one:",
                    postcraft_domain::Tone::Bold => "Big news:",
                    postcraft_domain::Tone::Friendly => "Hi friends!",
                };
                Ok(format!("{} {}", lead, extract_draft(&request.prompt)))
            }
        }
    }

    fn provider(&self) -> &'static str {
        "stub"
    }
}
