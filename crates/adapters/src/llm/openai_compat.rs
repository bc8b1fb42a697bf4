//! OpenAI-compatible chat completions adapter (Groq and similar providers)

use async_trait::async_trait;
use postcraft_domain::{CompletionClient, CompletionFailure, CompletionRequest};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{LlmConfig, SYSTEM_INSTRUCTIONS, non_empty, send_failure, status_failure};

/// Completion client for any `/chat/completions` endpoint
pub struct ChatCompletionClient {
    client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    config: LlmConfig,
}

impl ChatCompletionClient {
    pub fn new(
        api_key: Option<SecretString>,
        base_url: String,
        config: LlmConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionFailure> {
        let api_key = self.api_key.as_ref().ok_or(CompletionFailure::AuthMissing)?;

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTIONS,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_output_tokens),
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.config.model, url = %url, "Requesting chat completion");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(send_failure)?;

        if !response.status().is_success() {
            return Err(status_failure(response).await);
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionFailure::MalformedResponse(e.to_string()))?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        non_empty(text)
    }

    fn provider(&self) -> &'static str {
        "openai_compat"
    }
}
