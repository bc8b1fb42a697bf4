//! OpenAI Responses API adapter

use async_trait::async_trait;
use postcraft_domain::{CompletionClient, CompletionFailure, CompletionRequest};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{LlmConfig, SYSTEM_INSTRUCTIONS, non_empty, send_failure, status_failure};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Completion client using the Responses API
pub struct OpenAiCompletionClient {
    client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    config: LlmConfig,
}

impl OpenAiCompletionClient {
    pub fn new(api_key: Option<SecretString>, config: LlmConfig) -> Result<Self, reqwest::Error> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), config)
    }

    pub fn with_base_url(
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
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ResponsesResponse {
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    r#type: String,
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Deserialize)]
struct ContentItem {
    r#type: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionFailure> {
        let api_key = self.api_key.as_ref().ok_or(CompletionFailure::AuthMissing)?;

        let body = ResponsesRequest {
            model: &self.config.model,
            input: &request.prompt,
            instructions: Some(SYSTEM_INSTRUCTIONS),
            temperature: Some(self.config.temperature),
            max_output_tokens: Some(self.config.max_output_tokens),
        };

        let url = format!("{}/responses", self.base_url);
        tracing::debug!(model = %self.config.model, "Requesting completion");

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

        let api_response: ResponsesResponse = response
            .json()
            .await
            .map_err(|e| CompletionFailure::MalformedResponse(e.to_string()))?;

        let text = api_response
            .output
            .into_iter()
            .filter(|item| item.r#type == "message")
            .flat_map(|item| item.content)
            .filter(|c| c.r#type == "output_text")
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        non_empty(text)
    }

    fn provider(&self) -> &'static str {
        "openai"
    }
}
