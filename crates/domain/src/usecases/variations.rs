//! Variation generation - rule-based permutations plus an optional LLM candidate

use std::sync::Arc;
use std::time::Duration;

use crate::{
    model::{Draft, StyleConfig, Variation, VariationSource},
    normalize_text,
    ports::{CompletionClient, CompletionFailure, CompletionRequest},
    usecases::style::StyleRuleEngine,
    validation::{ValidationError, validate_count, validate_draft_text, validate_style},
};

/// Configuration for the variation generator
#[derive(Debug, Clone)]
pub struct VariationConfig {
    /// Upper bound for a single completion call
    pub llm_timeout: Duration,
    /// Extra attempts after a transient failure
    pub llm_retries: u32,
    /// Base delay between attempts, doubled each time
    pub retry_backoff: Duration,
}

impl Default for VariationConfig {
    fn default() -> Self {
        Self {
            llm_timeout: Duration::from_secs(45),
            llm_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Recoverable problems reported next to the variations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationWarning {
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(CompletionFailure),
    #[error("LLM output duplicated a rule-based variation and was dropped")]
    DuplicateLlmOutput,
}

/// Variations in stable order plus any warnings
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub variations: Vec<Variation>,
    pub warnings: Vec<GenerationWarning>,
}

/// Produces 2 or 3 pairwise-distinct candidates for a draft
pub struct VariationGenerator {
    engine: StyleRuleEngine,
    client: Option<Arc<dyn CompletionClient>>,
    config: VariationConfig,
}

impl VariationGenerator {
    pub fn new(client: Option<Arc<dyn CompletionClient>>, config: VariationConfig) -> Self {
        Self {
            engine: StyleRuleEngine::new(),
            client,
            config,
        }
    }

    /// Generator with no remote client; LLM requests degrade to warnings
    pub fn offline() -> Self {
        Self::new(None, VariationConfig::default())
    }

    /// Generate variations for `draft` under its effective style
    ///
    /// The LLM is consulted once when `count == 3` or `use_llm` is set; its
    /// failure never discards the rule-based results.
    pub async fn generate(
        &self,
        draft: &Draft,
        count: usize,
        use_llm: bool,
    ) -> Result<GenerationOutcome, ValidationError> {
        validate_draft_text(&draft.text)?;
        validate_count(count)?;
        let style = draft.effective_style();
        validate_style(&style)?;

        let mut variations = self.rule_based(&draft.text, style);
        let mut warnings = Vec::new();

        if count == 3 || use_llm {
            match self.llm_variation(&draft.text, style).await {
                Ok(candidate) => {
                    let key = normalize_text(&candidate.text);
                    if variations.iter().any(|v| normalize_text(&v.text) == key) {
                        tracing::warn!("LLM variation duplicated a rule-based one");
                        warnings.push(GenerationWarning::DuplicateLlmOutput);
                    } else {
                        variations.push(candidate);
                    }
                }
                Err(failure) => {
                    tracing::warn!(reason = %failure, "LLM unavailable, returning rule-based variations");
                    warnings.push(GenerationWarning::LlmUnavailable(failure));
                }
            }
        }

        tracing::info!(
            variations = variations.len(),
            warnings = warnings.len(),
            tone = style.tone.as_str(),
            structure = style.structure.as_str(),
            "Generated variations"
        );

        Ok(GenerationOutcome {
            variations,
            warnings,
        })
    }

    /// Two distinct rule-based rewrites: the requested style, then the first differing permutation
    fn rule_based(&self, text: &str, style: StyleConfig) -> Vec<Variation> {
        let primary = self.variation(text, style);
        let primary_key = normalize_text(&primary.text);

        let next = style.structure.next();
        let permutations = [
            style.with_structure(next),
            style.with_structure(next.next()),
            style.with_closing(style.closing.alternate()),
            style
                .with_structure(next)
                .with_closing(style.closing.alternate()),
        ];

        let secondary = permutations
            .into_iter()
            .map(|candidate| self.variation(text, candidate))
            .find(|v| normalize_text(&v.text) != primary_key)
            .unwrap_or_else(|| {
                tracing::debug!("All permutations collapsed, using labelled fallback");
                Variation {
                    text: self
                        .engine
                        .truncate(&format!("Take two: {}", primary.text), style.max_length),
                    style,
                    source: VariationSource::RuleBased,
                }
            });

        vec![primary, secondary]
    }

    fn variation(&self, text: &str, style: StyleConfig) -> Variation {
        self.engine.apply(&Draft::with_style(text, style))
    }

    async fn llm_variation(
        &self,
        text: &str,
        style: StyleConfig,
    ) -> Result<Variation, CompletionFailure> {
        let client = self.client.as_ref().ok_or(CompletionFailure::AuthMissing)?;
        let request = CompletionRequest {
            prompt: build_refine_prompt(text, style),
            constraints: style,
        };

        let raw = self.complete_with_retries(client.as_ref(), &request).await?;
        let cleaned = clean_completion(&raw);
        if cleaned.is_empty() {
            return Err(CompletionFailure::MalformedResponse(
                "empty completion".to_string(),
            ));
        }

        Ok(Variation {
            text: self.engine.truncate(&cleaned, style.max_length),
            style,
            source: VariationSource::Llm,
        })
    }

    async fn complete_with_retries(
        &self,
        client: &dyn CompletionClient,
        request: &CompletionRequest,
    ) -> Result<String, CompletionFailure> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = self.config.retry_backoff * 2_u32.saturating_pow(attempt - 1);
                tracing::warn!(attempt = attempt, provider = client.provider(), "Retrying completion");
                tokio::time::sleep(delay).await;
            }

            let result = match tokio::time::timeout(self.config.llm_timeout, client.complete(request))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(CompletionFailure::Timeout),
            };

            match result {
                Err(failure) if failure.is_transient() && attempt < self.config.llm_retries => {
                    tracing::debug!(error = %failure, "Transient completion failure");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Build the instruction sent to the remote model
pub fn build_refine_prompt(text: &str, style: StyleConfig) -> String {
    let structure = match style.structure {
        crate::model::Structure::Narrative => "a single flowing paragraph",
        crate::model::Structure::Bulleted => "one bullet point per idea, each starting with \"• \"",
        crate::model::Structure::QuestionLed => "open with a short question hook, then the story",
    };
    let closing = match style.closing {
        crate::model::Closing::Cta => "end with a call to action inviting comments",
        crate::model::Closing::Reflective => "end with a short reflective line",
        crate::model::Closing::None => "do not add a closing line or call to action",
    };

    format!(
        "Rewrite the following social media draft in my personal voice.\n\n\
         ## Constraints\n\
         - Tone: {}\n\
         - Structure: {}\n\
         - Closing: {}\n\
         - Maximum length: {} characters\n\
         - Keep every fact from the draft; do not invent new ones\n\n\
         ## Draft\n{}\n\n\
         Respond with ONLY the rewritten post text.",
        style.tone.as_str(),
        structure,
        closing,
        style.max_length,
        text.trim()
    )
}

/// Strip code fences and wrapping quotes models like to add
pub fn clean_completion(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
        text = rest.strip_suffix("```").unwrap_or(rest).trim();
    }

    for (open, close) in [('"', '"'), ('“', '”')] {
        if text.len() > 1 && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
        }
    }

    text.to_string()
}
