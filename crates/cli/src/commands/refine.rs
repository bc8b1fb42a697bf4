//! Refine command - turn a draft into candidate variations

use anyhow::{Context, Result, bail};
use postcraft_adapters::llm::{
    ChatCompletionClient, LlmConfig as AdapterLlmConfig, OpenAiCompletionClient,
    StubCompletionClient,
};
use postcraft_domain::usecases::{VariationConfig, VariationGenerator};
use postcraft_domain::validation::StyleOptions;
use postcraft_domain::{CompletionClient, Draft, StyleConfig, Variation};
use secrecy::SecretString;
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::args::{InputArgs, RefineArgs};
use crate::config::AppConfig;

#[derive(Serialize)]
struct RefineOutput<'a> {
    variations: &'a [Variation],
    warnings: Vec<String>,
}

pub async fn execute(args: RefineArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let text = read_input_text(&args.input)?;

    let base = config
        .style
        .to_options()
        .resolve(StyleConfig::default())
        .context("Invalid [style] configuration")?;
    let style = StyleOptions {
        tone: args.tone.clone(),
        structure: args.structure.clone(),
        closing: args.closing.clone(),
        max_length: args.max_length,
    }
    .resolve(base)?;

    let client = if args.llm || args.count == 3 {
        build_completion_client(&config)?
    } else {
        None
    };

    tracing::info!(
        tone = style.tone.as_str(),
        structure = style.structure.as_str(),
        closing = style.closing.as_str(),
        max_length = style.max_length,
        count = args.count,
        llm = args.llm,
        provider = client.as_ref().map(|c| c.provider()).unwrap_or("none"),
        "Refining draft"
    );

    let generator = VariationGenerator::new(client, variation_config(&config));
    let outcome = generator
        .generate(&Draft::with_style(text, style), args.count, args.llm)
        .await?;

    let warnings: Vec<String> = outcome.warnings.iter().map(|w| w.to_string()).collect();
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Refinement degraded");
    }

    if args.json {
        let output = RefineOutput {
            variations: &outcome.variations,
            warnings,
        };
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        for (index, variation) in outcome.variations.iter().enumerate() {
            println!(
                "Variation {} ({}; {}, {}, {}):",
                index + 1,
                variation.source,
                variation.style.tone.as_str(),
                variation.style.structure.as_str(),
                variation.style.closing.as_str()
            );
            println!("{}", variation.text);
            println!();
        }
        for warning in &warnings {
            println!("Warning: {}", warning);
        }
    }

    Ok(())
}

fn variation_config(config: &AppConfig) -> VariationConfig {
    VariationConfig {
        llm_timeout: Duration::from_secs(config.llm.timeout_secs),
        llm_retries: config.llm.retries,
        ..Default::default()
    }
}

/// Build the configured completion client; `none` disables remote calls
pub(crate) fn build_completion_client(
    config: &AppConfig,
) -> Result<Option<Arc<dyn CompletionClient>>> {
    let llm_config = adapter_llm_config(&config.llm);

    match config.llm.provider.as_str() {
        "openai" => {
            let api_key = load_api_key(&config.llm.openai.api_key_env);
            let client = OpenAiCompletionClient::with_base_url(
                api_key,
                config.llm.openai.base_url.clone(),
                llm_config,
            )
            .context("Failed to build OpenAI client")?;
            Ok(Some(Arc::new(client)))
        }
        "openai_compat" => {
            let base_url = config.llm.openai_compat.base_url.trim();
            if base_url.is_empty() {
                bail!("OpenAI-compatible base_url is required");
            }
            let api_key = load_api_key(&config.llm.openai_compat.api_key_env);
            let client = ChatCompletionClient::new(api_key, base_url.to_string(), llm_config)
                .context("Failed to build OpenAI-compatible client")?;
            Ok(Some(Arc::new(client)))
        }
        "stub" => Ok(Some(Arc::new(StubCompletionClient::echo()))),
        "none" => Ok(None),
        other => bail!("Unknown LLM provider: {}", other),
    }
}

fn adapter_llm_config(config: &crate::config::LlmConfig) -> AdapterLlmConfig {
    AdapterLlmConfig {
        model: config.model.clone(),
        temperature: config.temperature,
        max_output_tokens: config.max_output_tokens,
        timeout_secs: config.timeout_secs,
    }
}

/// Read a key from the named env var; a missing key surfaces later as `AuthMissing`
pub(crate) fn load_api_key(env_var: &str) -> Option<SecretString> {
    if env_var.trim().is_empty() {
        return None;
    }

    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Some(SecretString::new(key.trim().into())),
        _ => {
            tracing::debug!(env_var = env_var, "API key env var not set");
            None
        }
    }
}

pub(crate) fn read_input_text(input: &InputArgs) -> Result<String> {
    if let Some(ref text) = input.text {
        return Ok(text.clone());
    }

    if let Some(ref path) = input.file {
        if path.as_os_str() == "-" {
            return read_stdin();
        }

        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()));
    }

    // Default to stdin if no input specified
    read_stdin()
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read from stdin")?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_provider_builds_no_client() {
        let mut config = AppConfig::default();
        config.llm.provider = "none".to_string();
        assert!(build_completion_client(&config).unwrap().is_none());
    }

    #[test]
    fn stub_provider_builds_offline_client() {
        let mut config = AppConfig::default();
        config.llm.provider = "stub".to_string();
        let client = build_completion_client(&config).unwrap().unwrap();
        assert_eq!(client.provider(), "stub");
    }

    #[test]
    fn openai_without_key_still_builds() {
        let mut config = AppConfig::default();
        config.llm.openai.api_key_env = "POSTCRAFT_TEST_KEY_THAT_IS_NOT_SET".to_string();
        let client = build_completion_client(&config).unwrap().unwrap();
        assert_eq!(client.provider(), "openai");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let mut config = AppConfig::default();
        config.llm.provider = "carrier-pigeon".to_string();
        let err = build_completion_client(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown LLM provider"));
    }

    #[test]
    fn compat_requires_base_url() {
        let mut config = AppConfig::default();
        config.llm.provider = "openai_compat".to_string();
        config.llm.openai_compat.base_url = "  ".to_string();
        assert!(build_completion_client(&config).is_err());
    }
}
