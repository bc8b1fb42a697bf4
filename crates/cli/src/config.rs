//! Configuration loading and management

use anyhow::{Context, Result};
use postcraft_domain::validation::StyleOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "./postcraft.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub style: StyleSettings,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub scheduler: SchedulerSettings,

    #[serde(default)]
    pub analyze: AnalyzeSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Style defaults; validated when a command resolves them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSettings {
    #[serde(default = "default_tone")]
    pub tone: String,

    #[serde(default = "default_structure")]
    pub structure: String,

    #[serde(default = "default_closing")]
    pub closing: String,

    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub retries: u32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub openai_compat: OpenAiCompatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiCompatConfig {
    #[serde(default = "default_compat_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_compat_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_max_idle_ms")]
    pub max_idle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeSettings {
    #[serde(default = "default_window")]
    pub window: usize,
}

// Default value functions
fn default_log_path() -> PathBuf {
    PathBuf::from("./postcraft-log.jsonl")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tone() -> String {
    "professional".to_string()
}

fn default_structure() -> String {
    "narrative".to_string()
}

fn default_closing() -> String {
    "cta".to_string()
}

fn default_max_length() -> usize {
    280
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_timeout() -> u64 {
    45
}

fn default_max_output_tokens() -> u32 {
    300
}

fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_compat_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_compat_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_max_idle_ms() -> u64 {
    1000
}

fn default_window() -> usize {
    10
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            log_level: default_log_level(),
        }
    }
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            tone: default_tone(),
            structure: default_structure(),
            closing: default_closing(),
            max_length: default_max_length(),
        }
    }
}

impl StyleSettings {
    pub fn to_options(&self) -> StyleOptions {
        StyleOptions {
            tone: Some(self.tone.clone()),
            structure: Some(self.structure.clone()),
            closing: Some(self.closing.clone()),
            max_length: Some(self.max_length),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            retries: 0,
            max_output_tokens: default_max_output_tokens(),
            openai: OpenAiConfig::default(),
            openai_compat: OpenAiCompatConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_api_key_env(),
            base_url: default_openai_base_url(),
        }
    }
}

impl Default for OpenAiCompatConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_compat_api_key_env(),
            base_url: default_compat_base_url(),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            max_idle_ms: default_max_idle_ms(),
        }
    }
}

impl Default for AnalyzeSettings {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("POSTCRAFT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# postcraft configuration

[general]
# Append-only publish history, one JSON object per line
log_path = "./postcraft-log.jsonl"
log_level = "info"

[style]
tone = "professional"      # professional, casual, bold, friendly
structure = "narrative"    # narrative, bulleted, question-led
closing = "cta"            # cta, reflective, none
max_length = 280

[llm]
provider = "openai"  # openai, openai_compat, stub, none
model = "gpt-4o-mini"
temperature = 0.2
timeout_secs = 45
# Extra attempts after a timeout or service error
retries = 0
max_output_tokens = 300

[llm.openai]
api_key_env = "OPENAI_API_KEY"
base_url = "https://api.openai.com/v1"

[llm.openai_compat]
api_key_env = "GROQ_API_KEY"
base_url = "https://api.groq.com/openai/v1"

[scheduler]
# Longest the scheduler sleeps before re-reading the clock
max_idle_ms = 1000

[analyze]
window = 10
"#
        .to_string()
    }
}
