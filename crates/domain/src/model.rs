//! Domain models and value objects

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Voice applied during lexical substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Bold,
    Friendly,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Bold => "bold",
            Tone::Friendly => "friendly",
        }
    }
}

/// How the draft is segmented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Structure {
    /// Single flowing paragraph
    #[default]
    Narrative,
    /// One bullet per sentence
    Bulleted,
    /// Opens with a question hook, then the narrative
    QuestionLed,
}

impl Structure {
    pub const ALL: [Structure; 3] = [
        Structure::Narrative,
        Structure::Bulleted,
        Structure::QuestionLed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Structure::Narrative => "narrative",
            Structure::Bulleted => "bulleted",
            Structure::QuestionLed => "question-led",
        }
    }

    /// Next structure in the narrative -> bulleted -> question-led cycle
    pub fn next(self) -> Self {
        match self {
            Structure::Narrative => Structure::Bulleted,
            Structure::Bulleted => Structure::QuestionLed,
            Structure::QuestionLed => Structure::Narrative,
        }
    }
}

/// Closing line appended after the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Closing {
    /// Call to action
    #[default]
    Cta,
    Reflective,
    None,
}

impl Closing {
    pub fn as_str(self) -> &'static str {
        match self {
            Closing::Cta => "cta",
            Closing::Reflective => "reflective",
            Closing::None => "none",
        }
    }

    /// Closing used when a variation has to differ only by its ending
    pub fn alternate(self) -> Self {
        match self {
            Closing::Cta => Closing::Reflective,
            Closing::Reflective => Closing::Cta,
            Closing::None => Closing::Reflective,
        }
    }
}

/// Style preferences for a refinement request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleConfig {
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub structure: Structure,
    #[serde(default)]
    pub closing: Closing,
    #[serde(default = "StyleConfig::default_max_length")]
    pub max_length: usize,
}

impl StyleConfig {
    pub const DEFAULT_MAX_LENGTH: usize = 280;
    /// Smallest limit that still leaves room for a sentence
    pub const MIN_MAX_LENGTH: usize = 20;

    fn default_max_length() -> usize {
        Self::DEFAULT_MAX_LENGTH
    }

    pub fn with_structure(self, structure: Structure) -> Self {
        Self { structure, ..self }
    }

    pub fn with_closing(self, closing: Closing) -> Self {
        Self { closing, ..self }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            tone: Tone::default(),
            structure: Structure::default(),
            closing: Closing::default(),
            max_length: Self::DEFAULT_MAX_LENGTH,
        }
    }
}

/// Raw user text awaiting refinement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub style: Option<StyleConfig>,
}

impl Draft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    pub fn with_style(text: impl Into<String>, style: StyleConfig) -> Self {
        Self {
            text: text.into(),
            style: Some(style),
        }
    }

    /// Style in effect, falling back to defaults
    pub fn effective_style(&self) -> StyleConfig {
        self.style.unwrap_or_default()
    }
}

/// Where a variation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariationSource {
    RuleBased,
    Llm,
}

impl std::fmt::Display for VariationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariationSource::RuleBased => f.write_str("rule-based"),
            VariationSource::Llm => f.write_str("llm"),
        }
    }
}

/// One candidate rewrite of a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub text: String,
    pub style: StyleConfig,
    pub source: VariationSource,
}

/// Publishing mode for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublishMode {
    #[default]
    Now,
    Schedule,
}

impl std::fmt::Display for PublishMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishMode::Now => f.write_str("now"),
            PublishMode::Schedule => f.write_str("schedule"),
        }
    }
}

/// Lifecycle of a publish job: `Created -> {Executed | Scheduled} -> Executed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    Scheduled,
    Executed,
}

/// A simulated publish request after validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishJob {
    pub id: Uuid,
    pub payload: String,
    /// Opaque references, passed through untouched
    #[serde(default)]
    pub attachments: Vec<String>,
    pub mode: PublishMode,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub scheduled_at: Option<OffsetDateTime>,
    pub dry_run: bool,
    pub status: JobStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// One line of the event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Record schema version
    #[serde(default = "LogEntry::default_version")]
    pub v: u32,
    pub job_id: Uuid,
    pub mode: PublishMode,
    pub dry_run: bool,
    pub status: JobStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub executed_at: OffsetDateTime,
    #[serde(default)]
    pub preview_url: Option<String>,
    pub payload_digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

impl LogEntry {
    pub const SCHEMA_VERSION: u32 = 1;

    fn default_version() -> u32 {
        Self::SCHEMA_VERSION
    }

    /// Build the terminal record for an executed job
    pub fn executed(job: &PublishJob, executed_at: OffsetDateTime) -> Self {
        Self {
            v: Self::SCHEMA_VERSION,
            job_id: job.id,
            mode: job.mode,
            dry_run: job.dry_run,
            status: JobStatus::Executed,
            created_at: job.created_at,
            scheduled_at: job.scheduled_at,
            executed_at,
            preview_url: Some(crate::preview_url(&job.id)),
            payload_digest: crate::payload_digest(&job.payload),
            payload: Some(job.payload.clone()),
            attachments: job.attachments.clone(),
        }
    }
}

/// Synthetic engagement for one logged job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementStat {
    pub job_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub executed_at: OffsetDateTime,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

/// Per-metric sums across a report window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngagementTotals {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

/// Per-metric means across a report window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngagementAverages {
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
}

/// Aggregated engagement over the most recent log entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementReport {
    /// Window size that was requested
    pub requested: usize,
    /// Most recent first
    pub stats: Vec<EngagementStat>,
    pub totals: EngagementTotals,
    pub averages: EngagementAverages,
}
