//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use postcraft_domain::PublishMode;
use std::path::PathBuf;

/// postcraft: refine social posts into your voice, simulate publishing, review engagement
#[derive(Parser, Debug)]
#[command(name = "postcraft")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite a draft into 2 or 3 candidate variations
    Refine(RefineArgs),

    /// Simulate publishing a post, now or at a scheduled time
    Publish(PublishArgs),

    /// Report synthetic engagement over recent publishes
    Analyze(AnalyzeArgs),

    /// List recent entries from the publish log
    History(HistoryArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

/// Draft text from a flag, a file, or stdin
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Draft text
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// File containing the draft (use - for stdin)
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RefineArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Tone: professional, casual, bold, friendly
    #[arg(long)]
    pub tone: Option<String>,

    /// Structure: narrative, bulleted, question-led
    #[arg(long)]
    pub structure: Option<String>,

    /// Closing: cta, reflective, none
    #[arg(long)]
    pub closing: Option<String>,

    /// Maximum length in characters
    #[arg(long)]
    pub max_length: Option<usize>,

    /// Number of variations (2 or 3)
    #[arg(long, default_value_t = 2)]
    pub count: usize,

    /// Also ask the configured LLM provider for a candidate
    #[arg(long)]
    pub llm: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Now,
    Schedule,
}

impl From<ModeArg> for PublishMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Now => PublishMode::Now,
            ModeArg::Schedule => PublishMode::Schedule,
        }
    }
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Publish immediately or at --at
    #[arg(long, value_enum, default_value_t = ModeArg::Now)]
    pub mode: ModeArg,

    /// RFC 3339 timestamp with offset, e.g. 2025-01-31T14:30:00Z
    #[arg(long)]
    pub at: Option<String>,

    /// Opaque attachment reference (repeatable)
    #[arg(long = "attachment")]
    pub attachments: Vec<String>,

    /// Return right after scheduling; the job is lost when the process exits
    #[arg(long)]
    pub no_wait: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Number of most recent entries to report on
    #[arg(long)]
    pub last: Option<usize>,

    /// Write a CSV export to this path
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write a PDF export to this path
    #[arg(long)]
    pub pdf: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Number of most recent entries to list
    #[arg(long, default_value_t = 10)]
    pub last: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./postcraft.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
