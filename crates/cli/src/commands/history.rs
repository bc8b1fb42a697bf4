//! History command - list recent publish log entries

use anyhow::{Context, Result};
use postcraft_domain::{EventLog, LogEntry};
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;

use crate::args::HistoryArgs;
use crate::commands::publish::open_event_log;
use crate::config::AppConfig;

const PREVIEW_CHARS: usize = 60;

pub async fn execute(args: HistoryArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let log = open_event_log(&config).await?;

    let entries: Vec<LogEntry> = log
        .read_all()
        .await
        .context("Failed to read publish log")?
        .into_iter()
        .rev()
        .take(args.last)
        .collect();

    if args.json {
        let json = serde_json::to_string_pretty(&entries).context("Failed to serialize entries")?;
        println!("{}", json);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No entries in {}", config.general.log_path.display());
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{}  {}  {:<8}  {}",
            entry
                .executed_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| entry.executed_at.to_string()),
            entry.job_id,
            entry.mode.to_string(),
            entry.preview_url.as_deref().unwrap_or("-")
        );
        if let Some(payload) = &entry.payload {
            println!("    {}", preview(payload));
        }
    }

    Ok(())
}

/// First line of the payload, shortened for listing
fn preview(payload: &str) -> String {
    let first_line = payload.lines().next().unwrap_or_default();
    if first_line.chars().count() > PREVIEW_CHARS {
        let cut: String = first_line.chars().take(PREVIEW_CHARS - 1).collect();
        format!("{}…", cut)
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_shortens_long_first_line() {
        let long = "a".repeat(100);
        let shown = preview(&format!("{}\nsecond", long));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS);
        assert!(shown.ends_with('…'));
        assert_eq!(preview("short\nsecond"), "short");
    }
}
