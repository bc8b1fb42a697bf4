//! Analyze command - synthetic engagement report with optional exports

use anyhow::{Context, Result};
use postcraft_domain::usecases::EngagementAnalyzer;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

use crate::args::AnalyzeArgs;
use crate::commands::ensure_parent_dir;
use crate::commands::publish::open_event_log;
use crate::config::AppConfig;

pub async fn execute(args: AnalyzeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let window = args.last.unwrap_or(config.analyze.window);

    let analyzer = EngagementAnalyzer::new(open_event_log(&config).await?);
    let report = analyzer.analyze(window).await?;

    tracing::info!(
        window = window,
        entries = report.stats.len(),
        likes = report.totals.likes,
        "Engagement report ready"
    );

    if args.csv.is_some() || args.pdf.is_some() {
        let export = analyzer.export(&report);
        if let Some(path) = &args.csv {
            write_export(path, &export.csv)?;
        }
        if let Some(path) = &args.pdf {
            write_export(path, &export.pdf)?;
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
        return Ok(());
    }

    println!("Engagement Report (last {} entries)", window);
    println!("==================================");
    println!();

    if report.stats.is_empty() {
        println!("No published jobs in the log yet.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<20}  {:>5}  {:>8}  {:>6}",
        "Job", "Executed", "Likes", "Comments", "Shares"
    );
    for stat in &report.stats {
        println!(
            "{:<36}  {:<20}  {:>5}  {:>8}  {:>6}",
            stat.job_id,
            stat.executed_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| stat.executed_at.to_string()),
            stat.likes,
            stat.comments,
            stat.shares
        );
    }
    println!();
    println!(
        "Totals:   likes {}, comments {}, shares {}",
        report.totals.likes, report.totals.comments, report.totals.shares
    );
    println!(
        "Averages: likes {:.2}, comments {:.2}, shares {:.2}",
        report.averages.likes, report.averages.comments, report.averages.shares
    );

    Ok(())
}

fn write_export(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "Export written");
    Ok(())
}
