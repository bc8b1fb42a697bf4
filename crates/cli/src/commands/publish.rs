//! Publish command - simulated publishing, immediate or scheduled

use anyhow::{Context, Result, bail};
use postcraft_adapters::event_log::JsonlEventLog;
use postcraft_domain::usecases::{
    JobScheduler, PublishRequest, PublishResult, PublishSimulator, SchedulerConfig,
};
use postcraft_domain::{Clock, EventLog, JobStatus, PublishMode, SystemClock};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;

use crate::args::PublishArgs;
use crate::commands::refine::read_input_text;
use crate::config::AppConfig;

#[derive(Serialize)]
struct PublishOutput {
    job_id: String,
    mode: PublishMode,
    status: JobStatus,
    dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduled_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    executed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview_url: Option<String>,
    log_path: String,
}

/// Open the JSONL log named by the config
pub(crate) async fn open_event_log(config: &AppConfig) -> Result<Arc<JsonlEventLog>> {
    let log = JsonlEventLog::new(config.general.log_path.clone())
        .await
        .with_context(|| {
            format!(
                "Failed to open publish log: {}",
                config.general.log_path.display()
            )
        })?;
    Ok(Arc::new(log))
}

pub async fn execute(args: PublishArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let payload = read_input_text(&args.input)?;

    let log = open_event_log(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let scheduler = Arc::new(JobScheduler::new(
        log.clone(),
        Arc::clone(&clock),
        SchedulerConfig {
            max_idle: Duration::from_millis(config.scheduler.max_idle_ms),
        },
    ));
    let simulator = PublishSimulator::new(log.clone(), Arc::clone(&scheduler), clock);

    let request = PublishRequest {
        payload,
        mode: args.mode.into(),
        scheduled_at: args.at.clone(),
        dry_run: true,
        attachments: args.attachments.clone(),
    };

    if request.mode == PublishMode::Schedule && !args.no_wait {
        scheduler.start().await;
    }

    let result = simulator.submit(request).await?;

    let result = match result.job.mode {
        PublishMode::Now => result,
        PublishMode::Schedule if args.no_wait => {
            tracing::warn!(
                job_id = %result.job.id,
                "--no-wait: the scheduled job lives only in this process and is lost on exit"
            );
            scheduler.stop().await;
            result
        }
        PublishMode::Schedule => {
            wait_for_job(&scheduler, log.as_ref(), result, args.json).await?
        }
    };

    let output = PublishOutput {
        job_id: result.job.id.to_string(),
        mode: result.job.mode,
        status: result.job.status,
        dry_run: result.job.dry_run,
        scheduled_at: result.job.scheduled_at.and_then(|t| t.format(&Rfc3339).ok()),
        executed_at: result
            .entry
            .as_ref()
            .and_then(|e| e.executed_at.format(&Rfc3339).ok()),
        preview_url: result.preview_url.clone(),
        log_path: config.general.log_path.display().to_string(),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        match output.status {
            JobStatus::Executed => {
                println!("Published (simulated): {}", output.job_id);
                if let Some(url) = &output.preview_url {
                    println!("Preview: {}", url);
                }
            }
            _ => {
                println!(
                    "Scheduled {} for {} (not persisted; lost on exit)",
                    output.job_id,
                    output.scheduled_at.as_deref().unwrap_or("?")
                );
            }
        }
    }

    Ok(())
}

/// Keep the process alive until the scheduled job fires or Ctrl+C arrives
async fn wait_for_job(
    scheduler: &JobScheduler,
    log: &dyn EventLog,
    mut result: PublishResult,
    quiet: bool,
) -> Result<PublishResult> {
    if !quiet {
        println!(
            "Waiting for job {} scheduled at {} (Ctrl+C to abandon)",
            result.job.id,
            result
                .job
                .scheduled_at
                .and_then(|t| t.format(&Rfc3339).ok())
                .unwrap_or_default()
        );
    }

    tokio::select! {
        _ = scheduler.wait_idle() => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            tracing::info!("Shutdown signal received");
            let lost = scheduler.stop().await;
            bail!("Interrupted before the job fired; {} scheduled job(s) lost", lost);
        }
    }
    scheduler.stop().await;

    if let Some(failure) = scheduler
        .failures()
        .into_iter()
        .find(|f| f.job_id == result.job.id)
    {
        bail!("Scheduled job fired but was not recorded: {}", failure.error);
    }

    let entry = log
        .read_all()
        .await
        .context("Failed to read publish log")?
        .into_iter()
        .rev()
        .find(|e| e.job_id == result.job.id)
        .context("Scheduled job fired but its log entry is missing")?;

    result.job.status = entry.status;
    result.preview_url = entry.preview_url.clone();
    result.entry = Some(entry);
    Ok(result)
}
