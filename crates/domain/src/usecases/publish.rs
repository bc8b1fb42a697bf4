//! Simulated publishing: validate, then log immediately or hand off to the scheduler

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    model::{JobStatus, LogEntry, PublishJob, PublishMode},
    ports::{Clock, EventLog, LogError},
    usecases::scheduler::JobScheduler,
    validation::{ValidationError, parse_schedule, validate_draft_text},
};

/// A publish request as received from a caller
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub payload: String,
    pub mode: PublishMode,
    /// RFC 3339 timestamp, required for `Schedule` and forbidden for `Now`
    pub scheduled_at: Option<String>,
    pub dry_run: bool,
    pub attachments: Vec<String>,
}

impl PublishRequest {
    pub fn now(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            mode: PublishMode::Now,
            scheduled_at: None,
            dry_run: true,
            attachments: Vec::new(),
        }
    }

    pub fn schedule(payload: impl Into<String>, at: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            mode: PublishMode::Schedule,
            scheduled_at: Some(at.into()),
            dry_run: true,
            attachments: Vec::new(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// What the caller gets back from `submit`
#[derive(Debug, Clone)]
pub struct PublishResult {
    pub job: PublishJob,
    /// Set for `Now` jobs; scheduled jobs get theirs when they fire
    pub preview_url: Option<String>,
    /// The log entry written, for `Now` jobs
    pub entry: Option<LogEntry>,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to record publish: {0}")]
    Persistence(#[from] LogError),
}

pub struct PublishSimulator {
    log: Arc<dyn EventLog>,
    scheduler: Arc<JobScheduler>,
    clock: Arc<dyn Clock>,
}

impl PublishSimulator {
    pub fn new(log: Arc<dyn EventLog>, scheduler: Arc<JobScheduler>, clock: Arc<dyn Clock>) -> Self {
        Self {
            log,
            scheduler,
            clock,
        }
    }

    pub fn scheduler(&self) -> &Arc<JobScheduler> {
        &self.scheduler
    }

    /// Validate and accept a publish request
    ///
    /// `Now` jobs are logged before this returns; a failed append is returned
    /// to the caller. `Schedule` jobs are queued and logged when they fire.
    pub async fn submit(&self, request: PublishRequest) -> Result<PublishResult, PublishError> {
        if !request.dry_run {
            return Err(ValidationError::RealPostingUnsupported.into());
        }
        validate_draft_text(&request.payload)?;

        let now = self.clock.now();
        let scheduled_at = match (request.mode, request.scheduled_at.as_deref()) {
            (PublishMode::Now, None) => None,
            (PublishMode::Now, Some(_)) => {
                return Err(ValidationError::InvalidSchedule(
                    "scheduled_at is only valid with mode 'schedule'".to_string(),
                )
                .into());
            }
            (PublishMode::Schedule, None) => {
                return Err(ValidationError::InvalidSchedule(
                    "mode 'schedule' requires scheduled_at".to_string(),
                )
                .into());
            }
            (PublishMode::Schedule, Some(raw)) => Some(parse_schedule(raw, now)?),
        };

        let mut job = PublishJob {
            id: Uuid::new_v4(),
            payload: request.payload,
            attachments: request.attachments,
            mode: request.mode,
            scheduled_at,
            dry_run: true,
            status: JobStatus::Created,
            created_at: now,
        };

        match job.mode {
            PublishMode::Now => {
                let entry = LogEntry::executed(&job, self.clock.now());
                self.log.append(&entry).await?;
                job.status = JobStatus::Executed;

                tracing::info!(
                    job_id = %job.id,
                    preview_url = ?entry.preview_url,
                    "Publish simulated"
                );

                Ok(PublishResult {
                    preview_url: entry.preview_url.clone(),
                    entry: Some(entry),
                    job,
                })
            }
            PublishMode::Schedule => {
                job.status = JobStatus::Scheduled;
                self.scheduler.schedule(job.clone());

                Ok(PublishResult {
                    job,
                    preview_url: None,
                    entry: None,
                })
            }
        }
    }
}
