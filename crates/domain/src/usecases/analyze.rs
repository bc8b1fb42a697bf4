//! Synthetic engagement analytics over the event log

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::{
    model::{EngagementAverages, EngagementReport, EngagementStat, EngagementTotals, LogEntry},
    ports::{EventLog, LogError},
    usecases::render::{render_csv, render_pdf},
    validation::ValidationError,
};

/// Exclusive upper bounds for the synthetic metrics
pub const LIKES_RANGE: u64 = 500;
pub const COMMENTS_RANGE: u64 = 80;
pub const SHARES_RANGE: u64 = 40;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to read publish log: {0}")]
    Log(#[from] LogError),
}

/// Rendered report files
#[derive(Debug, Clone)]
pub struct ReportExport {
    pub csv: Vec<u8>,
    pub pdf: Vec<u8>,
}

/// Derive the engagement numbers for one entry
///
/// Seeded by job id and execution time only, so re-reading an unchanged log
/// always yields the same numbers.
pub fn engagement_for(entry: &LogEntry) -> EngagementStat {
    let mut hasher = Sha256::new();
    hasher.update(entry.job_id.as_bytes());
    hasher.update(entry.executed_at.unix_timestamp_nanos().to_be_bytes());
    let digest = hasher.finalize();

    EngagementStat {
        job_id: entry.job_id,
        executed_at: entry.executed_at,
        likes: read_u64(&digest[0..8]) % LIKES_RANGE,
        comments: read_u64(&digest[8..16]) % COMMENTS_RANGE,
        shares: read_u64(&digest[16..24]) % SHARES_RANGE,
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

pub struct EngagementAnalyzer {
    log: Arc<dyn EventLog>,
}

impl EngagementAnalyzer {
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self { log }
    }

    /// Report over the `window` most recent entries, most recent first
    ///
    /// A log shorter than the window reports over what exists.
    pub async fn analyze(&self, window: usize) -> Result<EngagementReport, AnalyzeError> {
        if window == 0 {
            return Err(ValidationError::EmptyWindow.into());
        }

        let entries = self.log.read_all().await?;
        let stats: Vec<EngagementStat> = entries
            .iter()
            .rev()
            .take(window)
            .map(engagement_for)
            .collect();

        let totals = stats
            .iter()
            .fold(EngagementTotals::default(), |acc, s| EngagementTotals {
                likes: acc.likes + s.likes,
                comments: acc.comments + s.comments,
                shares: acc.shares + s.shares,
            });

        let averages = if stats.is_empty() {
            EngagementAverages::default()
        } else {
            let n = stats.len() as f64;
            EngagementAverages {
                likes: totals.likes as f64 / n,
                comments: totals.comments as f64 / n,
                shares: totals.shares as f64 / n,
            }
        };

        tracing::debug!(
            window,
            entries = entries.len(),
            reported = stats.len(),
            "Engagement analyzed"
        );

        Ok(EngagementReport {
            requested: window,
            stats,
            totals,
            averages,
        })
    }

    /// Render `report` to CSV and PDF
    pub fn export(&self, report: &EngagementReport) -> ReportExport {
        ReportExport {
            csv: render_csv(report),
            pdf: render_pdf(report),
        }
    }
}
