//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{LogEntry, StyleConfig};

/// Why a remote completion did not produce text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionFailure {
    #[error("no API credential configured")]
    AuthMissing,
    /// The endpoint refused the credential (401/403); retrying cannot help
    #[error("credential rejected: {0}")]
    AuthRejected(String),
    #[error("request timed out")]
    Timeout,
    #[error("service error: {0}")]
    ServiceError(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl CompletionFailure {
    /// Whether a caller-side retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CompletionFailure::Timeout | CompletionFailure::ServiceError(_)
        )
    }
}

/// One text-completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Full prompt including the draft
    pub prompt: String,
    /// Style the completion must respect
    pub constraints: StyleConfig,
}

/// Port for a remote text-completion endpoint
///
/// Implementations issue exactly one request per call and never retry.
/// Non-success responses come back as a typed failure, never a panic.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionFailure>;

    /// Provider name for logs (e.g., "openai", "stub")
    fn provider(&self) -> &'static str;
}

/// Error type for event log operations
#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Log unavailable: {0}")]
    Unavailable(String),
}

/// Port for the append-only publish history
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Durably append one record; returns only after the record is flushed
    async fn append(&self, entry: &LogEntry) -> Result<(), LogError>;

    /// Replay every complete record in append order
    async fn read_all(&self) -> Result<Vec<LogEntry>, LogError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
