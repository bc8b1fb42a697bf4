//! Application use cases / business logic

pub mod analyze;
pub mod publish;
pub mod render;
pub mod scheduler;
pub mod style;
pub mod variations;

pub use analyze::{AnalyzeError, EngagementAnalyzer, ReportExport, engagement_for};
pub use publish::{PublishError, PublishRequest, PublishResult, PublishSimulator};
pub use render::{render_csv, render_pdf};
pub use scheduler::{FireFailure, JobScheduler, SchedulerConfig};
pub use style::StyleRuleEngine;
pub use variations::{
    GenerationOutcome, GenerationWarning, VariationConfig, VariationGenerator, build_refine_prompt,
};

/// In-memory doubles shared by the use case tests
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use crate::model::LogEntry;
    use crate::ports::{Clock, EventLog, LogError};

    #[derive(Default)]
    pub struct MemoryLog {
        entries: Mutex<Vec<LogEntry>>,
    }

    impl MemoryLog {
        pub fn entries(&self) -> Vec<LogEntry> {
            self.entries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventLog for MemoryLog {
        async fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }

        async fn read_all(&self) -> Result<Vec<LogEntry>, LogError> {
            Ok(self.entries())
        }
    }

    pub struct FailingLog;

    #[async_trait]
    impl EventLog for FailingLog {
        async fn append(&self, _entry: &LogEntry) -> Result<(), LogError> {
            Err(LogError::Unavailable("disk full".to_string()))
        }

        async fn read_all(&self) -> Result<Vec<LogEntry>, LogError> {
            Err(LogError::Unavailable("disk gone".to_string()))
        }
    }

    /// Appends after a tokio sleep
    pub struct SlowLog {
        pub inner: MemoryLog,
        delay: Duration,
    }

    impl SlowLog {
        pub fn new(delay: Duration) -> Self {
            Self {
                inner: MemoryLog::default(),
                delay,
            }
        }
    }

    #[async_trait]
    impl EventLog for SlowLog {
        async fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
            tokio::time::sleep(self.delay).await;
            self.inner.append(entry).await
        }

        async fn read_all(&self) -> Result<Vec<LogEntry>, LogError> {
            self.inner.read_all().await
        }
    }

    pub struct ManualClock {
        now: Mutex<OffsetDateTime>,
    }

    impl ManualClock {
        pub fn new(now: OffsetDateTime) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        pub fn set(&self, now: OffsetDateTime) {
            *self.now.lock().unwrap() = now;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            *self.now.lock().unwrap()
        }
    }
}
