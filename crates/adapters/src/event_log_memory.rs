//! In-memory event log for testing and offline mode

use async_trait::async_trait;
use postcraft_domain::{EventLog, LogEntry, LogError};
use std::sync::RwLock;

/// In-memory event log implementation
#[derive(Default)]
pub struct InMemoryEventLog {
    entries: RwLock<Vec<LogEntry>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| LogError::Unavailable(e.to_string()))?;
        entries.push(entry.clone());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<LogEntry>, LogError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| LogError::Unavailable(e.to_string()))?;
        Ok(entries.clone())
    }
}
