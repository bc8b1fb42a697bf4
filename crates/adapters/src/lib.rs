//! postcraft adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `event_log`: JSONL file and in-memory event logs
//! - `llm`: Remote completion adapters (OpenAI, OpenAI-compatible, stub)

mod event_log_fs;
mod event_log_memory;

pub mod llm;

/// Re-exports for event log adapters
pub mod event_log {
    pub use crate::event_log_fs::JsonlEventLog;
    pub use crate::event_log_memory::InMemoryEventLog;
}
