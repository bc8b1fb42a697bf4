//! Subcommand implementations

use anyhow::{Context, Result};
use std::path::Path;

pub mod analyze;
pub mod config;
pub mod doctor;
pub mod history;
pub mod publish;
pub mod refine;

/// Create the parent directory of an output file if it is missing
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))
        }
        _ => Ok(()),
    }
}
