//! postcraft domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Refinement, publishing, scheduling and analysis
//! - `validation`: Input checks applied before any state changes

pub mod model;
pub mod ports;
pub mod usecases;
pub mod validation;

pub use model::*;
pub use ports::*;

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Base for simulated post locations
pub const PREVIEW_BASE_URL: &str = "https://preview.postcraft.invalid/p";

/// SHA-256 hex digest of a payload, stored in place of a real post reference
pub fn payload_digest(payload: &str) -> String {
    format!("{:x}", Sha256::digest(payload.as_bytes()))
}

/// Simulated preview URL; a pure function of the job id
pub fn preview_url(job_id: &Uuid) -> String {
    let digest = Sha256::digest(job_id.as_bytes());
    let short: String = digest[..6].iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}/{}", PREVIEW_BASE_URL, short)
}

/// Whitespace-collapsed, lowercased form used to compare variations
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
