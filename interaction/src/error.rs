use std::path::PathBuf;

use thiserror::Error;

use crate::CaseID;

/// The failures callers may want to tell apart. Everything is surfaced as `anyhow::Error`; use
/// `downcast_ref::<ScenarioError>()` to inspect the kind.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("track file {} not found", .0.display())]
    NotFound(PathBuf),
    #[error("malformed track file {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("unknown agent_type {0:?}")]
    Decode(String),
    #[error("{case_id} out of range for a scenario with {num_cases} cases")]
    OutOfRange { case_id: CaseID, num_cases: usize },
}
