//! Loads INTERACTION dataset track files into per-case, per-agent structures.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod agent_type;
mod case;
mod error;
mod ids;
mod records;
pub mod registry;
mod scenario;
mod track;

pub use agent_type::AgentType;
pub use case::Case;
pub use error::ScenarioError;
pub use ids::{CaseID, TrackID};
pub use scenario::{MotionRow, Scenario, Split, TrackSummary, CURRENT_TIMESTAMP_MS};
pub use track::{MotionState, Track};
