use anyhow::Result;
use geom::Pt2D;
use serde::{Deserialize, Serialize};

use crate::{AgentType, TrackID};

/// One agent's kinematic state at one timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub agent_id: TrackID,
    pub frame_id: usize,
    pub timestamp_ms: u32,
    pub pos: Pt2D,
    pub vx: f64,
    pub vy: f64,
    // Pedestrians and bicycles have no heading or extent in the dataset
    pub psi_rad: Option<f64>,
    pub length: Option<f64>,
    pub width: Option<f64>,
}

impl MotionState {
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}

/// One agent's motion states within a case, ordered by time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrack")]
pub struct Track {
    pub agent_id: TrackID,
    pub agent_type: AgentType,
    motion_states: Vec<MotionState>,
}

// Deserialized tracks go through the same validation as Track::new
#[derive(Deserialize)]
struct RawTrack {
    agent_id: TrackID,
    agent_type: AgentType,
    motion_states: Vec<MotionState>,
}

impl TryFrom<RawTrack> for Track {
    type Error = anyhow::Error;

    fn try_from(raw: RawTrack) -> Result<Self> {
        Self::new(raw.agent_id, raw.agent_type, raw.motion_states)
    }
}

impl Track {
    pub fn new(
        agent_id: TrackID,
        agent_type: AgentType,
        motion_states: Vec<MotionState>,
    ) -> Result<Self> {
        for state in &motion_states {
            if state.agent_id != agent_id {
                bail!(
                    "Motion state for {} doesn't belong in {}",
                    state.agent_id,
                    agent_id
                );
            }
        }
        for pair in motion_states.windows(2) {
            if pair[0].timestamp_ms >= pair[1].timestamp_ms {
                bail!(
                    "{} out-of-order: {}ms then {}ms",
                    agent_id,
                    pair[0].timestamp_ms,
                    pair[1].timestamp_ms
                );
            }
        }
        Ok(Self {
            agent_id,
            agent_type,
            motion_states,
        })
    }

    pub fn motion_states(&self) -> &[MotionState] {
        &self.motion_states
    }

    pub fn len(&self) -> usize {
        self.motion_states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motion_states.is_empty()
    }

    /// None for an empty track
    pub fn start_time_ms(&self) -> Option<u32> {
        self.motion_states.first().map(|s| s.timestamp_ms)
    }

    pub fn end_time_ms(&self) -> Option<u32> {
        self.motion_states.last().map(|s| s.timestamp_ms)
    }

    pub fn state_at(&self, timestamp_ms: u32) -> Option<&MotionState> {
        self.motion_states
            .binary_search_by_key(&timestamp_ms, |s| s.timestamp_ms)
            .ok()
            .map(|idx| &self.motion_states[idx])
    }

    pub fn positions(&self) -> Vec<Pt2D> {
        self.motion_states.iter().map(|s| s.pos).collect()
    }
}

#[cfg(test)]
pub(crate) fn state(agent_id: usize, timestamp_ms: u32, x: f64, y: f64) -> MotionState {
    MotionState {
        agent_id: TrackID(agent_id),
        frame_id: (timestamp_ms / 100) as usize,
        timestamp_ms,
        pos: Pt2D::new(x, y),
        vx: 1.0,
        vy: 0.0,
        psi_rad: Some(0.0),
        length: Some(4.5),
        width: Some(1.8),
    }
}
