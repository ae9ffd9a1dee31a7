use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{CaseID, Track, TrackID};

/// One prediction instance, split into three time windows around the current frame.
///
/// `history_tracks` covers every state up to and including the current timestamp, so the current
/// state of each agent appears both there and in `current_tracks`. `future_tracks` covers
/// everything strictly after.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub location: String,
    pub case_id: CaseID,
    pub history_tracks: Vec<Track>,
    pub current_tracks: Vec<Track>,
    pub future_tracks: Vec<Track>,
    pub tracks_to_predict: Vec<TrackID>,
    /// Only populated for the test split
    pub interesting_agents: Vec<TrackID>,
}

impl Case {
    pub fn history_track(&self, agent_id: TrackID) -> Option<&Track> {
        find(&self.history_tracks, agent_id)
    }

    pub fn current_track(&self, agent_id: TrackID) -> Option<&Track> {
        find(&self.current_tracks, agent_id)
    }

    pub fn future_track(&self, agent_id: TrackID) -> Option<&Track> {
        find(&self.future_tracks, agent_id)
    }

    pub fn is_to_predict(&self, agent_id: TrackID) -> bool {
        self.tracks_to_predict.contains(&agent_id)
    }

    /// Distinct agents appearing in any window
    pub fn num_agents(&self) -> usize {
        self.history_tracks
            .iter()
            .chain(&self.current_tracks)
            .chain(&self.future_tracks)
            .map(|t| t.agent_id)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

fn find(tracks: &[Track], agent_id: TrackID) -> Option<&Track> {
    tracks.iter().find(|t| t.agent_id == agent_id)
}
