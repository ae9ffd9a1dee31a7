use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use abstutil::{Counter, Timer};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::records::{self, DecodedRow};
use crate::registry;
use crate::{AgentType, Case, CaseID, MotionState, ScenarioError, Track, TrackID};

/// The frame every case is anchored on. History ends here, the future starts right after.
pub const CURRENT_TIMESTAMP_MS: u32 = 1000;

// Train/val tracks spanning the whole case are the prediction targets
const FULL_TRACK_START_MS: u32 = 100;
const FULL_TRACK_END_MS: u32 = 4000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub fn all() -> Vec<Self> {
        vec![Split::Train, Split::Val, Split::Test]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }

    /// Infers the split from the last component of a data directory, like `.../val` or
    /// `.../test_multi-agent`.
    pub fn from_root(root: &Path) -> Result<Self> {
        let last = root
            .file_name()
            .map(|x| x.to_string_lossy().to_string())
            .unwrap_or_default();
        // Order matters; the first match wins
        for split in Split::all() {
            if last.contains(split.as_str()) {
                debug!("Inferred {} split from {}", split, root.display());
                return Ok(split);
            }
        }
        Err(ScenarioError::Config(format!(
            "unable to infer the split from {}",
            root.display()
        ))
        .into())
    }

    /// Maps a name from `registry::SPLITS`, including the test variants.
    pub fn from_registry_name(name: &str) -> Option<Self> {
        registry::split_locations(name)?;
        if name.starts_with("test") {
            Some(Split::Test)
        } else {
            name.parse().ok()
        }
    }

    fn file_name(self, location: &str) -> String {
        match self {
            Split::Test => format!("{location}_obs.csv"),
            _ => format!("{location}_{}.csv", self.as_str()),
        }
    }
}

impl FromStr for Split {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> Result<Self> {
        for split in Split::all() {
            if split.as_str() == x {
                return Ok(split);
            }
        }
        Err(ScenarioError::Config(format!("invalid split {x:?}")).into())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the motion-state layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionRow {
    pub case_id: CaseID,
    pub track_id: TrackID,
    pub agent_type: AgentType,
    pub state: MotionState,
}

/// One row of the track layer: the earliest row of each (case, track).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub case_id: CaseID,
    pub track_id: TrackID,
    pub timestamp_ms: u32,
    pub agent_type: AgentType,
}

/// All of the tracks for one location and split, indexed by case.
///
/// Everything is read up-front; afterwards the scenario is immutable and every `get_case` builds
/// a fresh `Case`.
pub struct Scenario {
    location: String,
    root: PathBuf,
    split: Split,
    num_cases: usize,

    // Per case, sorted by time. Equal timestamps keep the input order.
    motion_states: BTreeMap<CaseID, Vec<MotionRow>>,
    // Indices into motion_states[case_id]
    track_rows: BTreeMap<(CaseID, TrackID), Vec<usize>>,
    tracks: BTreeMap<(CaseID, TrackID), TrackSummary>,

    tracks_to_predict: BTreeMap<CaseID, Vec<TrackID>>,
    interesting_agents: BTreeMap<CaseID, Vec<TrackID>>,
}

impl Scenario {
    /// If `split` is None, it's inferred from the last component of `root`.
    pub fn new<P: AsRef<Path>>(root: P, location: &str, split: Option<Split>) -> Result<Self> {
        Self::load(root, location, split, &mut Timer::throwaway())
    }

    pub fn load<P: AsRef<Path>>(
        root: P,
        location: &str,
        split: Option<Split>,
        timer: &mut Timer,
    ) -> Result<Self> {
        let root = root.as_ref();
        // If the directory doesn't exist, the file check below reports it
        let root = fs_err::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let split = match split {
            Some(split) => split,
            None => Split::from_root(&root)?,
        };
        if !registry::is_valid_location(location) {
            warn!("{location} isn't a known INTERACTION location");
        }

        let path = root.join(split.file_name(location));
        if !path.is_file() {
            return Err(ScenarioError::NotFound(path).into());
        }

        let step = format!("read {}", path.display());
        timer.start(step.clone());
        let rows = read_rows(&path, split);
        timer.stop(step);
        let rows = rows?;

        timer.start("index scenario");
        let (tracks_to_predict, interesting_agents) = match split {
            Split::Test => (
                flagged_tracks(&rows, |r| r.to_predict),
                flagged_tracks(&rows, |r| r.interesting),
            ),
            Split::Train | Split::Val => {
                let mut interesting_agents = BTreeMap::new();
                for r in &rows {
                    interesting_agents
                        .entry(r.row.case_id)
                        .or_insert_with(Vec::new);
                }
                (full_car_tracks(&rows), interesting_agents)
            }
        };

        let mut per_type = Counter::new();
        let num_rows = rows.len();
        let mut motion_states: BTreeMap<CaseID, Vec<MotionRow>> = BTreeMap::new();
        let mut tracks: BTreeMap<(CaseID, TrackID), TrackSummary> = BTreeMap::new();
        for DecodedRow { row, .. } in rows {
            per_type.inc(row.agent_type);
            let summary = TrackSummary {
                case_id: row.case_id,
                track_id: row.track_id,
                timestamp_ms: row.state.timestamp_ms,
                agent_type: row.agent_type,
            };
            tracks
                .entry((row.case_id, row.track_id))
                .and_modify(|existing| {
                    if summary.timestamp_ms < existing.timestamp_ms {
                        *existing = summary;
                    }
                })
                .or_insert(summary);
            motion_states
                .entry(row.case_id)
                .or_insert_with(Vec::new)
                .push(row);
        }

        let mut track_rows: BTreeMap<(CaseID, TrackID), Vec<usize>> = BTreeMap::new();
        for (case_id, case_rows) in &mut motion_states {
            case_rows.sort_by_key(|r| r.state.timestamp_ms);
            for (idx, row) in case_rows.iter().enumerate() {
                track_rows
                    .entry((*case_id, row.track_id))
                    .or_insert_with(Vec::new)
                    .push(idx);
            }
        }
        timer.stop("index scenario");

        if split != Split::Test {
            for case_id in motion_states.keys() {
                if !tracks_to_predict.contains_key(case_id) {
                    warn!("{location} {case_id} has no track spanning the whole case");
                }
            }
        }

        info!(
            "{location} ({split}): {num_rows} rows, {} cases, {} tracks ({} car, {} pedestrian/bicycle rows)",
            motion_states.len(),
            tracks.len(),
            per_type.get(AgentType::Car),
            per_type.get(AgentType::PedestrianBicycle),
        );

        Ok(Self {
            location: location.to_string(),
            root,
            split,
            num_cases: motion_states.len(),
            motion_states,
            track_rows,
            tracks,
            tracks_to_predict,
            interesting_agents,
        })
    }

    pub fn num_cases(&self) -> usize {
        self.num_cases
    }

    pub fn len(&self) -> usize {
        self.num_cases
    }

    pub fn is_empty(&self) -> bool {
        self.num_cases == 0
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn track_root(&self) -> &Path {
        &self.root
    }

    pub fn track_file(&self) -> PathBuf {
        self.root.join(self.split.file_name(&self.location))
    }

    /// Every case ID present in the file, in order.
    pub fn case_ids(&self) -> impl Iterator<Item = CaseID> + '_ {
        self.motion_states.keys().cloned()
    }

    /// Fails if the case is outside `[0, num_cases)` or has no rows.
    pub fn get_case(&self, case_id: CaseID) -> Result<Case> {
        if case_id.0 >= self.num_cases || !self.motion_states.contains_key(&case_id) {
            return Err(ScenarioError::OutOfRange {
                case_id,
                num_cases: self.num_cases,
            }
            .into());
        }
        self.extract_case(case_id)
    }

    /// Builds a case without any range checks. Unknown case IDs produce empty windows.
    pub fn extract_case(&self, case_id: CaseID) -> Result<Case> {
        let build = || -> Result<Case> {
            Ok(Case {
                location: self.location.clone(),
                case_id,
                history_tracks: Self::tracks_from_rows(self.history(case_id))?,
                current_tracks: Self::tracks_from_rows(self.current(case_id))?,
                future_tracks: Self::tracks_from_rows(self.future(case_id))?,
                tracks_to_predict: self.tracks_to_predict(case_id).to_vec(),
                interesting_agents: self.interesting_agents(case_id).to_vec(),
            })
        };
        build().with_context(|| format!("building {case_id} of {}", self.location))
    }

    /// Every case in the file, in order of case ID.
    pub fn cases(&self) -> impl Iterator<Item = Result<Case>> + '_ {
        self.case_ids().map(|case_id| self.extract_case(case_id))
    }

    /// Rows at or before the current frame
    pub fn history(&self, case_id: CaseID) -> Vec<&MotionRow> {
        self.window(case_id, |t| t <= CURRENT_TIMESTAMP_MS)
    }

    pub fn current(&self, case_id: CaseID) -> Vec<&MotionRow> {
        self.window(case_id, |t| t == CURRENT_TIMESTAMP_MS)
    }

    pub fn future(&self, case_id: CaseID) -> Vec<&MotionRow> {
        self.window(case_id, |t| t > CURRENT_TIMESTAMP_MS)
    }

    fn window(&self, case_id: CaseID, keep: impl Fn(u32) -> bool) -> Vec<&MotionRow> {
        match self.motion_states.get(&case_id) {
            Some(rows) => rows
                .iter()
                .filter(|r| keep(r.state.timestamp_ms))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Groups rows into one track per agent, in order of first appearance. The agent type comes
    /// from each agent's first row. Rows aren't re-sorted, so they must already be in time order.
    pub fn tracks_from_rows<'a, I: IntoIterator<Item = &'a MotionRow>>(
        rows: I,
    ) -> Result<Vec<Track>> {
        let mut order: Vec<TrackID> = Vec::new();
        let mut per_track: BTreeMap<TrackID, (AgentType, Vec<MotionState>)> = BTreeMap::new();
        for row in rows {
            per_track
                .entry(row.track_id)
                .or_insert_with(|| {
                    order.push(row.track_id);
                    (row.agent_type, Vec::new())
                })
                .1
                .push(row.state.clone());
        }

        let mut tracks = Vec::new();
        for track_id in order {
            if let Some((agent_type, states)) = per_track.remove(&track_id) {
                tracks.push(Track::new(track_id, agent_type, states)?);
            }
        }
        Ok(tracks)
    }

    pub fn tracks_to_predict(&self, case_id: CaseID) -> &[TrackID] {
        self.tracks_to_predict
            .get(&case_id)
            .map(|x| x.as_slice())
            .unwrap_or(&[])
    }

    /// Always empty outside the test split
    pub fn interesting_agents(&self, case_id: CaseID) -> &[TrackID] {
        self.interesting_agents
            .get(&case_id)
            .map(|x| x.as_slice())
            .unwrap_or(&[])
    }

    pub fn track_summary(&self, case_id: CaseID, track_id: TrackID) -> Option<&TrackSummary> {
        self.tracks.get(&(case_id, track_id))
    }

    /// Sorted by track ID
    pub fn track_summaries(&self, case_id: CaseID) -> Vec<&TrackSummary> {
        self.tracks
            .range((case_id, TrackID(0))..=(case_id, TrackID(usize::MAX)))
            .map(|(_, summary)| summary)
            .collect()
    }

    /// All of one agent's rows in a case, in time order
    pub fn motion_states(&self, case_id: CaseID, track_id: TrackID) -> Vec<&MotionRow> {
        match (
            self.motion_states.get(&case_id),
            self.track_rows.get(&(case_id, track_id)),
        ) {
            (Some(rows), Some(indices)) => indices.iter().map(|idx| &rows[*idx]).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "<INTERACTIONScenario(location={}, root={})>",
            self.location,
            self.root.display()
        )
    }
}

fn read_rows(path: &Path, split: Split) -> Result<Vec<DecodedRow>> {
    let file = fs_err::File::open(path)?;
    records::load(std::io::BufReader::new(file), path, split)
}

// Test split: the files mark targets per row. Case keys only exist when something is flagged.
fn flagged_tracks(
    rows: &[DecodedRow],
    flag: impl Fn(&DecodedRow) -> bool,
) -> BTreeMap<CaseID, Vec<TrackID>> {
    let mut result: BTreeMap<CaseID, Vec<TrackID>> = BTreeMap::new();
    for r in rows {
        if !flag(r) {
            continue;
        }
        let list = result.entry(r.row.case_id).or_insert_with(Vec::new);
        if !list.contains(&r.row.track_id) {
            list.push(r.row.track_id);
        }
    }
    result
}

// Train/val: cars observed for the entire case. Track IDs come out sorted.
fn full_car_tracks(rows: &[DecodedRow]) -> BTreeMap<CaseID, Vec<TrackID>> {
    // (min timestamp, max timestamp, first agent type)
    let mut ranges: BTreeMap<(CaseID, TrackID), (u32, u32, AgentType)> = BTreeMap::new();
    for r in rows {
        let t = r.row.state.timestamp_ms;
        let range = ranges
            .entry((r.row.case_id, r.row.track_id))
            .or_insert((t, t, r.row.agent_type));
        range.0 = range.0.min(t);
        range.1 = range.1.max(t);
    }

    let mut result: BTreeMap<CaseID, Vec<TrackID>> = BTreeMap::new();
    for ((case_id, track_id), (min, max, agent_type)) in ranges {
        if min == FULL_TRACK_START_MS && max == FULL_TRACK_END_MS && agent_type == AgentType::Car
        {
            result.entry(case_id).or_insert_with(Vec::new).push(track_id);
        }
    }
    result
}
