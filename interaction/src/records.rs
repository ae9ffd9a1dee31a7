use std::path::Path;

use anyhow::Result;
use geom::Pt2D;
use serde::{Deserialize, Deserializer};

use crate::ids::parse_case_id;
use crate::{AgentType, CaseID, MotionRow, MotionState, ScenarioError, Split, TrackID};

const REQUIRED_COLUMNS: [&str; 8] = [
    "case_id",
    "track_id",
    "timestamp_ms",
    "agent_type",
    "x",
    "y",
    "vx",
    "vy",
];

// Only the observation files for the test split carry these
const TEST_COLUMNS: [&str; 2] = ["tracks_to_predict", "interesting_agent"];

/// A decoded row plus the per-row flags that only exist for the test split.
#[derive(Debug)]
pub struct DecodedRow {
    pub row: MotionRow,
    pub to_predict: bool,
    pub interesting: bool,
}

pub fn load<R: std::io::Read>(reader: R, path: &Path, split: Split) -> Result<Vec<DecodedRow>> {
    let malformed = |reason: String| ScenarioError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|err| malformed(err.to_string()))?
        .clone();
    let mut required = REQUIRED_COLUMNS.to_vec();
    if split == Split::Test {
        required.extend(TEST_COLUMNS);
    }
    let missing: Vec<&str> = required
        .into_iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(malformed(format!("missing columns {}", missing.join(", "))).into());
    }

    let mut rows = Vec::new();
    for rec in reader.deserialize() {
        let rec: Record = rec.map_err(|err| malformed(err.to_string()))?;
        if !rec.x.is_finite() || !rec.y.is_finite() {
            return Err(malformed(format!(
                "{} of {} has position ({}, {})",
                rec.track_id, rec.case_id, rec.x, rec.y
            ))
            .into());
        }
        let agent_type = AgentType::parse(&rec.agent_type)?;

        rows.push(DecodedRow {
            row: MotionRow {
                case_id: rec.case_id,
                track_id: rec.track_id,
                agent_type,
                state: MotionState {
                    agent_id: rec.track_id,
                    // Older releases don't have frame_id; frames are 100ms apart
                    frame_id: rec
                        .frame_id
                        .unwrap_or((rec.timestamp_ms / 100) as usize),
                    timestamp_ms: rec.timestamp_ms,
                    pos: Pt2D::new(rec.x, rec.y),
                    vx: rec.vx,
                    vy: rec.vy,
                    psi_rad: rec.psi_rad,
                    length: rec.length,
                    width: rec.width,
                },
            },
            to_predict: rec.tracks_to_predict == Some(1),
            interesting: rec.interesting_agent == Some(1),
        });
    }
    Ok(rows)
}

#[derive(Deserialize)]
struct Record {
    #[serde(deserialize_with = "parse_case_id")]
    case_id: CaseID,
    track_id: TrackID,
    frame_id: Option<usize>,
    timestamp_ms: u32,
    agent_type: String,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    psi_rad: Option<f64>,
    length: Option<f64>,
    width: Option<f64>,
    #[serde(default, deserialize_with = "parse_flag")]
    tracks_to_predict: Option<u8>,
    #[serde(default, deserialize_with = "parse_flag")]
    interesting_agent: Option<u8>,
}

// Flags may be written as floats ("1.0") like case_id. Empty cells are None.
fn parse_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u8>, D::Error> {
    match <Option<f64>>::deserialize(d)? {
        None => Ok(None),
        Some(x) if x.fract() == 0.0 && (0.0..=255.0).contains(&x) => Ok(Some(x as u8)),
        Some(x) => Err(serde::de::Error::custom(format!("Unknown flag value {x}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(data: &str, split: Split) -> Result<Vec<DecodedRow>> {
        load(data.as_bytes(), Path::new("test.csv"), split)
    }

    fn is_malformed(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<ScenarioError>(),
            Some(ScenarioError::Malformed { .. })
        )
    }

    #[test]
    fn decodes_rows() -> Result<()> {
        let rows = load_str(
            "case_id,track_id,frame_id,timestamp_ms,agent_type,x,y,vx,vy,psi_rad,length,width\n\
             1.0,4,1,100,car,1.5,2.5,3.0,4.0,0.25,4.5,1.75\n\
             1.0,9,1,100,pedestrian/bicycle,-3.0,8.0,0.5,0.0,,,\n",
            Split::Train,
        )?;
        assert_eq!(rows.len(), 2);

        let car = &rows[0].row;
        assert_eq!(car.case_id, CaseID(1));
        assert_eq!(car.track_id, TrackID(4));
        assert_eq!(car.agent_type, AgentType::Car);
        assert_eq!(car.state.agent_id, TrackID(4));
        assert_eq!(car.state.pos, Pt2D::new(1.5, 2.5));
        assert_eq!(car.state.speed(), 5.0);
        assert_eq!(car.state.length, Some(4.5));
        assert!(!rows[0].to_predict);

        let ped = &rows[1].row;
        assert_eq!(ped.agent_type, AgentType::PedestrianBicycle);
        assert_eq!(ped.state.psi_rad, None);
        assert_eq!(ped.state.width, None);
        Ok(())
    }

    #[test]
    fn frame_id_is_optional() -> Result<()> {
        let rows = load_str(
            "case_id,track_id,timestamp_ms,agent_type,x,y,vx,vy\n0,1,1300,car,0,0,0,0\n",
            Split::Val,
        )?;
        assert_eq!(rows[0].row.state.frame_id, 13);
        Ok(())
    }

    #[test]
    fn test_split_flags() -> Result<()> {
        let rows = load_str(
            "case_id,track_id,timestamp_ms,agent_type,x,y,vx,vy,tracks_to_predict,interesting_agent\n\
             0,1,100,car,0,0,0,0,1,0\n\
             0,2,100,car,0,0,0,0,0,1\n",
            Split::Test,
        )?;
        assert!(rows[0].to_predict && !rows[0].interesting);
        assert!(!rows[1].to_predict && rows[1].interesting);
        Ok(())
    }

    #[test]
    fn float_flags() -> Result<()> {
        let rows = load_str(
            "case_id,track_id,timestamp_ms,agent_type,x,y,vx,vy,tracks_to_predict,interesting_agent\n\
             1.0,1,100,car,0,0,0,0,1.0,0.0\n\
             1.0,2,100,car,0,0,0,0,,1\n",
            Split::Test,
        )?;
        assert!(rows[0].to_predict && !rows[0].interesting);
        assert!(!rows[1].to_predict && rows[1].interesting);

        let err = load_str(
            "case_id,track_id,timestamp_ms,agent_type,x,y,vx,vy,tracks_to_predict,interesting_agent\n\
             1.0,1,100,car,0,0,0,0,0.5,0\n",
            Split::Test,
        )
        .unwrap_err();
        assert!(is_malformed(&err));
        Ok(())
    }

    #[test]
    fn missing_columns() {
        let err = load_str(
            "case_id,track_id,timestamp_ms,agent_type,x,vx,vy\n0,1,100,car,0,0,0\n",
            Split::Train,
        )
        .unwrap_err();
        assert!(is_malformed(&err));
        assert!(err.to_string().contains("missing columns y"));

        // Train files are fine without the flags, test files aren't
        let data = "case_id,track_id,timestamp_ms,agent_type,x,y,vx,vy\n0,1,100,car,0,0,0,0\n";
        assert!(load_str(data, Split::Train).is_ok());
        assert!(is_malformed(&load_str(data, Split::Test).unwrap_err()));
    }

    #[test]
    fn bad_rows() {
        let header = "case_id,track_id,timestamp_ms,agent_type,x,y,vx,vy\n";

        let err = load_str(&format!("{header}0,1,100,bus,0,0,0,0\n"), Split::Train).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScenarioError>(),
            Some(ScenarioError::Decode(_))
        ));

        let err = load_str(&format!("{header}0,1,abc,car,0,0,0,0\n"), Split::Train).unwrap_err();
        assert!(is_malformed(&err));

        let err = load_str(&format!("{header}0,1,100,car,NaN,0,0,0\n"), Split::Train).unwrap_err();
        assert!(is_malformed(&err));
    }
}
