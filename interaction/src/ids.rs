use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// One prediction instance within a scenario file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CaseID(pub usize);

/// One agent within a case. Track IDs are only unique inside their case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackID(pub usize);

impl fmt::Display for CaseID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "case {}", self.0)
    }
}

impl fmt::Display for TrackID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "track {}", self.0)
    }
}

// The published files write case_id as a float ("1.0"), so accept any integral number.
pub(crate) fn parse_case_id<'de, D: Deserializer<'de>>(d: D) -> Result<CaseID, D::Error> {
    let x = <f64>::deserialize(d)?;
    if x.is_finite() && x >= 0.0 && x.fract() == 0.0 {
        return Ok(CaseID(x as usize));
    }
    Err(serde::de::Error::custom(format!("Non-integral case_id {x}")))
}
