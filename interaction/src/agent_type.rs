use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::ScenarioError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentType {
    Car,
    PedestrianBicycle,
}

// Raw `agent_type` values as written in the track files
const LOOKUP: [(&str, AgentType); 2] = [
    ("car", AgentType::Car),
    ("pedestrian/bicycle", AgentType::PedestrianBicycle),
];

impl AgentType {
    pub fn all() -> Vec<Self> {
        LOOKUP.iter().map(|(_, x)| *x).collect()
    }

    /// Decodes the raw column value. Fails with `ScenarioError::Decode` for anything unknown.
    pub fn parse(raw: &str) -> Result<Self> {
        let key = raw.trim();
        for (name, agent_type) in LOOKUP {
            if name == key {
                return Ok(agent_type);
            }
        }
        Err(ScenarioError::Decode(raw.to_string()).into())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentType::Car => "car",
            AgentType::PedestrianBicycle => "pedestrian/bicycle",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_values() {
        assert_eq!(AgentType::parse("car").unwrap(), AgentType::Car);
        assert_eq!(
            AgentType::parse("pedestrian/bicycle").unwrap(),
            AgentType::PedestrianBicycle
        );
        for agent_type in AgentType::all() {
            assert_eq!(
                AgentType::parse(agent_type.as_str()).unwrap(),
                agent_type
            );
        }
    }

    #[test]
    fn unknown_value_is_a_decode_error() {
        let err = AgentType::parse("truck").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScenarioError>(),
            Some(ScenarioError::Decode(x)) if x == "truck"
        ));
    }
}
