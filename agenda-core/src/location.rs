use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a meeting takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    /// The physical meeting room.
    #[serde(rename = "sala-wit")]
    SalaWit,
    #[serde(rename = "virtual")]
    Virtual,
    #[serde(rename = "presencial")]
    Presencial,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::SalaWit, Location::Virtual, Location::Presencial];

    /// Wire value, also used as the `location` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::SalaWit => "sala-wit",
            Location::Virtual => "virtual",
            Location::Presencial => "presencial",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Location::SalaWit => "Sala Wit",
            Location::Virtual => "Virtual",
            Location::Presencial => "Presencial",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("Unknown location '{s}'. Expected one of: sala-wit, virtual, presencial")
            })
    }
}
