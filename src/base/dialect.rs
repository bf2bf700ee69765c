//! Wire-schema dialect identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One historical version of the library document schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "1.4")]
    V1_4,
    #[serde(rename = "1.6")]
    V1_6,
}

impl Dialect {
    /// Every supported dialect, oldest first.
    pub const ALL: [Dialect; 2] = [Dialect::V1_4, Dialect::V1_6];

    /// The dialect new libraries are written in.
    pub const CURRENT: Dialect = Dialect::V1_6;

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::V1_4 => "1.4",
            Dialect::V1_6 => "1.6",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.4" | "v1.4" => Ok(Dialect::V1_4),
            "1.6" | "v1.6" => Ok(Dialect::V1_6),
            other => Err(format!("unknown dialect '{other}'")),
        }
    }
}
