//! Seasons of the year.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cyclic season. A year ends when Winter turns over to Summer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    #[default]
    Summer,
    Harvest,
    Winter,
}

impl Season {
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Summer => Self::Harvest,
            Self::Harvest => Self::Winter,
            Self::Winter => Self::Summer,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Summer => "summer",
            Self::Harvest => "harvest",
            Self::Winter => "winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
