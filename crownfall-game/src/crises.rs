//! Crisis cards: one-shot adverse events resolved by the board.
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisKind {
    /// The crown dies of mysterious causes.
    Regicide,
    /// Farms produce nothing while active.
    Blight,
    /// Families without an apothecary worker lose two characters.
    Plague,
    /// The court and the great officers are blown up.
    Powderplot,
}

impl CrisisKind {
    pub const ALL: [Self; 4] = [Self::Regicide, Self::Blight, Self::Plague, Self::Powderplot];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Regicide => "regicide",
            Self::Blight => "blight",
            Self::Plague => "plague",
            Self::Powderplot => "powderplot",
        }
    }

    /// Narration recorded when the crisis strikes.
    #[must_use]
    pub const fn announcement(self) -> &'static str {
        match self {
            Self::Regicide => "A regicide has taken place, the crown is dead!",
            Self::Blight => "A blight has befallen the land, farms produce no food this year!",
            Self::Plague => {
                "A plague has swept the countryside, two characters from each family have fallen!"
            }
            Self::Powderplot => {
                "A powderplot has taken place, all members of the court have been vaporized!"
            }
        }
    }
}

impl fmt::Display for CrisisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
