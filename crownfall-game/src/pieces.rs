//! Piece handles, offices and the player-owned pieces (characters, workers).
//!
//! Pieces live in arenas owned by the board; everything else refers to them
//! through the `Copy` handles defined here. A piece's `location` is a plain
//! tag naming the container that holds it, never an owning reference.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::containers::Slot;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

handle!(
    /// Seat index of a player in the fixed turn order.
    PlayerId,
    "P"
);
handle!(
    /// Arena handle of a character.
    CharacterId,
    "C"
);
handle!(
    /// Arena handle of a worker.
    WorkerId,
    "W"
);
handle!(
    /// Arena handle of a building card.
    BuildingId,
    "B"
);
handle!(
    /// Arena handle of a retainer card.
    RetainerId,
    "R"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// A named singular board role occupied by at most one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Office {
    Crown,
    Priest,
    Commander,
    Spymaster,
    Treasurer,
    Heir,
}

impl Office {
    pub const ALL: [Self; 6] = [
        Self::Crown,
        Self::Priest,
        Self::Commander,
        Self::Spymaster,
        Self::Treasurer,
        Self::Heir,
    ];

    /// Offices whose action sets the crown may delegate.
    pub const SUBORDINATE: [Self; 4] = [
        Self::Priest,
        Self::Commander,
        Self::Spymaster,
        Self::Treasurer,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Crown => 0,
            Self::Priest => 1,
            Self::Commander => 2,
            Self::Spymaster => 3,
            Self::Treasurer => 4,
            Self::Heir => 5,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Crown => "crown",
            Self::Priest => "priest",
            Self::Commander => "commander",
            Self::Spymaster => "spymaster",
            Self::Treasurer => "treasurer",
            Self::Heir => "heir",
        }
    }
}

impl fmt::Display for Office {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Punishment applied when the commander arrests a character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentencing {
    /// Pay a fine, routed to the priest when one holds office.
    #[default]
    Fine,
    /// Thrown in the dungeon.
    Prison,
    /// Executed.
    Death,
}

impl Sentencing {
    pub const ALL: [Self; 3] = [Self::Fine, Self::Prison, Self::Death];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fine => "fine",
            Self::Prison => "prison",
            Self::Death => "death",
        }
    }
}

impl fmt::Display for Sentencing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a character currently sits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Unassigned, in the owning player's hand.
    #[default]
    Hand,
    Court(usize),
    Campaign,
    Dungeon,
    Crypt,
    Office(Office),
    /// Managing a constructed building.
    Building(BuildingId),
}

impl Location {
    /// Locations from which a character can still be used.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        !matches!(self, Self::Dungeon | Self::Crypt)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hand => "hand",
            Self::Court(_) => "court",
            Self::Campaign => "campaign",
            Self::Dungeon => "dungeon",
            Self::Crypt => "crypt",
            Self::Office(office) => office.label(),
            Self::Building(_) => "building",
        }
    }
}

/// A member of a player's dynasty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub owner: PlayerId,
    pub name: String,
    pub gender: Gender,
    pub(crate) location: Location,
    pub(crate) locked: bool,
    pub(crate) retainer: Slot<RetainerId>,
}

impl Character {
    #[must_use]
    pub fn new(id: CharacterId, owner: PlayerId, name: String, gender: Gender) -> Self {
        Self {
            id,
            owner,
            name,
            gender,
            location: Location::Hand,
            locked: false,
            retainer: Slot::new(),
        }
    }

    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    /// "Usable" is derived from location: dungeon and crypt are dead ends.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.location.is_usable()
    }

    /// Has this character already acted this round?
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Unassigned, usable and not yet moved this round.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        matches!(self.location, Location::Hand) && !self.locked
    }

    #[must_use]
    pub const fn retainer(&self) -> Option<RetainerId> {
        self.retainer.get()
    }
}

/// A fungible labor piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub owner: PlayerId,
    pub(crate) building: Option<BuildingId>,
}

impl Worker {
    #[must_use]
    pub const fn new(id: WorkerId, owner: PlayerId) -> Self {
        Self {
            id,
            owner,
            building: None,
        }
    }

    /// The building this worker labors in, `None` while in hand.
    #[must_use]
    pub const fn building(&self) -> Option<BuildingId> {
        self.building
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn office_indices_match_their_order() {
        for office in Office::ALL {
            assert_eq!(Office::ALL[office.index()], office);
        }
    }

    #[test]
    fn usability_follows_location() {
        let mut character =
            Character::new(CharacterId(0), PlayerId(1), "Ada".into(), Gender::Female);
        assert!(character.is_free());
        character.location = Location::Dungeon;
        assert!(!character.is_usable());
        character.location = Location::Court(2);
        assert!(character.is_usable());
        assert!(!character.is_free());
        assert_eq!(character.location().label(), "court");
        assert_eq!(CharacterId(4).to_string(), "C4");
    }
}
