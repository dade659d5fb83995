//! Retainer cards attached to characters, possibly played face down.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::coffer::Resources;
use crate::pieces::{CharacterId, RetainerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetainerKind {
    Barber,
    Bard,
    Barrister,
    BodyGuard,
    Courtesan,
    Cupbearer,
    Eunuch,
    Huntmaster,
    Jester,
    Monk,
    Physician,
    Rogue,
}

/// What calling on a retainer yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perk {
    /// A flat gift to the master's player.
    Gift(Resources),
    /// Gold taken from the player of every character seated next to the master.
    PerNeighbour(i64),
}

impl RetainerKind {
    pub const DECK: [(Self, usize); 12] = [
        (Self::Barber, 2),
        (Self::Bard, 2),
        (Self::Barrister, 2),
        (Self::BodyGuard, 2),
        (Self::Courtesan, 1),
        (Self::Cupbearer, 2),
        (Self::Eunuch, 1),
        (Self::Huntmaster, 1),
        (Self::Jester, 1),
        (Self::Monk, 2),
        (Self::Physician, 1),
        (Self::Rogue, 1),
    ];

    /// Kinds with a perk worth calling on. Bluffs are only made as these.
    pub const WITH_PERKS: [Self; 8] = [
        Self::Barber,
        Self::Bard,
        Self::Courtesan,
        Self::Cupbearer,
        Self::Huntmaster,
        Self::Jester,
        Self::Monk,
        Self::Physician,
    ];

    #[must_use]
    pub const fn perk(self) -> Option<Perk> {
        match self {
            Self::Barber | Self::Bard | Self::Physician => Some(Perk::Gift(Resources::prestige(2))),
            Self::Cupbearer => Some(Perk::Gift(Resources::food(1))),
            Self::Huntmaster => Some(Perk::Gift(Resources::food(3))),
            Self::Jester => Some(Perk::Gift(Resources::gold(1))),
            Self::Monk => Some(Perk::Gift(Resources::new(0, 1, 1))),
            Self::Courtesan => Some(Perk::PerNeighbour(1)),
            Self::Barrister | Self::BodyGuard | Self::Eunuch | Self::Rogue => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Barber => "barber",
            Self::Bard => "bard",
            Self::Barrister => "barrister",
            Self::BodyGuard => "bodyguard",
            Self::Courtesan => "courtesan",
            Self::Cupbearer => "cupbearer",
            Self::Eunuch => "eunuch",
            Self::Huntmaster => "huntmaster",
            Self::Jester => "jester",
            Self::Monk => "monk",
            Self::Physician => "physician",
            Self::Rogue => "rogue",
        }
    }
}

impl fmt::Display for RetainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retainer {
    pub id: RetainerId,
    pub kind: RetainerKind,
    pub(crate) master: Option<CharacterId>,
    /// Kind this card claims to be while face down.
    pub(crate) bluff: Option<RetainerKind>,
}

impl Retainer {
    #[must_use]
    pub const fn new(id: RetainerId, kind: RetainerKind) -> Self {
        Self {
            id,
            kind,
            master: None,
            bluff: None,
        }
    }

    #[must_use]
    pub const fn master(&self) -> Option<CharacterId> {
        self.master
    }

    /// The kind the table sees: the bluff while face down, else the card itself.
    #[must_use]
    pub const fn appears_as(&self) -> RetainerKind {
        match self.bluff {
            Some(kind) => kind,
            None => self.kind,
        }
    }

    #[must_use]
    pub const fn is_face_down(&self) -> bool {
        self.bluff.is_some()
    }

    pub(crate) const fn attach(&mut self, master: CharacterId, bluff: Option<RetainerKind>) {
        self.master = Some(master);
        self.bluff = bluff;
    }

    /// Turn the card face up. Returns whether a bluff was caught.
    pub(crate) fn reveal(&mut self) -> bool {
        let caught = self.bluff.is_some_and(|claimed| claimed != self.kind);
        self.bluff = None;
        caught
    }

    pub(crate) const fn reset(&mut self) {
        self.master = None;
        self.bluff = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_has_eighteen_cards() {
        let total: usize = RetainerKind::DECK.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 18);
        for kind in RetainerKind::WITH_PERKS {
            assert!(kind.perk().is_some(), "{kind}");
        }
    }

    #[test]
    fn bluff_is_caught_only_on_mismatch() {
        let mut card = Retainer::new(RetainerId(0), RetainerKind::Rogue);
        card.attach(CharacterId(1), Some(RetainerKind::Huntmaster));
        assert_eq!(card.appears_as(), RetainerKind::Huntmaster);
        assert!(card.reveal());
        assert!(!card.is_face_down());
        assert_eq!(card.appears_as(), RetainerKind::Rogue);

        let mut honest = Retainer::new(RetainerId(1), RetainerKind::Monk);
        honest.attach(CharacterId(2), Some(RetainerKind::Monk));
        assert!(!honest.reveal());
        honest.reset();
        assert_eq!(honest.master(), None);
    }
}
