//! A seat at the table: coffer, priorities and owned pieces.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::coffer::{Coffer, Resources};
use crate::effects::Priorities;
use crate::pieces::{CharacterId, PlayerId, WorkerId};

pub type CharacterSet = SmallVec<[CharacterId; 8]>;
pub type WorkerSet = SmallVec<[WorkerId; 4]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub priorities: Priorities,
    pub(crate) coffer: Coffer,
    pub(crate) characters: CharacterSet,
    pub(crate) workers: WorkerSet,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, priorities: Priorities, starting: Resources) -> Self {
        Self {
            id,
            priorities,
            coffer: Coffer::new(starting),
            characters: SmallVec::new(),
            workers: SmallVec::new(),
        }
    }

    #[must_use]
    pub const fn coffer(&self) -> &Coffer {
        &self.coffer
    }

    #[must_use]
    pub fn characters(&self) -> &[CharacterId] {
        &self.characters
    }

    #[must_use]
    pub fn workers(&self) -> &[WorkerId] {
        &self.workers
    }

    pub fn give(&mut self, amounts: Resources) {
        self.coffer.give(amounts);
    }

    /// Clamped at zero; returns what was actually taken.
    pub fn take(&mut self, amounts: Resources) -> Resources {
        self.coffer.take(amounts)
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.coffer)
    }
}
