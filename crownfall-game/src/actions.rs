//! Planned actions as tagged command values.
//!
//! Enumeration builds [`Action`]s; the executor in `engine` interprets their
//! [`Command`]s against the board. Effects carried on an action are a scoring
//! estimate only and may differ from what actually happens.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{CHALLENGE_RISK, DELEGATED_PREFIX};
use crate::effects::Effects;
use crate::pieces::{BuildingId, CharacterId, Office, PlayerId, Sentencing, WorkerId};
use crate::retainers::RetainerKind;

/// Keys of the per-round office-action lock table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficeActionId {
    Sentencing,
    Tithe,
    Audit,
    Tax,
    Punish,
    Blackmail,
    Pardon,
    NameHeir,
}

/// Operation plus operands, interpreted by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Build {
        building: BuildingId,
        pos: usize,
        cost: i64,
    },
    PlaceWorker {
        worker: WorkerId,
        building: BuildingId,
    },
    ReallocateWorker {
        worker: WorkerId,
        to: BuildingId,
    },
    PlaceManager {
        character: CharacterId,
        building: BuildingId,
    },
    ReallocateManager {
        character: CharacterId,
        to: BuildingId,
    },
    Takeover {
        character: CharacterId,
        building: BuildingId,
    },
    FailedTakeover {
        character: CharacterId,
        building: BuildingId,
    },
    EnterCourt {
        character: CharacterId,
        seat: usize,
    },
    Campaign {
        character: CharacterId,
    },
    Recall {
        character: CharacterId,
    },
    MoveToOffice {
        character: CharacterId,
        office: Office,
    },
    SetSentencing {
        sentencing: Sentencing,
    },
    Tithe,
    Audit {
        target: PlayerId,
        amount: i64,
    },
    Tax,
    Arrest {
        target: CharacterId,
    },
    FailedArrest,
    Blackmail,
    Pardon {
        prisoner: CharacterId,
    },
    NameHeir {
        character: CharacterId,
    },
    HireRetainer {
        character: CharacterId,
        bluff: Option<RetainerKind>,
    },
    CallRetainer {
        character: CharacterId,
    },
}

impl Command {
    /// The character that acts and becomes locked for the rest of the round.
    #[must_use]
    pub const fn actor(&self) -> Option<CharacterId> {
        match self {
            Self::PlaceManager { character, .. }
            | Self::ReallocateManager { character, .. }
            | Self::Takeover { character, .. }
            | Self::EnterCourt { character, .. }
            | Self::Campaign { character }
            | Self::Recall { character }
            | Self::MoveToOffice { character, .. }
            | Self::CallRetainer { character } => Some(*character),
            _ => None,
        }
    }
}

/// A single deterministic action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnAction {
    pub player: PlayerId,
    /// Past tense, for the event log.
    pub description: String,
    pub command: Command,
    pub effects: Effects,
    /// Office-action lock claimed when this runs.
    pub lock: Option<OfficeActionId>,
}

impl TurnAction {
    pub fn new(
        player: PlayerId,
        description: impl Into<String>,
        command: Command,
        effects: Effects,
    ) -> Self {
        Self {
            player,
            description: description.into(),
            command,
            effects,
            lock: None,
        }
    }

    #[must_use]
    pub fn locking(mut self, lock: OfficeActionId) -> Self {
        self.lock = Some(lock);
        self
    }

    fn from_crown(mut self) -> Self {
        self.description.insert_str(0, DELEGATED_PREFIX);
        self
    }
}

/// Two branches resolved by the challenge oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeAction {
    pub success: TurnAction,
    pub failure: TurnAction,
}

/// A candidate the acting player may choose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Turn(TurnAction),
    Challenge(ChallengeAction),
}

impl Action {
    #[must_use]
    pub fn challenge(success: TurnAction, failure: TurnAction) -> Self {
        Self::Challenge(ChallengeAction { success, failure })
    }

    #[must_use]
    pub const fn player(&self) -> PlayerId {
        match self {
            Self::Turn(action) => action.player,
            Self::Challenge(challenge) => challenge.success.player,
        }
    }

    /// Predicted effects. Challenges add a fixed risk on top of the success branch.
    #[must_use]
    pub fn effects(&self) -> Effects {
        match self {
            Self::Turn(action) => action.effects,
            Self::Challenge(challenge) => challenge.success.effects + Effects::risk(CHALLENGE_RISK),
        }
    }

    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Turn(action) => action.description.clone(),
            Self::Challenge(challenge) => format!(
                "( {} | {} )",
                challenge.success.description, challenge.failure.description
            ),
        }
    }

    /// Mark as issued by the crown on behalf of a subordinate office.
    #[must_use]
    pub fn from_crown(self) -> Self {
        match self {
            Self::Turn(action) => Self::Turn(action.from_crown()),
            Self::Challenge(challenge) => Self::Challenge(ChallengeAction {
                success: challenge.success.from_crown(),
                failure: challenge.failure.from_crown(),
            }),
        }
    }
}

impl From<TurnAction> for Action {
    fn from(action: TurnAction) -> Self {
        Self::Turn(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.player(), self.description())
    }
}
