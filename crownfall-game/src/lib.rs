//! Crownfall Game Engine
//!
//! Rules engine for Crownfall, a political board game in which every seat is
//! played by an agent that scores candidate actions against a fixed priority
//! vector. The crate is synchronous and self-contained: a game is built from
//! a [`GameConfig`] and played to completion in a single call chain.

pub mod actions;
pub mod board;
pub mod buildings;
pub mod calendar;
pub mod coffer;
pub mod config;
pub mod constants;
pub mod containers;
pub mod crises;
pub mod decks;
pub mod effects;
pub mod engine;
pub mod events;
pub mod game;
pub mod names;
pub mod numbers;
pub mod pieces;
pub mod player;
pub mod retainers;
pub mod rng;

// Re-export commonly used types
pub use actions::{Action, ChallengeAction, Command, OfficeActionId, TurnAction};
pub use board::{Board, BoardError, Ctx, UpkeepReport, split_evenly};
pub use buildings::{Building, BuildingKind, BuildingSite, EffectContext};
pub use calendar::Season;
pub use coffer::{Coffer, Resources};
pub use config::{ConfigError, GameConfig};
pub use containers::{Bag, BoundedBox, Container, ContainerError, OverflowPolicy, Ring, Slot};
pub use crises::CrisisKind;
pub use decks::Deck;
pub use effects::{Effects, Priorities};
pub use engine::{Table, execute, legal_actions, office_effects, rank_actions};
pub use events::{EventLog, EventSink, GameEvent, NullSink};
pub use game::{Game, GameError, GameSummary, TerminationReason};
pub use names::{ListNameGenerator, NameGenerator, house_name};
pub use pieces::{
    BuildingId, Character, CharacterId, Gender, Location, Office, PlayerId, RetainerId,
    Sentencing, Worker, WorkerId,
};
pub use player::Player;
pub use retainers::{Perk, Retainer, RetainerKind};
pub use rng::{ChallengeOracle, CoinFlip, CountingRng, FixedOutcome, RngBundle};
