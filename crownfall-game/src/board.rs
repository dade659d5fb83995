//! The board: piece arenas, containers, offices, decks and the per-round
//! bookkeeping pipeline.
//!
//! Every piece lives in an arena owned here. Containers hold handles and each
//! piece records a location tag; the move helpers keep the two in step so a
//! piece is only ever held by the container its tag names.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::actions::OfficeActionId;
use crate::buildings::{Building, BuildingKind, BuildingSite};
use crate::calendar::Season;
use crate::coffer::{Coffer, Resources};
use crate::constants::{
    BLUFF_PENALTY_PRESTIGE, BUILD_QUEUE_LEN, BUILDING_PLOTS, CAMPAIGN_CAPACITY, CAMPAIGN_FOOD_COST,
    CAMPAIGN_JACKPOT_GOLD, CAMPAIGN_JACKPOT_PRESTIGE, COURT_SEATS, DUNGEON_CAPACITY, FINE_GOLD,
};
use crate::containers::{Bag, BoundedBox, Container, ContainerError, OverflowPolicy, Ring, Slot};
use crate::crises::CrisisKind;
use crate::decks::Deck;
use crate::events::{EventSink, GameEvent};
use crate::numbers::usize_to_i64;
use crate::pieces::{
    BuildingId, Character, CharacterId, Gender, Location, Office, PlayerId, RetainerId,
    Sentencing, Worker, WorkerId,
};
use crate::player::Player;
use crate::retainers::{Perk, Retainer, RetainerKind};
use crate::rng::RngBundle;

/// Failures raised by board mutations. Any of these reaching the game loop
/// means action generation produced something illegal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error("no such piece: {0}")]
    UnknownPiece(String),
    #[error("{0} is not usable")]
    NotUsable(CharacterId),
    #[error("{0} has already acted this round")]
    Locked(CharacterId),
    #[error("{0} is imprisoned and can only leave by pardon or death")]
    Imprisoned(CharacterId),
    #[error("{player} has no free worker")]
    NoFreeWorker { player: PlayerId },
    #[error("{0} is not constructed")]
    NotConstructed(BuildingId),
    #[error("{0} is not in the build queue")]
    NotQueued(BuildingId),
    #[error("{0} unlocks an office and cannot be destroyed")]
    PermanentBuilding(BuildingId),
    #[error("office {0} is not available")]
    OfficeUnavailable(Office),
    #[error("the {0} deck is empty")]
    EmptyDeck(&'static str),
    #[error("invariant violated: {0}")]
    InvariantViolated(String),
}

/// Outcome of one upkeep collection, kept for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepReport {
    pub required: Resources,
    pub from_treasury: Resources,
    /// Amount asked of each player, in seat order.
    pub requested: Vec<Resources>,
    /// Amount each player actually paid, in seat order.
    pub paid: Vec<Resources>,
    pub shortfall: Resources,
    pub crisis: Option<CrisisKind>,
}

/// Shared per-round plumbing: randomness and the event sink.
pub struct Ctx<'a> {
    pub rng: &'a RngBundle,
    pub sink: &'a mut dyn EventSink,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    characters: Vec<Character>,
    workers: Vec<Worker>,
    buildings: Vec<Building>,
    retainers: Vec<Retainer>,

    offices: [Slot<CharacterId>; 6],
    plots: Ring<BuildingId>,
    court: Ring<CharacterId>,
    campaign: BoundedBox<CharacterId>,
    dungeon: BoundedBox<CharacterId>,
    crypt: Bag<CharacterId>,
    build_queue: BoundedBox<BuildingId>,

    building_deck: Deck<BuildingId>,
    retainer_deck: Deck<RetainerId>,
    crisis_deck: Deck<CrisisKind>,

    treasury: Coffer,
    office_locks: HashSet<OfficeActionId>,
    crown_ticker: u32,
    first_crown: Option<bool>,
    season: Season,
    year: u32,
    active_crisis: Option<CrisisKind>,
    past_crises: Vec<CrisisKind>,
    sentencing: Sentencing,
}

impl Board {
    /// Fresh board with shuffled decks and a full build queue.
    #[must_use]
    pub fn new(rng: &RngBundle) -> Self {
        let mut buildings = Vec::new();
        for (kind, copies) in BuildingKind::DECK {
            for _ in 0..copies {
                buildings.push(Building::new(BuildingId(buildings.len()), kind));
            }
        }
        let mut retainers = Vec::new();
        for (kind, copies) in RetainerKind::DECK {
            for _ in 0..copies {
                retainers.push(Retainer::new(RetainerId(retainers.len()), kind));
            }
        }

        let mut building_deck = Deck::from_cards(buildings.iter().map(|b| b.id));
        let mut retainer_deck = Deck::from_cards(retainers.iter().map(|r| r.id));
        let mut crisis_deck = Deck::from_cards(CrisisKind::ALL);
        {
            let mut deck_rng = rng.decks();
            building_deck.shuffle(&mut *deck_rng);
            retainer_deck.shuffle(&mut *deck_rng);
            crisis_deck.shuffle(&mut *deck_rng);
        }

        let mut board = Self {
            characters: Vec::new(),
            workers: Vec::new(),
            buildings,
            retainers,
            offices: Default::default(),
            plots: Ring::new(BUILDING_PLOTS),
            court: Ring::new(COURT_SEATS),
            campaign: BoundedBox::new(CAMPAIGN_CAPACITY, OverflowPolicy::Reject),
            dungeon: BoundedBox::new(DUNGEON_CAPACITY, OverflowPolicy::EvictOldest),
            crypt: Bag::new(),
            build_queue: BoundedBox::new(BUILD_QUEUE_LEN, OverflowPolicy::EvictOldest),
            building_deck,
            retainer_deck,
            crisis_deck,
            treasury: Coffer::default(),
            office_locks: HashSet::new(),
            crown_ticker: 0,
            first_crown: None,
            season: Season::Summer,
            year: 0,
            active_crisis: None,
            past_crises: Vec::new(),
            sentencing: Sentencing::Fine,
        };
        for _ in 0..BUILD_QUEUE_LEN {
            board.advance_build_queue();
        }
        board
    }

    // Arena access ---------------------------------------------------------

    pub(crate) fn add_character(
        &mut self,
        owner: PlayerId,
        name: String,
        gender: Gender,
    ) -> CharacterId {
        let id = CharacterId(self.characters.len());
        self.characters.push(Character::new(id, owner, name, gender));
        id
    }

    pub(crate) fn add_worker(&mut self, owner: PlayerId) -> WorkerId {
        let id = WorkerId(self.workers.len());
        self.workers.push(Worker::new(id, owner));
        id
    }

    /// # Errors
    ///
    /// Returns `BoardError::UnknownPiece` for a handle not in the arena.
    pub fn character(&self, id: CharacterId) -> Result<&Character, BoardError> {
        self.characters
            .get(id.index())
            .ok_or_else(|| BoardError::UnknownPiece(id.to_string()))
    }

    fn character_mut(&mut self, id: CharacterId) -> Result<&mut Character, BoardError> {
        self.characters
            .get_mut(id.index())
            .ok_or_else(|| BoardError::UnknownPiece(id.to_string()))
    }

    /// # Errors
    ///
    /// Returns `BoardError::UnknownPiece` for a handle not in the arena.
    pub fn worker(&self, id: WorkerId) -> Result<&Worker, BoardError> {
        self.workers
            .get(id.index())
            .ok_or_else(|| BoardError::UnknownPiece(id.to_string()))
    }

    /// # Errors
    ///
    /// Returns `BoardError::UnknownPiece` for a handle not in the arena.
    pub fn building(&self, id: BuildingId) -> Result<&Building, BoardError> {
        self.buildings
            .get(id.index())
            .ok_or_else(|| BoardError::UnknownPiece(id.to_string()))
    }

    fn building_mut(&mut self, id: BuildingId) -> Result<&mut Building, BoardError> {
        self.buildings
            .get_mut(id.index())
            .ok_or_else(|| BoardError::UnknownPiece(id.to_string()))
    }

    /// # Errors
    ///
    /// Returns `BoardError::UnknownPiece` for a handle not in the arena.
    pub fn retainer(&self, id: RetainerId) -> Result<&Retainer, BoardError> {
        self.retainers
            .get(id.index())
            .ok_or_else(|| BoardError::UnknownPiece(id.to_string()))
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter()
    }

    pub fn workers(&self) -> impl Iterator<Item = &Worker> {
        self.workers.iter()
    }

    // Read-only state ------------------------------------------------------

    #[must_use]
    pub const fn season(&self) -> Season {
        self.season
    }

    #[must_use]
    pub const fn year(&self) -> u32 {
        self.year
    }

    #[must_use]
    pub const fn sentencing(&self) -> Sentencing {
        self.sentencing
    }

    #[must_use]
    pub const fn treasury(&self) -> &Coffer {
        &self.treasury
    }

    pub fn treasury_mut(&mut self) -> &mut Coffer {
        &mut self.treasury
    }

    #[must_use]
    pub const fn crown_ticker(&self) -> u32 {
        self.crown_ticker
    }

    /// `None` before anyone was ever crowned, then `Some(true)` for the first
    /// reign only.
    #[must_use]
    pub const fn first_crown(&self) -> Option<bool> {
        self.first_crown
    }

    #[must_use]
    pub const fn active_crisis(&self) -> Option<CrisisKind> {
        self.active_crisis
    }

    #[must_use]
    pub fn past_crises(&self) -> &[CrisisKind] {
        &self.past_crises
    }

    /// Crises that have struck so far, including the active one.
    #[must_use]
    pub fn crisis_count(&self) -> usize {
        self.past_crises.len() + usize::from(self.active_crisis.is_some())
    }

    #[must_use]
    pub const fn court(&self) -> &Ring<CharacterId> {
        &self.court
    }

    #[must_use]
    pub const fn plots(&self) -> &Ring<BuildingId> {
        &self.plots
    }

    #[must_use]
    pub const fn campaign(&self) -> &BoundedBox<CharacterId> {
        &self.campaign
    }

    #[must_use]
    pub const fn dungeon(&self) -> &BoundedBox<CharacterId> {
        &self.dungeon
    }

    #[must_use]
    pub const fn crypt(&self) -> &Bag<CharacterId> {
        &self.crypt
    }

    #[must_use]
    pub const fn building_deck(&self) -> &Deck<BuildingId> {
        &self.building_deck
    }

    #[must_use]
    pub const fn retainer_deck(&self) -> &Deck<RetainerId> {
        &self.retainer_deck
    }

    #[must_use]
    pub fn office_holder(&self, office: Office) -> Option<CharacterId> {
        self.offices[office.index()].get()
    }

    /// Player whose character holds `office`.
    #[must_use]
    pub fn office_player(&self, office: Office) -> Option<PlayerId> {
        self.office_holder(office)
            .and_then(|id| self.character(id).ok())
            .map(|c| c.owner)
    }

    #[must_use]
    pub fn has_office(&self, player: PlayerId, office: Office) -> bool {
        self.office_player(office) == Some(player)
    }

    /// Crown and heir are always open; the rest need their building standing.
    #[must_use]
    pub fn office_available(&self, office: Office) -> bool {
        match office {
            Office::Crown | Office::Heir => true,
            _ => self
                .constructed()
                .any(|b| b.kind.office_unlock() == Some(office)),
        }
    }

    #[must_use]
    pub fn office_action_available(&self, id: OfficeActionId) -> bool {
        !self.office_locks.contains(&id)
    }

    pub(crate) fn lock_office_action(&mut self, id: OfficeActionId) {
        self.office_locks.insert(id);
    }

    /// Constructed buildings in plot order.
    pub fn constructed(&self) -> impl Iterator<Item = &Building> {
        self.plots
            .occupied()
            .filter_map(|(_, id)| self.buildings.get(id.index()))
    }

    /// Build queue entries with their price: base cost plus position + 1.
    #[must_use]
    pub fn build_queue(&self) -> Vec<(BuildingId, i64)> {
        self.build_queue
            .as_slice()
            .iter()
            .enumerate()
            .filter_map(|(pos, id)| {
                self.buildings
                    .get(id.index())
                    .map(|b| (*id, b.kind.cost() + usize_to_i64(pos) + 1))
            })
            .collect()
    }

    /// Realm upkeep: one gold and one food per constructed building.
    #[must_use]
    pub fn realm_upkeep(&self) -> Resources {
        let n = usize_to_i64(self.plots.occupied().count());
        Resources::new(n, n, 0)
    }

    pub fn owner_of_worker(&self, worker: WorkerId) -> Option<PlayerId> {
        self.workers.get(worker.index()).map(|w| w.owner)
    }

    /// Workers `player` has in `building`.
    #[must_use]
    pub fn workers_in(&self, building: &Building, player: PlayerId) -> usize {
        building
            .workers()
            .iter()
            .filter(|w| self.owner_of_worker(**w) == Some(player))
            .count()
    }

    /// Whether `player` has a worker in, or manages, a building of `kind`.
    #[must_use]
    pub fn has_presence(&self, player: PlayerId, kind: BuildingKind) -> bool {
        self.constructed().filter(|b| b.kind == kind).any(|b| {
            self.workers_in(b, player) > 0
                || b.manager()
                    .and_then(|m| self.character(m).ok())
                    .is_some_and(|m| m.owner == player)
        })
    }

    /// Whether `player` has a worker in a building of `kind`.
    #[must_use]
    pub fn works_in(&self, player: PlayerId, kind: BuildingKind) -> bool {
        self.constructed()
            .filter(|b| b.kind == kind)
            .any(|b| self.workers_in(b, player) > 0)
    }

    #[must_use]
    pub fn has_usable_characters(&self, player: PlayerId) -> bool {
        self.characters
            .iter()
            .any(|c| c.owner == player && c.is_usable())
    }

    // Character movement ---------------------------------------------------

    /// Move a character, re-parenting it atomically.
    ///
    /// The destination is checked before the character leaves its current
    /// container, so a refused move changes nothing. Vacating the crown seats
    /// a waiting heir immediately.
    ///
    /// The dead never move again and prisoners only leave for the crypt;
    /// see [`Board::pardon`] for the other way out of the dungeon.
    ///
    /// # Errors
    ///
    /// Returns `BoardError` when the character may not leave where it is or
    /// the destination refuses it.
    pub fn move_character(
        &mut self,
        id: CharacterId,
        dest: Location,
        sink: &mut dyn EventSink,
    ) -> Result<(), BoardError> {
        let from = self.character(id)?.location;
        if from == dest {
            return Ok(());
        }
        match from {
            Location::Crypt => return Err(BoardError::NotUsable(id)),
            Location::Dungeon if dest != Location::Crypt => {
                return Err(BoardError::Imprisoned(id));
            }
            _ => {}
        }
        self.relocate(id, from, dest, sink)
    }

    /// Release a prisoner back to its owner's hand.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::InvariantViolated` if `id` is not in the dungeon.
    pub fn pardon(&mut self, id: CharacterId, sink: &mut dyn EventSink) -> Result<(), BoardError> {
        let from = self.character(id)?.location;
        if from != Location::Dungeon {
            return Err(BoardError::InvariantViolated(format!(
                "{id} is pardoned from the {} rather than the dungeon",
                from.label()
            )));
        }
        self.relocate(id, from, Location::Hand, sink)
    }

    fn relocate(
        &mut self,
        id: CharacterId,
        from: Location,
        dest: Location,
        sink: &mut dyn EventSink,
    ) -> Result<(), BoardError> {
        self.check_destination(dest)?;
        self.detach_character(id, from)?;
        self.attach_character(id, dest, sink)?;

        if dest == Location::Office(Office::Crown) {
            self.new_crown();
        }
        if from == Location::Office(Office::Crown) {
            self.promote_heir(sink)?;
        }
        Ok(())
    }

    fn check_destination(&self, dest: Location) -> Result<(), BoardError> {
        match dest {
            Location::Hand | Location::Crypt | Location::Dungeon => Ok(()),
            Location::Court(seat) => match self.court.get(seat) {
                None if seat < self.court.size() => Ok(()),
                None => Err(ContainerError::OutOfRange {
                    pos: seat,
                    len: self.court.size(),
                }
                .into()),
                Some(_) => Err(ContainerError::Occupied.into()),
            },
            Location::Campaign => {
                if self.campaign.is_full() {
                    Err(ContainerError::Capacity {
                        capacity: self.campaign.capacity(),
                    }
                    .into())
                } else {
                    Ok(())
                }
            }
            Location::Office(office) => {
                if !self.office_available(office) {
                    Err(BoardError::OfficeUnavailable(office))
                } else if self.offices[office.index()].is_vacant() {
                    Ok(())
                } else {
                    Err(ContainerError::Occupied.into())
                }
            }
            Location::Building(building) => {
                let b = self.building(building)?;
                if !b.is_constructed() {
                    Err(BoardError::NotConstructed(building))
                } else if b.manager().is_some() {
                    Err(ContainerError::Occupied.into())
                } else {
                    Ok(())
                }
            }
        }
    }

    fn detach_character(&mut self, id: CharacterId, from: Location) -> Result<(), BoardError> {
        let removed = match from {
            Location::Hand => true,
            Location::Court(_) => self.court.remove(id),
            Location::Campaign => self.campaign.remove(id),
            Location::Dungeon => self.dungeon.remove(id),
            Location::Crypt => self.crypt.remove(id),
            Location::Office(office) => self.offices[office.index()].remove(id),
            Location::Building(building) => self.building_mut(building)?.manager.remove(id),
        };
        if !removed {
            return Err(BoardError::InvariantViolated(format!(
                "{id} claims to be in {} but is not there",
                from.label()
            )));
        }
        self.character_mut(id)?.location = Location::Hand;
        Ok(())
    }

    fn attach_character(
        &mut self,
        id: CharacterId,
        dest: Location,
        sink: &mut dyn EventSink,
    ) -> Result<(), BoardError> {
        match dest {
            Location::Hand => {}
            Location::Court(seat) => self.court.set(id, seat)?,
            Location::Campaign => {
                self.campaign.insert(id)?;
            }
            Location::Dungeon => {
                let evicted = self.dungeon.insert(id)?;
                for prisoner in evicted {
                    self.bury(prisoner)?;
                    sink.record(GameEvent::game(format!(
                        "{} died in an overcrowded dungeon",
                        self.character(prisoner)?.name
                    )));
                }
            }
            Location::Crypt => self.crypt.add(id),
            Location::Office(office) => self.offices[office.index()].set(id)?,
            Location::Building(building) => self.building_mut(building)?.manager.set(id)?,
        }
        self.character_mut(id)?.location = dest;
        Ok(())
    }

    /// Lay an already detached character in the crypt.
    fn bury(&mut self, id: CharacterId) -> Result<(), BoardError> {
        self.reshuffle_retainer(id)?;
        self.crypt.add(id);
        let character = self.character_mut(id)?;
        character.location = Location::Crypt;
        log::debug!("{} ({}) buried", character.name, character.owner);
        Ok(())
    }

    fn new_crown(&mut self) {
        self.crown_ticker = 0;
        self.first_crown = Some(self.first_crown.is_none());
    }

    fn promote_heir(&mut self, sink: &mut dyn EventSink) -> Result<(), BoardError> {
        if self.offices[Office::Crown.index()].get().is_some() {
            return Ok(());
        }
        let Some(heir) = self.office_holder(Office::Heir) else {
            return Ok(());
        };
        self.detach_character(heir, Location::Office(Office::Heir))?;
        self.attach_character(heir, Location::Office(Office::Crown), sink)?;
        self.new_crown();
        let character = self.character(heir)?;
        let message = format!(
            "{} ({}) has succeeded to the throne",
            character.name, character.owner
        );
        log::debug!("{message}");
        sink.record(GameEvent::game(message));
        Ok(())
    }

    /// Kill a character: its retainer goes back to the deck and it is moved
    /// to the crypt for good. Killing the dead is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates movement failures.
    pub fn kill(&mut self, id: CharacterId, sink: &mut dyn EventSink) -> Result<(), BoardError> {
        let character = self.character(id)?;
        if character.location == Location::Crypt {
            return Ok(());
        }
        let message = format!("{} ({}) has died", character.name, character.owner);
        self.reshuffle_retainer(id)?;
        self.move_character(id, Location::Crypt, sink)?;
        sink.record(GameEvent::game(message));
        Ok(())
    }

    /// Apply the current sentencing policy to a character.
    ///
    /// A face-down retainer is revealed first; a caught bluff costs the
    /// owner prestige.
    ///
    /// # Errors
    ///
    /// Propagates movement failures.
    pub fn punish(
        &mut self,
        id: CharacterId,
        players: &mut [Player],
        sink: &mut dyn EventSink,
    ) -> Result<(), BoardError> {
        self.reveal_retainer(id, players, sink)?;
        let owner = self.character(id)?.owner;
        match self.sentencing {
            Sentencing::Fine => {
                let fined = player_mut(players, owner)?.take(Resources::gold(FINE_GOLD));
                if let Some(priest) = self.office_player(Office::Priest) {
                    player_mut(players, priest)?.give(fined);
                }
            }
            Sentencing::Prison => self.move_character(id, Location::Dungeon, sink)?,
            Sentencing::Death => self.kill(id, sink)?,
        }
        Ok(())
    }

    pub(crate) fn lock_character(&mut self, id: CharacterId) -> Result<(), BoardError> {
        self.character_mut(id)?.locked = true;
        Ok(())
    }

    pub(crate) fn set_sentencing(&mut self, sentencing: Sentencing) {
        self.sentencing = sentencing;
    }

    // Workers --------------------------------------------------------------

    /// Put a worker into a constructed building, pulling it from wherever it was.
    ///
    /// # Errors
    ///
    /// Returns `BoardError` when the building is unbuilt or full.
    pub fn place_worker(&mut self, worker: WorkerId, building: BuildingId) -> Result<(), BoardError> {
        let target = self.building(building)?;
        if !target.is_constructed() {
            return Err(BoardError::NotConstructed(building));
        }
        if !target.has_worker_room() {
            return Err(ContainerError::Capacity {
                capacity: target.kind.worker_capacity(),
            }
            .into());
        }
        self.return_worker(worker)?;
        self.building_mut(building)?.workers.insert(worker)?;
        self.workers
            .get_mut(worker.index())
            .ok_or_else(|| BoardError::UnknownPiece(worker.to_string()))?
            .building = Some(building);
        Ok(())
    }

    /// Send a worker back to its owner's hand.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::UnknownPiece` for a handle not in the arena.
    pub fn return_worker(&mut self, worker: WorkerId) -> Result<(), BoardError> {
        let current = self.worker(worker)?.building;
        if let Some(building) = current {
            self.building_mut(building)?.workers.remove(worker);
        }
        self.workers
            .get_mut(worker.index())
            .ok_or_else(|| BoardError::UnknownPiece(worker.to_string()))?
            .building = None;
        Ok(())
    }

    // Buildings ------------------------------------------------------------

    /// Draw the next building card into the back of the build queue.
    ///
    /// If the queue were full the front card would be tucked back into the
    /// deck to make room.
    pub(crate) fn advance_build_queue(&mut self) {
        let Some(card) = self.building_deck.draw() else {
            log::debug!("building deck exhausted");
            return;
        };
        let deck = &mut self.building_deck;
        let result = self.build_queue.insert_with(card, |_, queued| {
            if queued.is_empty() {
                return Ok(Vec::new());
            }
            let front = queued.remove(0);
            deck.tuck(front);
            Ok(vec![front])
        });
        match result {
            Ok(evicted) => {
                for id in evicted {
                    if let Some(b) = self.buildings.get_mut(id.index()) {
                        b.site = BuildingSite::Deck;
                    }
                }
                if let Some(b) = self.buildings.get_mut(card.index()) {
                    b.site = BuildingSite::Queue;
                }
            }
            Err(err) => {
                log::warn!("could not queue {card}: {err}");
                self.building_deck.tuck(card);
            }
        }
    }

    /// Move a queued building onto a free plot and refill the queue.
    ///
    /// # Errors
    ///
    /// Returns `BoardError` when the card is not queued or the plot is taken.
    pub fn construct(&mut self, building: BuildingId, pos: usize) -> Result<(), BoardError> {
        if !self.build_queue.contains(building) {
            return Err(BoardError::NotQueued(building));
        }
        self.plots.set(building, pos)?;
        self.build_queue.remove(building);
        self.building_mut(building)?.site = BuildingSite::Plot(pos);
        self.advance_build_queue();
        Ok(())
    }

    /// Tear a building down: its manager dies, workers go home and the card
    /// is reset and tucked into the deck. Office-unlocking buildings are
    /// permanent.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::PermanentBuilding` or `BoardError::NotConstructed`.
    pub fn destroy_building(
        &mut self,
        building: BuildingId,
        sink: &mut dyn EventSink,
    ) -> Result<(), BoardError> {
        let target = self.building(building)?;
        if target.kind.office_unlock().is_some() {
            return Err(BoardError::PermanentBuilding(building));
        }
        if !target.is_constructed() {
            return Err(BoardError::NotConstructed(building));
        }
        let kind = target.kind;
        let manager = target.manager();
        let workers = target.workers().to_vec();
        if let Some(manager) = manager {
            self.kill(manager, sink)?;
        }
        for worker in workers {
            self.return_worker(worker)?;
        }
        self.plots.remove(building);
        self.building_mut(building)?.reset();
        self.building_deck.tuck(building);
        sink.record(GameEvent::game(format!("The {kind} was destroyed")));
        Ok(())
    }

    /// Vacate a building and install a new manager, locking it until next year.
    ///
    /// # Errors
    ///
    /// Propagates movement failures.
    pub fn take_over(
        &mut self,
        building: BuildingId,
        challenger: CharacterId,
        sink: &mut dyn EventSink,
    ) -> Result<(), BoardError> {
        let target = self.building(building)?;
        let manager = target.manager();
        let workers = target.workers().to_vec();
        if let Some(manager) = manager {
            self.move_character(manager, Location::Hand, sink)?;
        }
        for worker in workers {
            self.return_worker(worker)?;
        }
        self.move_character(challenger, Location::Building(building), sink)?;
        self.building_mut(building)?.locked = true;
        Ok(())
    }

    pub(crate) fn lock_building(&mut self, building: BuildingId) -> Result<(), BoardError> {
        self.building_mut(building)?.locked = true;
        Ok(())
    }

    // Retainers ------------------------------------------------------------

    /// Draw a retainer onto a character, optionally face down as `bluff`.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::EmptyDeck` or `ContainerError::Occupied`.
    pub fn hire_retainer(
        &mut self,
        character: CharacterId,
        bluff: Option<RetainerKind>,
    ) -> Result<RetainerId, BoardError> {
        if self.character(character)?.retainer().is_some() {
            return Err(ContainerError::Occupied.into());
        }
        let card = self
            .retainer_deck
            .draw()
            .ok_or(BoardError::EmptyDeck("retainer"))?;
        self.character_mut(character)?.retainer.set(card)?;
        self.retainers
            .get_mut(card.index())
            .ok_or_else(|| BoardError::UnknownPiece(card.to_string()))?
            .attach(character, bluff);
        Ok(card)
    }

    fn reshuffle_retainer(&mut self, character: CharacterId) -> Result<(), BoardError> {
        let Some(card) = self.character_mut(character)?.retainer.clear() else {
            return Ok(());
        };
        if let Some(retainer) = self.retainers.get_mut(card.index()) {
            retainer.reset();
        }
        self.retainer_deck.tuck(card);
        Ok(())
    }

    fn reveal_retainer(
        &mut self,
        character: CharacterId,
        players: &mut [Player],
        sink: &mut dyn EventSink,
    ) -> Result<(), BoardError> {
        let master = self.character(character)?;
        let owner = master.owner;
        let Some(card) = master.retainer() else {
            return Ok(());
        };
        let retainer = self
            .retainers
            .get_mut(card.index())
            .ok_or_else(|| BoardError::UnknownPiece(card.to_string()))?;
        let claimed = retainer.appears_as();
        if retainer.reveal() {
            let kind = retainer.kind;
            player_mut(players, owner)?.take(Resources::prestige(BLUFF_PENALTY_PRESTIGE));
            sink.record(GameEvent::game(format!(
                "{owner} was caught bluffing: the {claimed} was a {kind}"
            )));
        }
        Ok(())
    }

    /// Court characters seated next to `character`.
    #[must_use]
    pub fn court_neighbours(&self, character: CharacterId) -> Vec<CharacterId> {
        match self.court.index_of(character) {
            Some(seat) => self.court.neighbours(seat),
            None => Vec::new(),
        }
    }

    /// Call on a character's retainer. Returns what the owner gained.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::InvariantViolated` if there is nothing to call on.
    pub fn call_retainer(
        &mut self,
        character: CharacterId,
        players: &mut [Player],
    ) -> Result<Resources, BoardError> {
        let master = self.character(character)?;
        let owner = master.owner;
        let card = master
            .retainer()
            .ok_or_else(|| BoardError::InvariantViolated(format!("{character} has no retainer")))?;
        let perk = self.retainer(card)?.appears_as().perk().ok_or_else(|| {
            BoardError::InvariantViolated(format!("retainer {card} has no perk"))
        })?;
        let gained = match perk {
            Perk::Gift(amount) => amount,
            Perk::PerNeighbour(gold) => {
                let mut total = Resources::default();
                for neighbour in self.court_neighbours(character) {
                    let victim = self.character(neighbour)?.owner;
                    let taken = player_mut(players, victim)?.take(Resources::gold(gold));
                    total = Resources::new(total.gold + taken.gold, 0, 0);
                }
                total
            }
        };
        player_mut(players, owner)?.give(gained);
        Ok(gained)
    }

    // Bookkeeping ----------------------------------------------------------

    /// End-of-round pipeline, run once after every player has acted.
    ///
    /// # Errors
    ///
    /// Propagates movement failures from deaths and crises.
    pub fn bookkeeping(&mut self, players: &mut [Player], ctx: &mut Ctx<'_>) -> Result<(), BoardError> {
        self.resolve_campaigns(players, ctx)?;
        self.distribute_output(players)?;
        if self.season == Season::Winter {
            self.year += 1;
            if let Some(crisis) = self.active_crisis.take() {
                self.past_crises.push(crisis);
            }
            for building in &mut self.buildings {
                building.locked = false;
            }
            self.collect_upkeep(players, ctx)?;
        }
        for character in &mut self.characters {
            character.locked = false;
        }
        self.season = self.season.next();
        self.office_locks.clear();
        if self.offices[Office::Crown.index()].get().is_some() {
            self.crown_ticker += 1;
        }
        Ok(())
    }

    fn resolve_campaigns(&mut self, players: &mut [Player], ctx: &mut Ctx<'_>) -> Result<(), BoardError> {
        let campaigners = self.campaign.as_slice().to_vec();
        for id in campaigners {
            let character = self.character(id)?;
            let owner = character.owner;
            let name = character.name.clone();
            let player = player_mut(players, owner)?;
            if player.coffer().food() < CAMPAIGN_FOOD_COST {
                self.kill(id, ctx.sink)?;
                ctx.sink.record(GameEvent::player(
                    owner,
                    format!("lost {name}, who starved to death on campaign"),
                ));
                continue;
            }
            player.take(Resources::food(CAMPAIGN_FOOD_COST));
            let roll = ctx.rng.roll_d6();
            match roll {
                1 => {
                    self.kill(id, ctx.sink)?;
                    ctx.sink.record(GameEvent::player(
                        owner,
                        format!("lost {name}, who died on campaign"),
                    ));
                }
                2..=5 => player.give(Resources::gold(i64::from(roll) + 1)),
                _ => player.give(Resources::new(
                    CAMPAIGN_JACKPOT_GOLD,
                    0,
                    CAMPAIGN_JACKPOT_PRESTIGE,
                )),
            }
        }
        Ok(())
    }

    fn distribute_output(&mut self, players: &mut [Player]) -> Result<(), BoardError> {
        let blight = self.active_crisis == Some(CrisisKind::Blight);
        let mut payouts = Vec::new();
        for building in self.constructed() {
            let manager_owner = building
                .manager()
                .and_then(|m| self.character(m).ok())
                .map(|m| m.owner);
            let owner_of = |w: WorkerId| self.owner_of_worker(w).unwrap_or(PlayerId(usize::MAX));
            payouts.extend(building.payouts(owner_of, manager_owner, self.season, blight));
        }
        for (player, amount) in payouts {
            player_mut(players, player)?.give(amount);
        }
        Ok(())
    }

    /// Collect realm upkeep: the treasury pays first, the rest is split
    /// across players, and any shortfall sets off a crisis.
    ///
    /// # Errors
    ///
    /// Propagates failures from the crisis, if one fires.
    pub fn collect_upkeep(
        &mut self,
        players: &mut [Player],
        ctx: &mut Ctx<'_>,
    ) -> Result<UpkeepReport, BoardError> {
        let required = self.realm_upkeep();
        let from_treasury = self.treasury.take(required);
        let remainder = Resources::new(
            required.gold - from_treasury.gold,
            required.food - from_treasury.food,
            0,
        );
        ctx.sink.record(GameEvent::game(format!(
            "Upkeep due: {} gold & {} food, {} gold & {} food paid by the treasury",
            required.gold, required.food, from_treasury.gold, from_treasury.food
        )));

        let requested = split_evenly(remainder, players.len());
        let mut paid = Vec::with_capacity(players.len());
        for (player, request) in players.iter_mut().zip(&requested) {
            paid.push(player.take(*request));
        }
        let contributed = paid.iter().fold(Resources::default(), |acc, p| {
            Resources::new(acc.gold + p.gold, acc.food + p.food, 0)
        });
        let shortfall = Resources::new(
            remainder.gold - contributed.gold,
            remainder.food - contributed.food,
            0,
        );

        let crisis = if shortfall.total() > 0 {
            log::warn!(
                "upkeep short by {} gold & {} food",
                shortfall.gold,
                shortfall.food
            );
            ctx.sink.record(GameEvent::game(
                "Players didn't contribute enough upkeep".to_string(),
            ));
            self.activate_crisis(players, ctx)?
        } else {
            ctx.sink.record(GameEvent::game(
                "Players have contributed enough upkeep. The realm is safe (for now...)"
                    .to_string(),
            ));
            None
        };

        Ok(UpkeepReport {
            required,
            from_treasury,
            requested,
            paid,
            shortfall,
            crisis,
        })
    }

    /// Draw the next crisis and apply it.
    ///
    /// # Errors
    ///
    /// Propagates failures from the deaths it causes.
    pub fn activate_crisis(
        &mut self,
        players: &mut [Player],
        ctx: &mut Ctx<'_>,
    ) -> Result<Option<CrisisKind>, BoardError> {
        let Some(crisis) = self.crisis_deck.draw() else {
            log::warn!("crisis deck exhausted");
            ctx.sink
                .record(GameEvent::debug("crisis deck is empty, nothing drawn"));
            return Ok(None);
        };
        if let Some(previous) = self.active_crisis.replace(crisis) {
            self.past_crises.push(previous);
        }
        log::warn!("crisis: {crisis}");
        ctx.sink.record(GameEvent::game(crisis.announcement()));

        match crisis {
            CrisisKind::Regicide => {
                if let Some(crown) = self.office_holder(Office::Crown) {
                    self.kill(crown, ctx.sink)?;
                }
            }
            CrisisKind::Blight => {}
            CrisisKind::Plague => {
                for player in players.iter() {
                    if self.works_in(player.id, BuildingKind::Apothecary) {
                        continue;
                    }
                    let victims: Vec<CharacterId> = player
                        .characters()
                        .iter()
                        .copied()
                        .filter(|c| self.character(*c).is_ok_and(Character::is_usable))
                        .take(2)
                        .collect();
                    for victim in victims {
                        self.kill(victim, ctx.sink)?;
                    }
                }
            }
            CrisisKind::Powderplot => {
                let mut victims: Vec<CharacterId> =
                    self.court.occupied().map(|(_, c)| c).collect();
                for office in [
                    Office::Crown,
                    Office::Priest,
                    Office::Commander,
                    Office::Treasurer,
                    Office::Spymaster,
                ] {
                    victims.extend(self.office_holder(office));
                }
                for victim in victims {
                    self.kill(victim, ctx.sink)?;
                }
            }
        }
        Ok(Some(crisis))
    }

    // Invariants -----------------------------------------------------------

    /// Cross-check every piece's location tag against the containers.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::InvariantViolated` describing the first mismatch.
    pub fn check_invariants(&self) -> Result<(), BoardError> {
        for character in &self.characters {
            let id = character.id;
            let holders = [
                self.court.contains(id),
                self.campaign.contains(id),
                self.dungeon.contains(id),
                self.crypt.contains(id),
            ]
            .into_iter()
            .chain(self.offices.iter().map(|slot| slot.contains(id)))
            .chain(self.buildings.iter().map(|b| b.manager.contains(id)))
            .filter(|held| *held)
            .count();
            let expected = usize::from(character.location != Location::Hand);
            if holders != expected {
                return Err(BoardError::InvariantViolated(format!(
                    "{id} at {} is held by {holders} containers",
                    character.location.label()
                )));
            }
            let consistent = match character.location {
                Location::Hand => true,
                Location::Court(seat) => self.court.get(seat) == Some(id),
                Location::Campaign => self.campaign.contains(id),
                Location::Dungeon => self.dungeon.contains(id),
                Location::Crypt => self.crypt.contains(id),
                Location::Office(office) => self.offices[office.index()].get() == Some(id),
                Location::Building(b) => self.building(b)?.manager() == Some(id),
            };
            if !consistent {
                return Err(BoardError::InvariantViolated(format!(
                    "{id} is not where its tag says ({})",
                    character.location.label()
                )));
            }
            if let Some(card) = character.retainer() {
                if self.retainer(card)?.master() != Some(id) {
                    return Err(BoardError::InvariantViolated(format!(
                        "retainer {card} does not serve {id}"
                    )));
                }
            }
        }
        for worker in &self.workers {
            let holders = self
                .buildings
                .iter()
                .filter(|b| b.contains_worker(worker.id))
                .count();
            let consistent = match worker.building {
                None => holders == 0,
                Some(b) => holders == 1 && self.building(b)?.contains_worker(worker.id),
            };
            if !consistent {
                return Err(BoardError::InvariantViolated(format!(
                    "{} is held by {holders} buildings",
                    worker.id
                )));
            }
        }
        for building in &self.buildings {
            let id = building.id;
            let places = [
                self.plots.contains(id),
                self.build_queue.contains(id),
                self.building_deck.contains(id),
            ];
            let consistent = places.iter().filter(|p| **p).count() == 1
                && match building.site {
                    BuildingSite::Deck => places[2],
                    BuildingSite::Queue => places[1],
                    BuildingSite::Plot(pos) => self.plots.get(pos) == Some(id),
                };
            if !consistent {
                return Err(BoardError::InvariantViolated(format!(
                    "{id} is misplaced ({:?})",
                    building.site
                )));
            }
        }
        if self.dungeon.len() > self.dungeon.capacity()
            || self.campaign.len() > self.campaign.capacity()
            || self.build_queue.len() > self.build_queue.capacity()
        {
            return Err(BoardError::InvariantViolated(
                "a bounded box exceeds its capacity".to_string(),
            ));
        }
        Ok(())
    }

    /// Rearrange the build queue to hold exactly `ids`, for staged scenarios.
    #[cfg(test)]
    pub(crate) fn stage_build_queue(&mut self, ids: &[BuildingId]) {
        for queued in self.build_queue.contents() {
            self.build_queue.remove(queued);
            self.building_deck.tuck(queued);
            self.buildings[queued.index()].site = BuildingSite::Deck;
        }
        for id in ids {
            let mut rest: Vec<BuildingId> = self.building_deck.as_slice().to_vec();
            rest.retain(|card| card != id);
            self.building_deck = Deck::from_cards(rest);
            let _ = self.build_queue.insert(*id);
            self.buildings[id.index()].site = BuildingSite::Queue;
        }
    }

    /// Put `kind` on top of the crisis deck.
    #[cfg(test)]
    pub(crate) fn stage_crisis(&mut self, kind: CrisisKind) {
        let mut rest: Vec<CrisisKind> = self.crisis_deck.as_slice().to_vec();
        rest.retain(|card| *card != kind);
        rest.push(kind);
        self.crisis_deck = Deck::from_cards(rest);
    }

    #[cfg(test)]
    pub(crate) fn first_of_kind(&self, kind: BuildingKind) -> Option<BuildingId> {
        self.buildings.iter().find(|b| b.kind == kind).map(|b| b.id)
    }
}

/// Split `amount` across `players`, handing any remainder out one unit at a
/// time to the earliest seats so the requests add up exactly.
#[must_use]
pub fn split_evenly(amount: Resources, players: usize) -> Vec<Resources> {
    if players == 0 {
        return Vec::new();
    }
    let n = usize_to_i64(players);
    let share = |total: i64, seat: i64| total / n + i64::from(seat < total % n);
    (0..n)
        .map(|seat| Resources::new(share(amount.gold, seat), share(amount.food, seat), 0))
        .collect()
}

pub(crate) fn player_mut(players: &mut [Player], id: PlayerId) -> Result<&mut Player, BoardError> {
    players
        .get_mut(id.index())
        .ok_or_else(|| BoardError::UnknownPiece(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Priorities;
    use crate::events::{EventLog, NullSink};

    fn setup(seed: u64, seats: usize) -> (Board, Vec<Player>, RngBundle) {
        let rng = RngBundle::from_user_seed(seed);
        let mut board = Board::new(&rng);
        let mut players = Vec::new();
        for seat in 0..seats {
            let id = PlayerId(seat);
            let mut player = Player::new(id, Priorities::default(), Resources::new(20, 6, 6));
            for n in 0..4 {
                let name = format!("Lady {seat}-{n}");
                player.characters.push(board.add_character(id, name, Gender::Female));
            }
            for _ in 0..2 {
                player.workers.push(board.add_worker(id));
            }
            players.push(player);
        }
        (board, players, rng)
    }

    fn raise(board: &mut Board, kind: BuildingKind, pos: usize) -> BuildingId {
        let id = board.first_of_kind(kind).unwrap();
        board.stage_build_queue(&[id]);
        board.construct(id, pos).unwrap();
        id
    }

    fn go(board: &mut Board, id: CharacterId, to: Location) {
        board.move_character(id, to, &mut NullSink).unwrap();
    }

    #[test]
    fn new_board_is_consistent() {
        let (board, _, _) = setup(1, 2);
        assert_eq!(board.build_queue().len(), BUILD_QUEUE_LEN);
        assert_eq!(board.building_deck().len(), 17 - BUILD_QUEUE_LEN);
        assert_eq!(board.retainer_deck().len(), 18);
        assert_eq!(board.season(), Season::Summer);
        assert_eq!(board.year(), 0);
        assert!(board.office_available(Office::Crown));
        assert!(!board.office_available(Office::Priest));
        board.check_invariants().unwrap();
    }

    #[test]
    fn moves_keep_a_single_holder() {
        let (mut board, players, _) = setup(2, 2);
        let ada = players[0].characters()[0];
        go(&mut board, ada, Location::Court(4));
        go(&mut board, ada, Location::Campaign);
        assert!(!board.court().contains(ada));
        assert!(board.campaign().contains(ada));
        board.check_invariants().unwrap();

        let other = players[1].characters()[0];
        go(&mut board, other, Location::Court(0));
        assert_eq!(
            board.move_character(ada, Location::Court(0), &mut NullSink),
            Err(BoardError::Container(ContainerError::Occupied))
        );
        assert_eq!(board.character(ada).unwrap().location(), Location::Campaign);
        assert_eq!(
            board.move_character(ada, Location::Office(Office::Priest), &mut NullSink),
            Err(BoardError::OfficeUnavailable(Office::Priest))
        );
    }

    #[test]
    fn corrupted_tags_are_reported() {
        let (mut board, players, _) = setup(3, 2);
        let id = players[0].characters()[0];
        board.characters[id.index()].location = Location::Campaign;
        assert!(matches!(
            board.check_invariants(),
            Err(BoardError::InvariantViolated(_))
        ));
    }

    #[test]
    fn buried_characters_held_elsewhere_are_reported() {
        let (mut board, players, _) = setup(3, 2);
        let king = players[0].characters()[0];
        go(&mut board, king, Location::Office(Office::Crown));
        board.crypt.add(king);
        assert!(matches!(
            board.check_invariants(),
            Err(BoardError::InvariantViolated(_))
        ));

        let (mut board, players, _) = setup(3, 2);
        let courtier = players[1].characters()[0];
        go(&mut board, courtier, Location::Court(2));
        board.crypt.add(courtier);
        board.characters[courtier.index()].location = Location::Crypt;
        assert!(matches!(
            board.check_invariants(),
            Err(BoardError::InvariantViolated(_))
        ));
    }

    #[test]
    fn the_dead_never_move_again() {
        let (mut board, players, _) = setup(3, 2);
        let ghost = players[0].characters()[0];
        board.kill(ghost, &mut NullSink).unwrap();
        for dest in [
            Location::Office(Office::Crown),
            Location::Court(0),
            Location::Hand,
            Location::Dungeon,
        ] {
            assert_eq!(
                board.move_character(ghost, dest, &mut NullSink),
                Err(BoardError::NotUsable(ghost))
            );
        }
        assert_eq!(board.character(ghost).unwrap().location(), Location::Crypt);
        assert_eq!(board.office_holder(Office::Crown), None);
        board.check_invariants().unwrap();
    }

    #[test]
    fn prisoners_leave_by_pardon_or_death() {
        let (mut board, players, _) = setup(3, 2);
        let prisoner = players[0].characters()[0];
        let cellmate = players[1].characters()[0];
        go(&mut board, prisoner, Location::Dungeon);
        go(&mut board, cellmate, Location::Dungeon);
        for dest in [Location::Hand, Location::Court(1), Location::Campaign] {
            assert_eq!(
                board.move_character(prisoner, dest, &mut NullSink),
                Err(BoardError::Imprisoned(prisoner))
            );
        }
        assert!(board.dungeon().contains(prisoner));

        board.pardon(prisoner, &mut NullSink).unwrap();
        assert_eq!(board.character(prisoner).unwrap().location(), Location::Hand);
        assert!(matches!(
            board.pardon(prisoner, &mut NullSink),
            Err(BoardError::InvariantViolated(_))
        ));

        board.kill(cellmate, &mut NullSink).unwrap();
        assert_eq!(board.character(cellmate).unwrap().location(), Location::Crypt);
        assert!(board.dungeon().is_empty());
        board.check_invariants().unwrap();
    }

    #[test]
    fn heir_takes_the_vacant_crown() {
        let (mut board, players, _) = setup(4, 2);
        let king = players[0].characters()[0];
        let heir = players[1].characters()[0];
        go(&mut board, king, Location::Office(Office::Crown));
        assert_eq!(board.first_crown(), Some(true));
        go(&mut board, heir, Location::Office(Office::Heir));

        let mut log = EventLog::new();
        board.kill(king, &mut log).unwrap();
        assert_eq!(board.office_holder(Office::Crown), Some(heir));
        assert_eq!(board.office_holder(Office::Heir), None);
        assert_eq!(board.crown_ticker(), 0);
        assert_eq!(board.first_crown(), Some(false));
        assert!(log.mentions("has succeeded to the throne"));
        board.check_invariants().unwrap();
    }

    #[test]
    fn dungeon_overflow_buries_the_longest_held() {
        let (mut board, players, _) = setup(5, 2);
        let prisoners = &players[0].characters()[..4];
        let mut log = EventLog::new();
        for id in prisoners {
            board
                .move_character(*id, Location::Dungeon, &mut log)
                .unwrap();
        }
        assert_eq!(board.dungeon().as_slice(), &prisoners[1..]);
        assert_eq!(
            board.character(prisoners[0]).unwrap().location(),
            Location::Crypt
        );
        assert!(log.mentions("died in an overcrowded dungeon"));
        board.check_invariants().unwrap();
    }

    #[test]
    fn split_hands_remainder_to_early_seats() {
        let shares = split_evenly(Resources::new(7, 5, 0), 3);
        assert_eq!(
            shares,
            vec![
                Resources::new(3, 2, 0),
                Resources::new(2, 2, 0),
                Resources::new(2, 1, 0),
            ]
        );
        assert!(split_evenly(Resources::gold(4), 0).is_empty());
    }

    #[test]
    fn treasury_pays_upkeep_first() {
        let (mut board, mut players, rng) = setup(6, 2);
        raise(&mut board, BuildingKind::Farm, 0);
        raise(&mut board, BuildingKind::Market, 1);
        raise(&mut board, BuildingKind::GuildHall, 2);
        board.treasury_mut().give(Resources::gold(1));

        let mut log = EventLog::new();
        let mut ctx = Ctx {
            rng: &rng,
            sink: &mut log,
        };
        let report = board.collect_upkeep(&mut players, &mut ctx).unwrap();
        assert_eq!(report.required, Resources::new(3, 3, 0));
        assert_eq!(report.from_treasury, Resources::gold(1));
        assert_eq!(
            report.requested,
            vec![Resources::new(1, 2, 0), Resources::new(1, 1, 0)]
        );
        assert_eq!(report.paid, report.requested);
        assert!(report.shortfall.is_zero());
        assert_eq!(report.crisis, None);
        assert_eq!(board.crisis_count(), 0);
        assert_eq!(players[0].coffer().food(), 4);
    }

    #[test]
    fn upkeep_shortfall_draws_a_crisis() {
        let (mut board, mut players, rng) = setup(7, 2);
        raise(&mut board, BuildingKind::Farm, 0);
        for player in &mut players {
            player.take(Resources::new(20, 6, 0));
        }
        board.stage_crisis(CrisisKind::Blight);

        let mut log = EventLog::new();
        let mut ctx = Ctx {
            rng: &rng,
            sink: &mut log,
        };
        let report = board.collect_upkeep(&mut players, &mut ctx).unwrap();
        assert_eq!(report.shortfall, Resources::new(1, 1, 0));
        assert_eq!(report.crisis, Some(CrisisKind::Blight));
        assert_eq!(board.active_crisis(), Some(CrisisKind::Blight));
        assert!(log.mentions("didn't contribute enough upkeep"));
    }

    #[test]
    fn uneven_upkeep_leans_on_early_seats_and_counts_defaults() {
        let (mut board, mut players, rng) = setup(12, 3);
        for (pos, kind) in [
            BuildingKind::Farm,
            BuildingKind::Market,
            BuildingKind::GuildHall,
            BuildingKind::Bank,
            BuildingKind::Church,
        ]
        .into_iter()
        .enumerate()
        {
            raise(&mut board, kind, pos);
        }
        board.treasury_mut().give(Resources::gold(1));
        players[2].take(Resources::new(20, 6, 0));
        board.stage_crisis(CrisisKind::Blight);

        let mut log = EventLog::new();
        let mut ctx = Ctx {
            rng: &rng,
            sink: &mut log,
        };
        let report = board.collect_upkeep(&mut players, &mut ctx).unwrap();
        assert_eq!(report.required, Resources::new(5, 5, 0));
        assert_eq!(report.from_treasury, Resources::gold(1));
        assert_eq!(
            report.requested,
            vec![
                Resources::new(2, 2, 0),
                Resources::new(1, 2, 0),
                Resources::new(1, 1, 0),
            ]
        );
        let asked = report.requested.iter().fold((0, 0), |(g, f), r| (g + r.gold, f + r.food));
        assert_eq!(asked, (4, 5));
        assert_eq!(report.paid[..2], report.requested[..2]);
        assert!(report.paid[2].is_zero());
        assert_eq!(report.shortfall, Resources::new(1, 1, 0));
        assert_eq!(report.crisis, Some(CrisisKind::Blight));
        assert_eq!(board.crisis_count(), 1);
    }

    #[test]
    fn plague_spares_apothecary_workers() {
        let (mut board, mut players, rng) = setup(8, 2);
        let apothecary = raise(&mut board, BuildingKind::Apothecary, 0);
        board.place_worker(players[0].workers()[0], apothecary).unwrap();
        board.stage_crisis(CrisisKind::Plague);

        let mut sink = NullSink;
        let mut ctx = Ctx {
            rng: &rng,
            sink: &mut sink,
        };
        board.activate_crisis(&mut players, &mut ctx).unwrap();
        let dead = |p: &Player| {
            p.characters()
                .iter()
                .filter(|c| board.character(**c).unwrap().location() == Location::Crypt)
                .count()
        };
        assert_eq!(dead(&players[0]), 0);
        assert_eq!(dead(&players[1]), 2);
    }

    #[test]
    fn powderplot_clears_court_and_council() {
        let (mut board, mut players, rng) = setup(9, 2);
        raise(&mut board, BuildingKind::Church, 0);
        let king = players[0].characters()[0];
        let priest = players[0].characters()[1];
        let heir = players[1].characters()[0];
        let courtier = players[1].characters()[1];
        go(&mut board, king, Location::Office(Office::Crown));
        go(&mut board, priest, Location::Office(Office::Priest));
        go(&mut board, heir, Location::Office(Office::Heir));
        go(&mut board, courtier, Location::Court(7));
        board.stage_crisis(CrisisKind::Powderplot);

        let mut sink = NullSink;
        let mut ctx = Ctx {
            rng: &rng,
            sink: &mut sink,
        };
        board.activate_crisis(&mut players, &mut ctx).unwrap();
        for id in [king, priest, courtier] {
            assert_eq!(board.character(id).unwrap().location(), Location::Crypt);
        }
        assert_eq!(board.office_holder(Office::Crown), Some(heir));
        board.check_invariants().unwrap();
    }

    #[test]
    fn destroying_a_building_resets_it() {
        let (mut board, players, _) = setup(10, 2);
        let farm = raise(&mut board, BuildingKind::Farm, 3);
        let manager = players[0].characters()[0];
        let worker = players[1].workers()[0];
        go(&mut board, manager, Location::Building(farm));
        board.place_worker(worker, farm).unwrap();

        board.destroy_building(farm, &mut NullSink).unwrap();
        assert_eq!(board.character(manager).unwrap().location(), Location::Crypt);
        assert_eq!(board.worker(worker).unwrap().building(), None);
        assert_eq!(board.building(farm).unwrap().site(), BuildingSite::Deck);
        assert!(board.building_deck().contains(farm));
        assert_eq!(board.plots().get(3), None);
        board.check_invariants().unwrap();

        let church = raise(&mut board, BuildingKind::Church, 0);
        assert_eq!(
            board.destroy_building(church, &mut NullSink),
            Err(BoardError::PermanentBuilding(church))
        );
    }

    #[test]
    fn punishing_exposes_a_bluff() {
        let (mut board, mut players, _) = setup(11, 2);
        let rogue = players[1].characters()[0];
        go(&mut board, rogue, Location::Court(2));
        let card = board
            .hire_retainer(rogue, Some(RetainerKind::Physician))
            .unwrap();
        let caught = board.retainer(card).unwrap().kind != RetainerKind::Physician;

        let mut log = EventLog::new();
        board.punish(rogue, &mut players, &mut log).unwrap();
        assert!(!board.retainer(card).unwrap().is_face_down());
        let expected_prestige = if caught { 4 } else { 6 };
        assert_eq!(players[1].coffer().prestige(), expected_prestige);
        assert_eq!(log.mentions("caught bluffing"), caught);
        // Default sentencing is a fine and nobody holds the priesthood.
        assert_eq!(players[1].coffer().gold(), 10);
    }

    #[test]
    fn courtesan_charges_the_neighbours() {
        let (mut board, mut players, _) = setup(12, 3);
        let host = players[0].characters()[0];
        go(&mut board, host, Location::Court(1));
        go(&mut board, players[1].characters()[0], Location::Court(0));
        go(&mut board, players[2].characters()[0], Location::Court(2));
        board
            .hire_retainer(host, Some(RetainerKind::Courtesan))
            .unwrap();

        let gained = board.call_retainer(host, &mut players).unwrap();
        assert_eq!(gained, Resources::gold(2));
        assert_eq!(players[0].coffer().gold(), 22);
        assert_eq!(players[1].coffer().gold(), 19);
        assert_eq!(players[2].coffer().gold(), 19);
    }

    #[test]
    fn death_returns_the_retainer_to_the_deck() {
        let (mut board, players, _) = setup(13, 2);
        let id = players[0].characters()[0];
        go(&mut board, id, Location::Campaign);
        let card = board.hire_retainer(id, None).unwrap();
        assert_eq!(board.retainer_deck().len(), 17);
        board.kill(id, &mut NullSink).unwrap();
        assert_eq!(board.retainer_deck().len(), 18);
        assert_eq!(board.retainer(card).unwrap().master(), None);
        board.check_invariants().unwrap();
    }

    #[test]
    fn starving_campaigners_die() {
        let (mut board, mut players, rng) = setup(14, 2);
        let id = players[0].characters()[0];
        go(&mut board, id, Location::Campaign);
        players[0].take(Resources::food(6));

        let mut log = EventLog::new();
        let mut ctx = Ctx {
            rng: &rng,
            sink: &mut log,
        };
        board.bookkeeping(&mut players, &mut ctx).unwrap();
        assert_eq!(board.character(id).unwrap().location(), Location::Crypt);
        assert!(log.mentions("starved to death"));
    }

    #[test]
    fn takeover_locks_hold_until_winter() {
        let (mut board, mut players, rng) = setup(15, 2);
        let farm = raise(&mut board, BuildingKind::Farm, 0);
        board
            .take_over(farm, players[0].characters()[0], &mut NullSink)
            .unwrap();
        let mut sink = NullSink;
        for season in [Season::Summer, Season::Harvest] {
            assert_eq!(board.season(), season);
            let mut ctx = Ctx {
                rng: &rng,
                sink: &mut sink,
            };
            board.bookkeeping(&mut players, &mut ctx).unwrap();
            assert!(board.building(farm).unwrap().is_locked());
        }
        let mut ctx = Ctx {
            rng: &rng,
            sink: &mut sink,
        };
        board.bookkeeping(&mut players, &mut ctx).unwrap();
        assert!(!board.building(farm).unwrap().is_locked());
        assert_eq!(board.year(), 1);
    }
}
