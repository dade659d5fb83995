//! Building cards: per-kind constants, predicted effects and round payouts.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::Season;
use crate::coffer::Resources;
use crate::containers::{BoundedBox, Container, OverflowPolicy, Slot};
use crate::effects::Effects;
use crate::numbers::usize_to_i64;
use crate::pieces::{BuildingId, CharacterId, Office, PlayerId, WorkerId};

/// Closed set of building kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    /// Workers here shield their family from the plague.
    Apothecary,
    /// Unlocks the treasurer.
    Bank,
    /// Unlocks the commander.
    Barracks,
    /// Unlocks the priest.
    Church,
    Farm,
    GuildHall,
    Market,
    MercenaryCamp,
    Mine,
    /// Unlocks the spymaster; presence here allows hiring retainers.
    Tavern,
}

impl BuildingKind {
    /// Deck composition: each kind with its number of copies.
    pub const DECK: [(Self, usize); 10] = [
        (Self::Apothecary, 2),
        (Self::Bank, 1),
        (Self::Barracks, 1),
        (Self::Church, 2),
        (Self::Farm, 5),
        (Self::GuildHall, 2),
        (Self::Market, 1),
        (Self::MercenaryCamp, 1),
        (Self::Mine, 1),
        (Self::Tavern, 1),
    ];

    #[must_use]
    pub const fn cost(self) -> i64 {
        match self {
            Self::Farm | Self::Tavern => 4,
            Self::Bank => 8,
            Self::Mine => 10,
            Self::Apothecary
            | Self::Barracks
            | Self::Church
            | Self::GuildHall
            | Self::Market
            | Self::MercenaryCamp => 6,
        }
    }

    #[must_use]
    pub const fn worker_capacity(self) -> usize {
        match self {
            Self::Bank | Self::GuildHall | Self::MercenaryCamp => 1,
            Self::Farm | Self::Mine => 2,
            Self::Apothecary | Self::Market | Self::Tavern => 3,
            Self::Barracks | Self::Church => 4,
        }
    }

    /// Office unlocked while this building stands. Such buildings are permanent.
    #[must_use]
    pub const fn office_unlock(self) -> Option<Office> {
        match self {
            Self::Church => Some(Office::Priest),
            Self::Barracks => Some(Office::Commander),
            Self::Tavern => Some(Office::Spymaster),
            Self::Bank => Some(Office::Treasurer),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Apothecary => "apothecary",
            Self::Bank => "bank",
            Self::Barracks => "barracks",
            Self::Church => "church",
            Self::Farm => "farm",
            Self::GuildHall => "guildhall",
            Self::Market => "market",
            Self::MercenaryCamp => "mercenarycamp",
            Self::Mine => "mine",
            Self::Tavern => "tavern",
        }
    }

    #[must_use]
    pub const fn build_effects(self) -> Effects {
        match self {
            Self::Apothecary => Effects::ZERO,
            Self::Bank => Effects {
                gold: 5.0,
                power: 2.0,
                ..Effects::ZERO
            },
            Self::Barracks | Self::Tavern => Effects::power(3.0),
            Self::Church => Effects {
                power: 2.0,
                prestige: 1.0,
                ..Effects::ZERO
            },
            Self::Farm => Effects::food(4.0),
            Self::GuildHall => Effects::prestige(1.0),
            Self::Market => Effects::gold(4.0),
            Self::MercenaryCamp => Effects::general(-8.0),
            Self::Mine => Effects::gold(6.0),
        }
    }

    /// Predicted effect of the acting player placing one more worker here.
    #[must_use]
    pub const fn place_worker_effects(self, ctx: &EffectContext) -> Effects {
        match self {
            Self::Apothecary => {
                if ctx.workers_here >= 1 {
                    Effects::ZERO
                } else {
                    Effects::risk(-2.0)
                }
            }
            Self::Bank => Effects::gold(if ctx.manages_here { 4.0 } else { 2.0 }),
            Self::Barracks => {
                if ctx.is_commander {
                    Effects::power(1.0)
                } else {
                    Effects::general(-2.0)
                }
            }
            Self::Church => {
                if ctx.works_a_church {
                    Effects::prestige(1.0)
                } else {
                    Effects {
                        risk: -0.5,
                        prestige: 1.0,
                        ..Effects::ZERO
                    }
                }
            }
            Self::Farm => Effects::food(if ctx.workers_here == 1 { 3.0 } else { 1.0 }),
            Self::GuildHall => Effects::prestige(1.0),
            Self::Market => Effects::gold(1.0),
            Self::MercenaryCamp => Effects::general(-8.0),
            Self::Mine => Effects::gold(if ctx.workers_here == 1 { 4.0 } else { 1.0 }),
            Self::Tavern => Effects {
                power: 1.0,
                risk: 1.0,
                ..Effects::ZERO
            },
        }
    }

    /// Predicted effect of the acting player pulling one worker out.
    #[must_use]
    pub const fn remove_worker_effects(self, ctx: &EffectContext) -> Effects {
        match self {
            Self::Apothecary => {
                if ctx.workers_here == 1 {
                    Effects::risk(2.0)
                } else {
                    Effects::ZERO
                }
            }
            Self::Bank => Effects::gold(if ctx.manages_here { -4.0 } else { -2.0 }),
            Self::Barracks => {
                if ctx.is_commander {
                    Effects::power(-1.0)
                } else {
                    Effects::ZERO
                }
            }
            Self::Church => {
                if ctx.workers_here > 1 {
                    Effects::prestige(-1.0)
                } else {
                    Effects {
                        risk: 1.0,
                        prestige: -1.0,
                        ..Effects::ZERO
                    }
                }
            }
            Self::Farm => Effects::food(if ctx.workers_here == 2 { -3.0 } else { -1.0 }),
            Self::GuildHall => Effects::prestige(-1.0),
            Self::Market => Effects::gold(-1.0),
            Self::MercenaryCamp => Effects::ZERO,
            Self::Mine => Effects::gold(if ctx.workers_here == 2 { -4.0 } else { -1.0 }),
            Self::Tavern => Effects {
                power: -1.0,
                risk: -1.0,
                ..Effects::ZERO
            },
        }
    }

    /// Predicted effect of the acting player installing a manager here.
    #[must_use]
    pub const fn place_manager_effects(self, ctx: &EffectContext) -> Effects {
        let n = ctx.workers_here;
        match self {
            Self::Apothecary | Self::Barracks | Self::MercenaryCamp => Effects::general(-8.0),
            Self::Bank => Effects::gold(if n == 1 { 4.0 } else { 2.0 }),
            Self::Church => Effects::prestige(if n >= 1 { 3.0 } else { 0.5 }),
            Self::Farm => Effects::food(match n {
                0 => 0.5,
                1 => 2.0,
                _ => 6.0,
            }),
            Self::GuildHall => Effects::prestige(if n == 1 { 2.0 } else { 0.5 }),
            Self::Market => Effects::gold(if n >= 1 { 2.0 } else { 0.5 }),
            Self::Mine => match n {
                0 => Effects::gold(0.5),
                1 => Effects::gold(2.0),
                _ => Effects {
                    gold: 8.0,
                    prestige: 4.0,
                    ..Effects::ZERO
                },
            },
            Self::Tavern => Effects {
                power: 1.0,
                risk: 1.0,
                general: -1.0,
                ..Effects::ZERO
            },
        }
    }

    /// Predicted effect of the acting player's manager leaving.
    #[must_use]
    pub const fn remove_manager_effects(self, ctx: &EffectContext) -> Effects {
        let n = ctx.workers_here;
        match self {
            Self::Apothecary | Self::Barracks | Self::MercenaryCamp => Effects::ZERO,
            Self::Bank => Effects::gold(if n == 1 { -4.0 } else { -2.0 }),
            Self::Church => {
                if n >= 1 {
                    Effects::prestige(-3.0)
                } else {
                    Effects::ZERO
                }
            }
            Self::Farm => match n {
                0 => Effects::ZERO,
                1 => Effects::food(-2.0),
                _ => Effects::food(-6.0),
            },
            Self::GuildHall => {
                if n == 1 {
                    Effects::prestige(-2.0)
                } else {
                    Effects::ZERO
                }
            }
            Self::Market => {
                if n >= 1 {
                    Effects::gold(-2.0)
                } else {
                    Effects::ZERO
                }
            }
            Self::Mine => match n {
                0 => Effects::ZERO,
                1 => Effects::gold(-2.0),
                _ => Effects {
                    gold: -8.0,
                    prestige: -4.0,
                    ..Effects::ZERO
                },
            },
            Self::Tavern => Effects {
                power: -1.0,
                risk: -1.0,
                general: 1.0,
                ..Effects::ZERO
            },
        }
    }

    /// Payout for one player given how many of their workers labor here.
    fn payout_for(self, count: usize, season: Season, blight: bool) -> Resources {
        let workers = usize_to_i64(count);
        match self {
            Self::Bank => Resources::gold(2 * workers),
            Self::GuildHall => Resources::prestige(workers),
            Self::Market => Resources::gold(workers),
            Self::Church => {
                if count >= 2 {
                    Resources::prestige(1)
                } else {
                    Resources::new(0, 0, 0)
                }
            }
            Self::Farm => {
                if matches!(season, Season::Winter) || blight {
                    Resources::new(0, 0, 0)
                } else if count < 2 {
                    Resources::food(1)
                } else {
                    Resources::food(3)
                }
            }
            Self::Mine => {
                if count < 2 {
                    Resources::gold(1)
                } else {
                    Resources::new(4, 0, 1)
                }
            }
            Self::Apothecary | Self::Barracks | Self::MercenaryCamp | Self::Tavern => {
                Resources::new(0, 0, 0)
            }
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the acting player already has in and around a building, used to
/// shape predicted effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectContext {
    /// The acting player's workers currently in this building.
    pub workers_here: usize,
    /// The acting player manages this building.
    pub manages_here: bool,
    pub is_commander: bool,
    /// The acting player already has a worker in some church.
    pub works_a_church: bool,
}

/// Where a building card currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingSite {
    #[default]
    Deck,
    Queue,
    Plot(usize),
}

/// A building card instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub(crate) workers: BoundedBox<WorkerId>,
    pub(crate) manager: Slot<CharacterId>,
    pub(crate) locked: bool,
    pub(crate) site: BuildingSite,
}

impl Building {
    #[must_use]
    pub fn new(id: BuildingId, kind: BuildingKind) -> Self {
        Self {
            id,
            kind,
            workers: BoundedBox::new(kind.worker_capacity(), OverflowPolicy::Reject),
            manager: Slot::new(),
            locked: false,
            site: BuildingSite::Deck,
        }
    }

    /// Return to the fresh state a card has in the deck.
    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.id, self.kind);
    }

    #[must_use]
    pub fn workers(&self) -> &[WorkerId] {
        self.workers.as_slice()
    }

    #[must_use]
    pub const fn manager(&self) -> Option<CharacterId> {
        self.manager.get()
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub const fn site(&self) -> BuildingSite {
        self.site
    }

    #[must_use]
    pub fn is_constructed(&self) -> bool {
        matches!(self.site, BuildingSite::Plot(_))
    }

    #[must_use]
    pub fn has_worker_room(&self) -> bool {
        !self.workers.is_full()
    }

    /// Number of workers a player has here.
    #[must_use]
    pub fn worker_count(&self, owner_of: impl Fn(WorkerId) -> PlayerId, player: PlayerId) -> usize {
        self.workers
            .as_slice()
            .iter()
            .filter(|w| owner_of(**w) == player)
            .count()
    }

    /// Per-player payouts for this round, in order of first appearance.
    ///
    /// The manager's own player receives double.
    #[must_use]
    pub fn payouts(
        &self,
        owner_of: impl Fn(WorkerId) -> PlayerId,
        manager_owner: Option<PlayerId>,
        season: Season,
        blight: bool,
    ) -> Vec<(PlayerId, Resources)> {
        let mut counts: Vec<(PlayerId, usize)> = Vec::new();
        for worker in self.workers.as_slice() {
            let owner = owner_of(*worker);
            match counts.iter_mut().find(|(p, _)| *p == owner) {
                Some((_, n)) => *n += 1,
                None => counts.push((owner, 1)),
            }
        }
        counts
            .into_iter()
            .map(|(player, count)| {
                let base = self.kind.payout_for(count, season, blight);
                let factor = if manager_owner == Some(player) { 2 } else { 1 };
                (player, base.times(factor))
            })
            .filter(|(_, amount)| !amount.is_zero())
            .collect()
    }

    pub(crate) fn contains_worker(&self, worker: WorkerId) -> bool {
        self.workers.contains(worker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(worker: WorkerId) -> PlayerId {
        PlayerId(worker.0 / 10)
    }

    #[test]
    fn deck_composition_has_seventeen_cards() {
        let total: usize = BuildingKind::DECK.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 17);
        assert_eq!(BuildingKind::Bank.office_unlock(), Some(Office::Treasurer));
        assert_eq!(BuildingKind::Farm.office_unlock(), None);
    }

    #[test]
    fn mine_pays_pairs_and_doubles_for_manager() {
        let mut mine = Building::new(BuildingId(0), BuildingKind::Mine);
        mine.workers.insert(WorkerId(10)).unwrap();
        mine.workers.insert(WorkerId(11)).unwrap();
        let payouts = mine.payouts(owner, None, Season::Summer, false);
        assert_eq!(payouts, vec![(PlayerId(1), Resources::new(4, 0, 1))]);
        let managed = mine.payouts(owner, Some(PlayerId(1)), Season::Summer, false);
        assert_eq!(managed, vec![(PlayerId(1), Resources::new(8, 0, 2))]);
    }

    #[test]
    fn counted_payouts_scale_with_workers() {
        let pay = |kind: BuildingKind, count| kind.payout_for(count, Season::Summer, false);
        assert_eq!(pay(BuildingKind::Bank, 1), Resources::gold(2));
        assert_eq!(pay(BuildingKind::Market, 3), Resources::gold(3));
        assert_eq!(pay(BuildingKind::GuildHall, 2), Resources::prestige(2));
        assert_eq!(pay(BuildingKind::Bank, 0), Resources::gold(0));
    }

    #[test]
    fn farm_is_fallow_in_winter_and_blight() {
        let mut farm = Building::new(BuildingId(1), BuildingKind::Farm);
        farm.workers.insert(WorkerId(20)).unwrap();
        farm.workers.insert(WorkerId(30)).unwrap();
        assert_eq!(
            farm.payouts(owner, None, Season::Harvest, false),
            vec![
                (PlayerId(2), Resources::food(1)),
                (PlayerId(3), Resources::food(1))
            ]
        );
        assert!(farm.payouts(owner, None, Season::Winter, false).is_empty());
        assert!(farm.payouts(owner, None, Season::Summer, true).is_empty());
    }

    #[test]
    fn worker_box_rejects_beyond_capacity() {
        let mut bank = Building::new(BuildingId(2), BuildingKind::Bank);
        bank.workers.insert(WorkerId(1)).unwrap();
        assert!(!bank.has_worker_room());
        assert!(bank.workers.insert(WorkerId(2)).is_err());
        bank.locked = true;
        bank.reset();
        assert!(bank.workers().is_empty());
        assert!(!bank.is_locked());
    }

    #[test]
    fn manager_effects_mirror_each_other() {
        for (kind, _) in BuildingKind::DECK {
            for workers_here in 0..3 {
                let ctx = EffectContext {
                    workers_here,
                    ..EffectContext::default()
                };
                let on = kind.place_manager_effects(&ctx);
                let off = kind.remove_manager_effects(&ctx);
                let net = on + off;
                assert!(net.gold.abs() <= 0.5 + f64::EPSILON, "{kind} {workers_here}");
                assert!(net.prestige.abs() <= 0.5 + f64::EPSILON, "{kind} {workers_here}");
            }
        }
    }
}
