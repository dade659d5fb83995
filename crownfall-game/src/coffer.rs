//! Resource balances for players and the royal treasury.
use serde::{Deserialize, Serialize};
use std::fmt;

/// A bundle of resource amounts used for payments, payouts and requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default)]
    pub gold: i64,
    #[serde(default)]
    pub food: i64,
    #[serde(default)]
    pub prestige: i64,
}

impl Resources {
    #[must_use]
    pub const fn gold(gold: i64) -> Self {
        Self {
            gold,
            food: 0,
            prestige: 0,
        }
    }

    #[must_use]
    pub const fn food(food: i64) -> Self {
        Self {
            gold: 0,
            food,
            prestige: 0,
        }
    }

    #[must_use]
    pub const fn prestige(prestige: i64) -> Self {
        Self {
            gold: 0,
            food: 0,
            prestige,
        }
    }

    #[must_use]
    pub const fn new(gold: i64, food: i64, prestige: i64) -> Self {
        Self {
            gold,
            food,
            prestige,
        }
    }

    /// Multiply every amount by `factor`.
    #[must_use]
    pub const fn times(self, factor: i64) -> Self {
        Self {
            gold: self.gold * factor,
            food: self.food * factor,
            prestige: self.prestige * factor,
        }
    }

    #[must_use]
    pub const fn total(self) -> i64 {
        self.gold + self.food + self.prestige
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.gold == 0 && self.food == 0 && self.prestige == 0
    }
}

/// Tracks resources for a player or for the treasury of the crown.
///
/// Balances never drop below zero: [`Coffer::take`] clamps each resource at
/// the floor and reports how much was actually removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coffer {
    gold: i64,
    food: i64,
    prestige: i64,
}

impl Coffer {
    #[must_use]
    pub const fn new(amounts: Resources) -> Self {
        Self {
            gold: clamp_floor(amounts.gold),
            food: clamp_floor(amounts.food),
            prestige: clamp_floor(amounts.prestige),
        }
    }

    #[must_use]
    pub const fn gold(&self) -> i64 {
        self.gold
    }

    #[must_use]
    pub const fn food(&self) -> i64 {
        self.food
    }

    #[must_use]
    pub const fn prestige(&self) -> i64 {
        self.prestige
    }

    #[must_use]
    pub const fn balance(&self) -> Resources {
        Resources::new(self.gold, self.food, self.prestige)
    }

    /// Whether every requested amount is covered by the current balance.
    #[must_use]
    pub const fn can_afford(&self, amounts: Resources) -> bool {
        self.gold >= amounts.gold && self.food >= amounts.food && self.prestige >= amounts.prestige
    }

    pub fn give(&mut self, amounts: Resources) {
        self.gold = clamp_floor(self.gold.saturating_add(amounts.gold));
        self.food = clamp_floor(self.food.saturating_add(amounts.food));
        self.prestige = clamp_floor(self.prestige.saturating_add(amounts.prestige));
    }

    /// Remove resources, clamping at zero. Returns what was actually taken.
    pub fn take(&mut self, amounts: Resources) -> Resources {
        let before = self.balance();
        self.gold = clamp_floor(self.gold.saturating_sub(amounts.gold));
        self.food = clamp_floor(self.food.saturating_sub(amounts.food));
        self.prestige = clamp_floor(self.prestige.saturating_sub(amounts.prestige));
        let after = self.balance();
        Resources::new(
            before.gold - after.gold,
            before.food - after.food,
            before.prestige - after.prestige,
        )
    }
}

impl fmt::Display for Coffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.gold, self.food, self.prestige)
    }
}

const fn clamp_floor(value: i64) -> i64 {
    if value < 0 { 0 } else { value }
}
