//! Multi-objective effect vectors and the priority weights that score them.
//!
//! An [`Effects`] vector is a heuristic estimate of what an action does to the
//! acting player along eight fixed axes. A [`Priorities`] vector is that
//! player's fixed weighting of the same axes. The score of an action is the
//! weighted dot product `(priorities * effects).sum()`; higher is preferred.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

/// Fixed-dimension numeric estimate of an action's impact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    #[serde(default)]
    pub gold: f64,
    #[serde(default)]
    pub food: f64,
    #[serde(default)]
    pub prestige: f64,
    #[serde(default)]
    pub reputation: f64,
    #[serde(default)]
    pub power: f64,
    #[serde(default)]
    pub risk: f64,
    #[serde(default)]
    pub karma: f64,
    /// Unweighted bias term.
    #[serde(default)]
    pub general: f64,
}

impl Effects {
    pub const ZERO: Self = Self {
        gold: 0.0,
        food: 0.0,
        prestige: 0.0,
        reputation: 0.0,
        power: 0.0,
        risk: 0.0,
        karma: 0.0,
        general: 0.0,
    };

    #[must_use]
    pub const fn gold(gold: f64) -> Self {
        Self { gold, ..Self::ZERO }
    }

    #[must_use]
    pub const fn food(food: f64) -> Self {
        Self { food, ..Self::ZERO }
    }

    #[must_use]
    pub const fn prestige(prestige: f64) -> Self {
        Self {
            prestige,
            ..Self::ZERO
        }
    }

    #[must_use]
    pub const fn power(power: f64) -> Self {
        Self {
            power,
            ..Self::ZERO
        }
    }

    #[must_use]
    pub const fn risk(risk: f64) -> Self {
        Self { risk, ..Self::ZERO }
    }

    #[must_use]
    pub const fn general(general: f64) -> Self {
        Self {
            general,
            ..Self::ZERO
        }
    }

    /// Components in declaration order.
    #[must_use]
    pub const fn components(&self) -> [f64; 8] {
        [
            self.gold,
            self.food,
            self.prestige,
            self.reputation,
            self.power,
            self.risk,
            self.karma,
            self.general,
        ]
    }

    #[must_use]
    pub const fn from_components(c: [f64; 8]) -> Self {
        Self {
            gold: c[0],
            food: c[1],
            prestige: c[2],
            reputation: c[3],
            power: c[4],
            risk: c[5],
            karma: c[6],
            general: c[7],
        }
    }

    fn zip_with(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let a = self.components();
        let b = other.components();
        Self::from_components(std::array::from_fn(|i| f(a[i], b[i])))
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::from_components(self.components().map(f))
    }

    /// Multiply every component by `n`.
    #[must_use]
    pub fn scale(self, n: f64) -> Self {
        self.map(|v| v * n)
    }

    /// Negate every component.
    #[must_use]
    pub fn inverse(self) -> Self {
        self.map(|v| -v)
    }

    /// Fold every component by addition.
    ///
    /// Only meaningful once a priorities vector has been multiplied in.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.components().iter().sum()
    }
}

impl Add for Effects {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl AddAssign for Effects {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul for Effects {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a * b)
    }
}

impl Sum for Effects {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Effects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LABELS: [&str; 8] = ["go", "fo", "pr", "re", "po", "ri", "ka", "ge"];
        f.write_str("(")?;
        for (i, (label, value)) in LABELS.iter().zip(self.components()).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{label} {value:.3}")?;
        }
        f.write_str(")")
    }
}

/// A player's fixed per-axis weighting used to score candidate actions.
///
/// Unlike [`Effects`], the `general` weight defaults to 1 so the bias term
/// of an action always counts at face value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priorities(Effects);

impl Default for Priorities {
    fn default() -> Self {
        Self(Effects::general(1.0))
    }
}

impl Priorities {
    /// Build from explicit weights. `general` is forced to 1.
    #[must_use]
    pub const fn new(weights: Effects) -> Self {
        Self(Effects {
            general: 1.0,
            ..weights
        })
    }

    /// Sample every weight independently from its bounded uniform range.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(Effects {
            gold: rng.gen_range(0.0..=2.0),
            food: rng.gen_range(0.0..=2.0),
            prestige: rng.gen_range(0.0..=2.0),
            reputation: rng.gen_range(-2.0..=2.0),
            power: rng.gen_range(-1.0..=2.0),
            risk: rng.gen_range(-2.0..=1.0),
            karma: rng.gen_range(0.0..=2.0),
            general: 1.0,
        })
    }

    #[must_use]
    pub const fn weights(&self) -> &Effects {
        &self.0
    }

    /// Weighted dot product of these priorities against an action's effects.
    #[must_use]
    pub fn score(&self, effects: &Effects) -> f64 {
        (*self * *effects).sum()
    }
}

impl Mul<Effects> for Priorities {
    type Output = Effects;

    fn mul(self, rhs: Effects) -> Effects {
        self.0 * rhs
    }
}

impl fmt::Display for Priorities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
