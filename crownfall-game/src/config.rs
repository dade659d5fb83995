//! Player-facing game configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coffer::Resources;
use crate::constants::{
    CHARACTERS_PER_PLAYER, CROWN_WIN_ROUNDS, DEFAULT_CRISIS_LIMIT, DEFAULT_MAX_ROUNDS,
    DEFAULT_YEAR_LIMIT, FIRST_CROWN_WIN_ROUNDS, STARTING_FOOD, STARTING_GOLD, STARTING_PRESTIGE,
    WORKERS_PER_PLAYER,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
}

/// Knobs a caller may set when constructing a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_count: usize,
    /// Actions each player takes per turn. Historically 3.
    pub actions_per_turn: usize,
    /// Safety ceiling; exceeding it is an error, not a game end.
    pub max_rounds: u32,
    pub seed: u64,
    pub year_limit: u32,
    pub crisis_limit: usize,
    /// Rounds the very first crown must hold the throne to win.
    pub first_crown_win_rounds: u32,
    /// Rounds any later crown must hold the throne to win.
    pub crown_win_rounds: u32,
    pub starting_resources: Resources,
    pub workers_per_player: usize,
    pub characters_per_player: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: 4,
            actions_per_turn: 1,
            max_rounds: DEFAULT_MAX_ROUNDS,
            seed: 0,
            year_limit: DEFAULT_YEAR_LIMIT,
            crisis_limit: DEFAULT_CRISIS_LIMIT,
            first_crown_win_rounds: FIRST_CROWN_WIN_ROUNDS,
            crown_win_rounds: CROWN_WIN_ROUNDS,
            starting_resources: Resources::new(STARTING_GOLD, STARTING_FOOD, STARTING_PRESTIGE),
            workers_per_player: WORKERS_PER_PLAYER,
            characters_per_player: CHARACTERS_PER_PLAYER,
        }
    }
}

impl GameConfig {
    #[must_use]
    pub fn with_players(player_count: usize, seed: u64) -> Self {
        Self {
            player_count,
            seed,
            ..Self::default()
        }
    }

    /// Validate configuration bounds.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates its documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("player_count", self.player_count, 2, 8)?;
        check_range("actions_per_turn", self.actions_per_turn, 1, 5)?;
        check_range("max_rounds", self.max_rounds, 1, 10_000)?;
        check_range("year_limit", self.year_limit, 1, 100)?;
        check_range("crisis_limit", self.crisis_limit, 1, 4)?;
        check_range("first_crown_win_rounds", self.first_crown_win_rounds, 1, 1_000)?;
        check_range("crown_win_rounds", self.crown_win_rounds, 1, 1_000)?;
        check_range("characters_per_player", self.characters_per_player, 1, 12)?;
        check_range("workers_per_player", self.workers_per_player, 0, 12)?;
        let start = self.starting_resources;
        check_range("starting_resources.gold", start.gold, 0, 1_000)?;
        check_range("starting_resources.food", start.food, 0, 1_000)?;
        check_range("starting_resources.prestige", start.prestige, 0, 1_000)?;
        Ok(())
    }
}

fn check_range<T>(field: &'static str, value: T, min: i64, max: i64) -> Result<(), ConfigError>
where
    T: num_traits::ToPrimitive + Copy,
{
    let value = value.to_i64().unwrap_or(i64::MAX);
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.player_count, 4);
        assert_eq!(cfg.max_rounds, 100);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_single_player() {
        let cfg = GameConfig::with_players(1, 0);
        let err = cfg.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "player_count must be between 2 and 8 (got 1)"
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: GameConfig =
            serde_json::from_str(r#"{"player_count": 3, "actions_per_turn": 3}"#).unwrap();
        assert_eq!(cfg.player_count, 3);
        assert_eq!(cfg.actions_per_turn, 3);
        assert_eq!(cfg.year_limit, 5);
        assert_eq!(cfg.starting_resources.gold, 20);
    }
}
