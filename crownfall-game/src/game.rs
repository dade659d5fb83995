//! Game setup, the round loop and end-of-game detection.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::board::{Board, BoardError, Ctx};
use crate::config::{ConfigError, GameConfig};
use crate::effects::Priorities;
use crate::engine::{Table, execute, legal_actions, rank_actions};
use crate::events::{EventLog, EventSink, GameEvent};
use crate::names::{ListNameGenerator, NameGenerator, house_name};
use crate::pieces::{Gender, Location, Office, PlayerId};
use crate::player::Player;
use crate::rng::{ChallengeOracle, CoinFlip, RngBundle, derive_stream_seed};

#[derive(Debug, Error)]
pub enum GameError {
    /// Safety ceiling hit before any end condition. Not a normal outcome.
    #[error("game exceeded the round limit of {rounds}")]
    RoundLimitExceeded { rounds: u32 },
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Why a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The year limit was reached; the seated crown wins.
    FiveYears,
    /// A crown held the throne long enough to win outright.
    CrownWin,
    /// Too many crises; nobody wins.
    CrisisEnd,
    /// A player lost every usable character; the seated crown wins.
    FamilyExtinguished,
}

impl TerminationReason {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FiveYears => "five_years",
            Self::CrownWin => "crown_win",
            Self::CrisisEnd => "crisis_end",
            Self::FamilyExtinguished => "family_extinguished",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a caller reads back once a game is over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub reason: TerminationReason,
    pub winner: Option<PlayerId>,
    pub rounds: u32,
    pub year: u32,
    pub log: Vec<GameEvent>,
}

/// A single self-contained game. All randomness comes from the config seed.
pub struct Game<S: EventSink = EventLog> {
    config: GameConfig,
    board: Board,
    players: Vec<Player>,
    rng: RngBundle,
    oracle: Box<dyn ChallengeOracle>,
    sink: S,
    rounds: u32,
    outcome: Option<(TerminationReason, Option<PlayerId>)>,
}

impl Game<EventLog> {
    /// Set up a game recording into an in-memory [`EventLog`].
    ///
    /// Players beyond `priorities.len()` receive random priorities.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Config` for an invalid config.
    pub fn new(config: GameConfig, priorities: &[Priorities]) -> Result<Self, GameError> {
        Self::with_sink(config, priorities, EventLog::new())
    }

    #[must_use]
    pub const fn log(&self) -> &EventLog {
        &self.sink
    }

    /// Summary of a finished game, `None` while still in progress.
    #[must_use]
    pub fn summary(&self) -> Option<GameSummary> {
        let (reason, winner) = self.outcome?;
        Some(GameSummary {
            reason,
            winner,
            rounds: self.rounds,
            year: self.board.year(),
            log: self.sink.events().to_vec(),
        })
    }
}

impl<S: EventSink> Game<S> {
    /// Set up a game recording into `sink`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Config` for an invalid config.
    pub fn with_sink(
        config: GameConfig,
        priorities: &[Priorities],
        mut sink: S,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let rng = RngBundle::from_user_seed(config.seed);
        let mut board = Board::new(&rng);
        let mut names =
            ListNameGenerator::new(ChaCha8Rng::seed_from_u64(derive_stream_seed(config.seed, b"names")));

        let mut players = Vec::with_capacity(config.player_count);
        for seat in 0..config.player_count {
            let id = PlayerId(seat);
            let weights = match priorities.get(seat) {
                Some(p) => *p,
                None => Priorities::random(&mut *rng.setup()),
            };
            let mut player = Player::new(id, weights, config.starting_resources);
            for _ in 0..config.characters_per_player {
                let gender = if rng.setup().gen_bool(0.5) {
                    Gender::Male
                } else {
                    Gender::Female
                };
                let name = names.generate_name(gender, id);
                player.characters.push(board.add_character(id, name, gender));
            }
            for _ in 0..config.workers_per_player {
                player.workers.push(board.add_worker(id));
            }
            log::debug!("{id} priorities {weights}");
            players.push(player);
        }

        let first = rng.setup().gen_range(0..players.len());
        if let Some(&founder) = players.get(first).and_then(|p| p.characters().first()) {
            board.move_character(founder, Location::Office(Office::Crown), &mut sink)?;
            let name = &board.character(founder)?.name;
            sink.record(GameEvent::game(format!(
                "{name} of house {} was crowned",
                house_name(PlayerId(first))
            )));
        }

        Ok(Self {
            oracle: Box::new(CoinFlip::from_user_seed(config.seed)),
            config,
            board,
            players,
            rng,
            sink,
            rounds: 0,
            outcome: None,
        })
    }

    /// Replace the challenge oracle, e.g. with `FixedOutcome` to pin tests.
    #[must_use]
    pub fn with_oracle(mut self, oracle: impl ChallengeOracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    #[must_use]
    pub const fn rounds(&self) -> u32 {
        self.rounds
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<(TerminationReason, Option<PlayerId>)> {
        self.outcome
    }

    /// Evaluate the end conditions in priority order.
    #[must_use]
    pub fn end_check(&self) -> Option<(TerminationReason, Option<PlayerId>)> {
        let crown = self.board.office_player(Office::Crown);
        if self.board.year() >= self.config.year_limit {
            return Some((TerminationReason::FiveYears, crown));
        }
        let needed = match self.board.first_crown() {
            Some(true) => Some(self.config.first_crown_win_rounds),
            Some(false) => Some(self.config.crown_win_rounds),
            None => None,
        };
        if let (Some(needed), Some(holder)) = (needed, crown) {
            if self.board.crown_ticker() >= needed {
                return Some((TerminationReason::CrownWin, Some(holder)));
            }
        }
        if self.board.crisis_count() >= self.config.crisis_limit {
            return Some((TerminationReason::CrisisEnd, None));
        }
        if self
            .players
            .iter()
            .any(|p| !self.board.has_usable_characters(p.id))
        {
            return Some((TerminationReason::FamilyExtinguished, crown));
        }
        None
    }

    /// Crown's player first, then everyone else in seat order.
    fn turn_order(&self) -> Vec<PlayerId> {
        let crown = self.board.office_player(Office::Crown);
        crown
            .into_iter()
            .chain(self.players.iter().map(|p| p.id).filter(|id| Some(*id) != crown))
            .collect()
    }

    fn log_round_header(&mut self) {
        let coffers: Vec<String> = self.players.iter().map(ToString::to_string).collect();
        let header = format!(
            "{} of year {}: {}",
            self.board.season(),
            self.board.year(),
            coffers.join(", ")
        );
        log::debug!("{header}");
        self.sink.record(GameEvent::game(header));
    }

    /// Choose and run one action for `player`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Board` if the chosen action cannot be executed.
    pub fn take_turn(&mut self, player: PlayerId) -> Result<(), GameError> {
        let actions = legal_actions(&self.board, &self.players, player, &self.rng);
        let Some(priorities) = self.players.get(player.index()).map(|p| p.priorities) else {
            return Ok(());
        };
        let ranked = rank_actions(actions, &priorities, &mut *self.rng.tiebreak());
        let Some(choice) = ranked.into_iter().next() else {
            self.sink.record(GameEvent::player(player, "passed"));
            return Ok(());
        };
        let mut table = Table {
            board: &mut self.board,
            players: &mut self.players,
            oracle: &mut *self.oracle,
            ctx: Ctx {
                rng: &self.rng,
                sink: &mut self.sink,
            },
        };
        execute(&choice, &mut table)?;
        Ok(())
    }

    /// Run the end-of-round pipeline.
    ///
    /// # Errors
    ///
    /// Propagates board failures.
    pub fn bookkeeping(&mut self) -> Result<(), GameError> {
        let mut ctx = Ctx {
            rng: &self.rng,
            sink: &mut self.sink,
        };
        self.board.bookkeeping(&mut self.players, &mut ctx)?;
        Ok(())
    }

    /// Every player acts, then bookkeeping runs.
    ///
    /// # Errors
    ///
    /// Propagates board failures.
    pub fn play_round(&mut self) -> Result<(), GameError> {
        self.log_round_header();
        for player in self.turn_order() {
            for _ in 0..self.config.actions_per_turn {
                self.take_turn(player)?;
            }
        }
        self.bookkeeping()?;
        self.rounds += 1;
        Ok(())
    }

    /// Play until an end condition holds.
    ///
    /// # Errors
    ///
    /// Returns `GameError::RoundLimitExceeded` when `max_rounds` pass with no
    /// end, or any board failure.
    pub fn play_to_completion(
        &mut self,
    ) -> Result<(TerminationReason, Option<PlayerId>), GameError> {
        loop {
            if let Some(end) = self.end_check() {
                self.finish(end);
                return Ok(end);
            }
            if self.rounds >= self.config.max_rounds {
                return Err(GameError::RoundLimitExceeded {
                    rounds: self.config.max_rounds,
                });
            }
            self.play_round()?;
        }
    }

    fn finish(&mut self, (reason, winner): (TerminationReason, Option<PlayerId>)) {
        let crown = self
            .board
            .office_holder(Office::Crown)
            .and_then(|id| self.board.character(id).ok())
            .map(|c| format!("{} ({})", c.name, c.owner));
        let narration = match reason {
            TerminationReason::FiveYears => format!(
                "{} years have passed. {}",
                self.board.year(),
                crown.map_or_else(
                    || "The throne stands empty".to_string(),
                    |c| format!("{c} rules the realm")
                )
            ),
            TerminationReason::CrownWin => format!(
                "{} has held the crown for {} rounds",
                crown.unwrap_or_else(|| "The crown".to_string()),
                self.board.crown_ticker()
            ),
            TerminationReason::CrisisEnd => "The realm has collapsed into crisis".to_string(),
            TerminationReason::FamilyExtinguished => {
                let fallen: Vec<&str> = self
                    .players
                    .iter()
                    .filter(|p| !self.board.has_usable_characters(p.id))
                    .map(|p| house_name(p.id))
                    .collect();
                format!("House {} has been extinguished", fallen.join(" and "))
            }
        };
        log::info!(
            "game over after {} rounds: {reason}, winner {:?}",
            self.rounds,
            winner
        );
        self.sink.record(GameEvent::game(narration));
        self.outcome = Some((reason, winner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::FixedOutcome;

    fn game(seed: u64) -> Game {
        Game::new(GameConfig::with_players(4, seed), &[]).unwrap()
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = GameConfig::with_players(1, 0);
        assert!(matches!(
            Game::new(config, &[]),
            Err(GameError::Config(_))
        ));
    }

    #[test]
    fn setup_deals_pieces_and_crowns_someone() {
        let game = game(7);
        assert_eq!(game.players().len(), 4);
        for player in game.players() {
            assert_eq!(player.characters().len(), 6);
            assert_eq!(player.workers().len(), 4);
            assert_eq!(player.coffer().gold(), 20);
        }
        assert!(game.board().office_holder(Office::Crown).is_some());
        assert_eq!(game.board().first_crown(), Some(true));
        assert!(game.log().mentions("was crowned"));
        game.board().check_invariants().unwrap();
    }

    #[test]
    fn crown_player_moves_first() {
        let game = game(3);
        let crown = game.board().office_player(Office::Crown).unwrap();
        let order = game.turn_order();
        assert_eq!(order[0], crown);
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn first_crown_wins_after_nine_rounds() {
        let mut game = game(11);
        for _ in 0..8 {
            game.bookkeeping().unwrap();
        }
        assert_eq!(game.end_check(), None);
        game.bookkeeping().unwrap();
        let crown = game.board().office_player(Office::Crown);
        assert_eq!(game.end_check(), Some((TerminationReason::CrownWin, crown)));
    }

    #[test]
    fn later_reigns_win_after_six_rounds() {
        let mut game = game(11);
        let crown = game.board().office_holder(Office::Crown).unwrap();
        let owner = game.board().character(crown).unwrap().owner;
        let heir_owner = PlayerId((owner.index() + 1) % 4);
        let heir = game.players()[heir_owner.index()].characters()[0];
        let mut log = EventLog::new();
        game.board_mut()
            .move_character(heir, Location::Office(Office::Heir), &mut log)
            .unwrap();
        game.board_mut()
            .move_character(crown, Location::Hand, &mut log)
            .unwrap();
        assert_eq!(game.board().first_crown(), Some(false));
        assert_eq!(game.board().crown_ticker(), 0);

        for _ in 0..5 {
            game.bookkeeping().unwrap();
        }
        assert_eq!(game.end_check(), None);
        game.bookkeeping().unwrap();
        assert_eq!(
            game.end_check(),
            Some((TerminationReason::CrownWin, Some(heir_owner)))
        );
    }

    #[test]
    fn year_limit_takes_precedence() {
        let mut game = game(5);
        for _ in 0..15 {
            game.bookkeeping().unwrap();
        }
        assert_eq!(game.board().year(), 5);
        let crown = game.board().office_player(Office::Crown);
        assert_eq!(game.end_check(), Some((TerminationReason::FiveYears, crown)));
    }

    #[test]
    fn round_limit_is_an_error() {
        let config = GameConfig {
            max_rounds: 1,
            ..GameConfig::with_players(3, 2)
        };
        let mut game = Game::new(config, &[]).unwrap();
        assert!(matches!(
            game.play_to_completion(),
            Err(GameError::RoundLimitExceeded { rounds: 1 })
        ));
        assert!(game.summary().is_none());
    }

    #[test]
    fn same_seed_same_game() {
        let play = |seed| {
            let mut game = game(seed).with_oracle(FixedOutcome(true));
            game.play_to_completion().unwrap();
            game.summary().unwrap()
        };
        assert_eq!(play(42), play(42));
    }

    #[test]
    fn finished_game_narrates_its_end() {
        let mut game = game(9);
        let (reason, winner) = game.play_to_completion().unwrap();
        let summary = game.summary().unwrap();
        assert_eq!(summary.reason, reason);
        assert_eq!(summary.winner, winner);
        if reason == TerminationReason::CrisisEnd {
            assert!(winner.is_none());
        }
        assert!(summary.rounds <= game.config().max_rounds);
        game.board().check_invariants().unwrap();
    }
}
