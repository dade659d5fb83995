//! Tiered tournament search over priority vectors.
//!
//! Each tier plays every entrant as seat 0 against opponents drawn from the
//! rest of the tier, ranks entrants by wins and advances the best.
use anyhow::{Context, Result, bail};
use colored::Colorize;
use crownfall_game::{Game, GameConfig, GameError, PlayerId, Priorities, TerminationReason};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A candidate priority vector and its record in the current tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: usize,
    pub priorities: Priorities,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub games: u32,
}

impl Strategy {
    #[must_use]
    pub const fn new(id: usize, priorities: Priorities) -> Self {
        Self {
            id,
            priorities,
            wins: 0,
            games: 0,
        }
    }

    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.games)
        }
    }
}

#[derive(Debug, Clone)]
pub struct TournamentConfig {
    /// Entrants per tier; the first is the starting pool.
    pub tiers: Vec<usize>,
    pub games_per_strategy: usize,
    pub players: usize,
    pub actions_per_turn: usize,
    pub seed: u64,
    pub verbose: bool,
}

impl TournamentConfig {
    fn game_config(&self, seed: u64) -> GameConfig {
        GameConfig {
            actions_per_turn: self.actions_per_turn,
            ..GameConfig::with_players(self.players, seed)
        }
    }
}

/// How the games of a tier ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonTally {
    pub five_years: u32,
    pub crown_win: u32,
    pub crisis_end: u32,
    pub family_extinguished: u32,
    /// Games that hit the round ceiling. These count for nobody.
    pub round_limit: u32,
}

impl ReasonTally {
    fn record(&mut self, reason: TerminationReason) {
        match reason {
            TerminationReason::FiveYears => self.five_years += 1,
            TerminationReason::CrownWin => self.crown_win += 1,
            TerminationReason::CrisisEnd => self.crisis_end += 1,
            TerminationReason::FamilyExtinguished => self.family_extinguished += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.five_years + self.crown_win + self.crisis_end + self.family_extinguished + self.round_limit
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierResult {
    pub tier: usize,
    pub entrants: usize,
    pub games: u32,
    pub reasons: ReasonTally,
    /// Entrants by wins, best first.
    pub ranking: Vec<Strategy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentReport {
    pub seed: u64,
    pub players: usize,
    pub games_per_strategy: usize,
    pub tiers: Vec<TierResult>,
}

impl TournamentReport {
    /// Ranking of the final tier.
    #[must_use]
    pub fn finalists(&self) -> &[Strategy] {
        self.tiers.last().map_or(&[], |t| t.ranking.as_slice())
    }
}

/// Sample `count` fresh strategies.
pub fn random_strategies(count: usize, rng: &mut ChaCha8Rng) -> Vec<Strategy> {
    (0..count)
        .map(|id| Strategy::new(id, Priorities::random(rng)))
        .collect()
}

/// Run every tier. `seeded` strategies replace the random starting pool
/// when given.
///
/// # Errors
///
/// Returns an error for an invalid config or a game that breaks its own rules.
pub fn run_tournament(config: &TournamentConfig, seeded: Vec<Strategy>) -> Result<TournamentReport> {
    config
        .game_config(config.seed)
        .validate()
        .context("invalid tournament game settings")?;
    if config.games_per_strategy == 0 {
        bail!("each strategy must play at least one game");
    }
    let Some(&pool) = config.tiers.first() else {
        bail!("at least one tier is required");
    };

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut entrants = if seeded.is_empty() {
        random_strategies(pool, &mut rng)
    } else {
        seeded
    };
    let mut next_seed = config.seed;
    let mut tiers = Vec::with_capacity(config.tiers.len());

    for (index, &size) in config.tiers.iter().enumerate() {
        entrants.truncate(size);
        if entrants.is_empty() {
            bail!("tier {index} has no entrants");
        }
        let result = play_tier(index, entrants, config, &mut rng, &mut next_seed)?;
        if config.verbose {
            if let Some(best) = result.ranking.first() {
                println!(
                    "🏆 Tier {} ({} entrants): best #{} with {}/{} wins",
                    index.to_string().bright_white(),
                    result.entrants,
                    best.id,
                    best.wins.to_string().green(),
                    best.games
                );
            }
        }
        entrants = result.ranking.clone();
        tiers.push(result);
    }

    Ok(TournamentReport {
        seed: config.seed,
        players: config.players,
        games_per_strategy: config.games_per_strategy,
        tiers,
    })
}

fn play_tier(
    index: usize,
    mut entrants: Vec<Strategy>,
    config: &TournamentConfig,
    rng: &mut ChaCha8Rng,
    next_seed: &mut u64,
) -> Result<TierResult> {
    let mut reasons = ReasonTally::default();
    let mut games = 0;
    let pool: Vec<Priorities> = entrants.iter().map(|s| s.priorities).collect();

    for (seat, entrant) in entrants.iter_mut().enumerate() {
        entrant.wins = 0;
        entrant.games = 0;
        let rivals: Vec<Priorities> = pool
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != seat)
            .map(|(_, p)| *p)
            .collect();

        for _ in 0..config.games_per_strategy {
            let mut table = vec![entrant.priorities];
            for _ in 1..config.players {
                let rival = match rivals.choose(rng) {
                    Some(p) => *p,
                    None => Priorities::random(rng),
                };
                table.push(rival);
            }

            let seed = *next_seed;
            *next_seed = next_seed.wrapping_add(1);
            let mut game = Game::new(config.game_config(seed), &table)
                .with_context(|| format!("setting up game with seed {seed}"))?;
            games += 1;
            entrant.games += 1;
            match game.play_to_completion() {
                Ok((reason, winner)) => {
                    reasons.record(reason);
                    if winner == Some(PlayerId(0)) {
                        entrant.wins += 1;
                    }
                }
                Err(GameError::RoundLimitExceeded { rounds }) => {
                    log::warn!("seed {seed} ran past {rounds} rounds");
                    reasons.round_limit += 1;
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("game with seed {seed} failed"));
                }
            }
        }
        log::debug!(
            "tier {index}: strategy {} won {}/{}",
            entrant.id,
            entrant.wins,
            entrant.games
        );
    }

    // Stable: ties keep their entry order.
    entrants.sort_by(|a, b| b.wins.cmp(&a.wins));
    Ok(TierResult {
        tier: index,
        entrants: entrants.len(),
        games,
        reasons,
        ranking: entrants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TournamentConfig {
        TournamentConfig {
            tiers: vec![6, 3],
            games_per_strategy: 2,
            players: 3,
            actions_per_turn: 1,
            seed: 21,
            verbose: false,
        }
    }

    #[test]
    fn tiers_shrink_and_rank_by_wins() {
        let report = run_tournament(&small_config(), Vec::new()).unwrap();
        assert_eq!(report.tiers.len(), 2);
        assert_eq!(report.tiers[0].entrants, 6);
        assert_eq!(report.tiers[1].entrants, 3);
        assert_eq!(report.tiers[0].games, 12);
        assert_eq!(report.tiers[0].reasons.total(), 12);
        for tier in &report.tiers {
            assert!(tier.ranking.windows(2).all(|w| w[0].wins >= w[1].wins));
        }
        let advanced: Vec<usize> = report.tiers[1].ranking.iter().map(|s| s.id).collect();
        let top: Vec<usize> = report.tiers[0].ranking[..3].iter().map(|s| s.id).collect();
        let mut advanced_sorted = advanced.clone();
        let mut top_sorted = top.clone();
        advanced_sorted.sort_unstable();
        top_sorted.sort_unstable();
        assert_eq!(advanced_sorted, top_sorted);
    }

    #[test]
    fn tournaments_are_reproducible() {
        let first = run_tournament(&small_config(), Vec::new()).unwrap();
        let second = run_tournament(&small_config(), Vec::new()).unwrap();
        assert_eq!(first.finalists(), second.finalists());
    }

    #[test]
    fn seeded_pool_replaces_random_entrants() {
        let seeded = vec![
            Strategy::new(40, Priorities::default()),
            Strategy::new(41, Priorities::default()),
        ];
        let config = TournamentConfig {
            tiers: vec![2],
            games_per_strategy: 1,
            ..small_config()
        };
        let report = run_tournament(&config, seeded).unwrap();
        let mut ids: Vec<usize> = report.finalists().iter().map(|s| s.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![40, 41]);
    }

    #[test]
    fn bad_settings_are_rejected() {
        let config = TournamentConfig {
            players: 1,
            ..small_config()
        };
        assert!(run_tournament(&config, Vec::new()).is_err());
        let config = TournamentConfig {
            games_per_strategy: 0,
            ..small_config()
        };
        assert!(run_tournament(&config, Vec::new()).is_err());
    }
}
