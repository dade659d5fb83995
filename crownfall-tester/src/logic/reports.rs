use anyhow::Result;
use colored::Colorize;
use crownfall_game::{Effects, GameEvent, GameSummary};
use std::io::Write;
use std::time::Duration;

use super::{ReasonTally, Strategy, TournamentReport};

fn weights_line(weights: &Effects) -> String {
    format!(
        "gold {:.2} food {:.2} prestige {:.2} reputation {:.2} power {:.2} risk {:.2} karma {:.2}",
        weights.gold,
        weights.food,
        weights.prestige,
        weights.reputation,
        weights.power,
        weights.risk,
        weights.karma
    )
}

fn reasons_line(reasons: &ReasonTally) -> String {
    format!(
        "five_years {} | crown_win {} | crisis_end {} | family_extinguished {} | round_limit {}",
        reasons.five_years,
        reasons.crown_win,
        reasons.crisis_end,
        reasons.family_extinguished,
        reasons.round_limit
    )
}

fn percent(strategy: &Strategy) -> f64 {
    strategy.win_rate() * 100.0
}

pub fn generate_console_report(
    writer: &mut dyn Write,
    report: &TournamentReport,
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Tournament Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "=====================".cyan())?;
    writeln!(
        writer,
        "Seed: {}  Players: {}  Games per strategy: {}",
        report.seed, report.players, report.games_per_strategy
    )?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for tier in &report.tiers {
        writeln!(
            writer,
            "{} {} entrants, {} games",
            format!("Tier {}:", tier.tier).bold(),
            tier.entrants,
            tier.games
        )?;
        writeln!(writer, "   Endings: {}", reasons_line(&tier.reasons))?;
        if tier.reasons.round_limit > 0 {
            writeln!(
                writer,
                "   {}",
                format!("{} games hit the round limit", tier.reasons.round_limit).yellow()
            )?;
        }
        for strategy in tier.ranking.iter().take(3) {
            writeln!(
                writer,
                "   • #{} {}/{} wins ({:.1}%)",
                strategy.id,
                strategy.wins.to_string().green(),
                strategy.games,
                percent(strategy)
            )?;
        }
        writeln!(writer)?;
    }

    if let Some(best) = report.finalists().first() {
        writeln!(writer, "{}", "🏆 Best Strategy".bright_yellow().bold())?;
        writeln!(writer, "{}", "================".yellow())?;
        writeln!(writer, "#{} won {:.1}% of its games", best.id, percent(best))?;
        writeln!(writer, "{}", weights_line(best.priorities.weights()))?;
    }
    Ok(())
}

pub fn generate_json_report(writer: &mut dyn Write, report: &TournamentReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(writer: &mut dyn Write, report: &TournamentReport) -> Result<()> {
    writeln!(writer, "# Crownfall Tournament Results\n")?;
    writeln!(
        writer,
        "Seed `{}`, {} players, {} games per strategy.\n",
        report.seed, report.players, report.games_per_strategy
    )?;

    writeln!(writer, "## Tiers\n")?;
    writeln!(
        writer,
        "| Tier | Entrants | Games | Five years | Crown win | Crisis end | Extinguished | Round limit |"
    )?;
    writeln!(
        writer,
        "|------|----------|-------|------------|-----------|------------|--------------|-------------|"
    )?;
    for tier in &report.tiers {
        let r = &tier.reasons;
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} | {} | {} | {} |",
            tier.tier,
            tier.entrants,
            tier.games,
            r.five_years,
            r.crown_win,
            r.crisis_end,
            r.family_extinguished,
            r.round_limit
        )?;
    }

    let finalists = report.finalists();
    if !finalists.is_empty() {
        writeln!(writer, "\n## Finalists\n")?;
        writeln!(writer, "| Strategy | Wins | Games | Win rate | Weights |")?;
        writeln!(writer, "|----------|------|-------|----------|---------|")?;
        for strategy in finalists {
            writeln!(
                writer,
                "| #{} | {} | {} | {:.1}% | {} |",
                strategy.id,
                strategy.wins,
                strategy.games,
                percent(strategy),
                weights_line(strategy.priorities.weights())
            )?;
        }
    }
    Ok(())
}

/// Colored event log of a single game followed by its outcome.
pub fn generate_replay_report(writer: &mut dyn Write, summary: &GameSummary) -> Result<()> {
    for event in &summary.log {
        match event {
            GameEvent::Game { message } => writeln!(writer, "{}", message.bright_white())?,
            GameEvent::Player { player, message } => {
                writeln!(writer, "  {} {message}", player.to_string().cyan())?;
            }
            GameEvent::Debug { message } => writeln!(writer, "  {}", message.dimmed())?,
        }
    }
    writeln!(writer)?;
    writeln!(writer, "{}", "📜 Game Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "===============".cyan())?;
    writeln!(writer, "Ending: {}", summary.reason)?;
    let winner = summary
        .winner
        .map_or_else(|| "nobody".to_string(), |p| p.to_string());
    writeln!(writer, "Winner: {}", winner.green())?;
    writeln!(writer, "Rounds: {}  Year: {}", summary.rounds, summary.year)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::tournament::TierResult;
    use crownfall_game::{PlayerId, Priorities, TerminationReason};

    fn sample_report() -> TournamentReport {
        let best = Strategy {
            wins: 3,
            games: 4,
            ..Strategy::new(2, Priorities::default())
        };
        let rest = Strategy {
            wins: 1,
            games: 4,
            ..Strategy::new(5, Priorities::default())
        };
        TournamentReport {
            seed: 9,
            players: 3,
            games_per_strategy: 4,
            tiers: vec![TierResult {
                tier: 0,
                entrants: 2,
                games: 8,
                reasons: ReasonTally {
                    five_years: 5,
                    crown_win: 2,
                    round_limit: 1,
                    ..ReasonTally::default()
                },
                ranking: vec![best, rest],
            }],
        }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn console_report_names_the_best_strategy() {
        colored::control::set_override(false);
        let report = sample_report();
        let text = render(|w| generate_console_report(w, &report, Duration::ZERO));
        assert!(text.contains("Tournament Summary"));
        assert!(text.contains("#2 won 75.0%"));
        assert!(text.contains("1 games hit the round limit"));
    }

    #[test]
    fn json_report_round_trips() {
        let report = sample_report();
        let text = render(|w| generate_json_report(w, &report));
        let parsed: TournamentReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.finalists(), report.finalists());
    }

    #[test]
    fn markdown_report_has_tables() {
        let report = sample_report();
        let text = render(|w| generate_markdown_report(w, &report));
        assert!(text.starts_with("# Crownfall Tournament Results"));
        assert!(text.contains("| 0 | 2 | 8 | 5 | 2 | 0 | 0 | 1 |"));
        assert!(text.contains("| #2 | 3 | 4 | 75.0% |"));
    }

    #[test]
    fn replay_report_ends_with_the_outcome() {
        colored::control::set_override(false);
        let summary = GameSummary {
            reason: TerminationReason::CrownWin,
            winner: Some(PlayerId(1)),
            rounds: 9,
            year: 3,
            log: vec![
                GameEvent::game("Summer of year 0"),
                GameEvent::player(PlayerId(1), "built a market"),
            ],
        };
        let text = render(|w| generate_replay_report(w, &summary));
        assert!(text.contains("P1 built a market"));
        assert!(text.contains("Ending: crown_win"));
        assert!(text.contains("Winner: P1"));
    }
}
