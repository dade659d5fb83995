mod common;
mod logic;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use crownfall_game::{Game, GameConfig, GameError};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::parse_tiers;
use logic::{TournamentConfig, TournamentReport, load_strategies, run_tournament, save_strategies};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Tiered search for strong priority vectors
    Tournament,
    /// Play one game and print its event log
    Replay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "crownfall-tester", version)]
#[command(about = "Self-play tournaments and replays for the Crownfall rules engine")]
struct Args {
    /// Run mode: tournament (many games) or replay (one game)
    #[arg(long, value_enum, default_value_t = RunMode::Tournament)]
    mode: RunMode,

    /// Entrants per tier, largest first (comma-separated)
    #[arg(long, default_value = "200,40,8")]
    tiers: String,

    /// Games each strategy plays per tier
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Players seated at every game
    #[arg(long, default_value_t = 4)]
    players: usize,

    /// Actions each player takes per turn
    #[arg(long, default_value_t = 1)]
    actions_per_turn: usize,

    /// Master seed; game seeds count up from here
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Load the starting pool from a JSON strategy file
    #[arg(long)]
    strategies: Option<PathBuf>,

    /// Save the final tier's strategies to a JSON file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    match args.mode {
        RunMode::Tournament => run_tournament_mode(&args),
        RunMode::Replay => run_replay_mode(&args),
    }
}

fn announce_banner() {
    println!("{}", "👑 Crownfall Tester".bright_cyan().bold());
    println!("{}", "===================".cyan());
}

fn tournament_config(args: &Args) -> Result<TournamentConfig> {
    Ok(TournamentConfig {
        tiers: parse_tiers(&args.tiers)?,
        games_per_strategy: args.games,
        players: args.players,
        actions_per_turn: args.actions_per_turn,
        seed: args.seed,
        verbose: args.verbose,
    })
}

fn run_tournament_mode(args: &Args) -> Result<()> {
    let config = tournament_config(args)?;
    let seeded = match &args.strategies {
        Some(path) => load_strategies(path)?,
        None => Vec::new(),
    };
    println!(
        "🎲 Running {} tiers with seed {}",
        config.tiers.len(),
        config.seed.to_string().bright_white()
    );

    let start_time = Instant::now();
    let report = run_tournament(&config, seeded)?;

    if let Some(path) = &args.save {
        save_strategies(path, report.finalists())?;
    }
    write_reports(args, &report, start_time)
}

fn write_reports(args: &Args, report: &TournamentReport, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => logic::reports::generate_json_report(&mut output_target, report)?,
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(&mut output_target, report)?;
        }
        ReportFormat::Console => logic::reports::generate_console_report(
            &mut output_target,
            report,
            start_time.elapsed(),
        )?,
    }
    output_target.flush_inner()?;
    Ok(())
}

fn run_replay_mode(args: &Args) -> Result<()> {
    let priorities: Vec<_> = match &args.strategies {
        Some(path) => load_strategies(path)?
            .into_iter()
            .map(|s| s.priorities)
            .collect(),
        None => Vec::new(),
    };
    let config = GameConfig {
        actions_per_turn: args.actions_per_turn,
        ..GameConfig::with_players(args.players, args.seed)
    };
    let mut game = Game::new(config, &priorities).context("failed to set up game")?;
    match game.play_to_completion() {
        Ok(_) => {}
        Err(GameError::RoundLimitExceeded { rounds }) => {
            bail!("seed {} did not finish within {rounds} rounds", args.seed);
        }
        Err(err) => return Err(err).context("game failed"),
    }
    let summary = game
        .summary()
        .context("finished game produced no summary")?;

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => {
            writeln!(output_target, "{}", serde_json::to_string_pretty(&summary)?)?;
        }
        ReportFormat::Console | ReportFormat::Markdown => {
            logic::reports::generate_replay_report(&mut output_target, &summary)?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            mode: RunMode::Tournament,
            tiers: "4,2".to_string(),
            games: 1,
            players: 3,
            actions_per_turn: 1,
            seed: 7,
            strategies: None,
            save: None,
            report: ReportFormat::Json,
            verbose: false,
            output: None,
        }
    }

    #[test]
    fn args_parse_with_defaults() {
        let args = Args::parse_from(["crownfall-tester"]);
        assert_eq!(args.mode, RunMode::Tournament);
        assert_eq!(args.tiers, "200,40,8");
        assert_eq!(args.games, 10);
        assert_eq!(args.players, 4);
        assert_eq!(args.seed, 1337);
        assert_eq!(args.report, ReportFormat::Console);
    }

    #[test]
    fn tournament_config_rejects_growing_tiers() {
        let args = Args {
            tiers: "2,4".to_string(),
            ..base_args()
        };
        assert!(tournament_config(&args).is_err());
        let config = tournament_config(&base_args()).unwrap();
        assert_eq!(config.tiers, vec![4, 2]);
    }

    #[test]
    fn write_reports_emits_markdown() {
        let temp = std::env::temp_dir().join(format!("crownfall-report-{}.md", std::process::id()));
        let args = Args {
            report: ReportFormat::Markdown,
            output: Some(temp.clone()),
            ..base_args()
        };
        let config = tournament_config(&args).unwrap();
        let report = run_tournament(&config, Vec::new()).unwrap();
        write_reports(&args, &report, Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.contains("# Crownfall Tournament Results"));
        let _ = std::fs::remove_file(temp);
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
