pub mod reports;
pub mod strategies;
pub mod tournament;

pub use strategies::{load_strategies, save_strategies};
pub use tournament::{ReasonTally, Strategy, TournamentConfig, TournamentReport, run_tournament};
