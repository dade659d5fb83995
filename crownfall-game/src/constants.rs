//! Centralized balance and tuning constants for Crownfall rules.
//!
//! Board geometry, deck composition, and payout magnitudes live here so the
//! rules can only be retuned through reviewed code changes.

// Board geometry -----------------------------------------------------------
pub const BUILDING_PLOTS: usize = 15;
pub const COURT_SEATS: usize = 13;
pub const CAMPAIGN_CAPACITY: usize = 6;
pub const DUNGEON_CAPACITY: usize = 3;
pub const BUILD_QUEUE_LEN: usize = 3;

// Player setup -------------------------------------------------------------
pub const CHARACTERS_PER_PLAYER: usize = 6;
pub const WORKERS_PER_PLAYER: usize = 4;
pub const STARTING_GOLD: i64 = 20;
pub const STARTING_FOOD: i64 = 6;
pub const STARTING_PRESTIGE: i64 = 6;

// Game length --------------------------------------------------------------
pub const DEFAULT_MAX_ROUNDS: u32 = 100;
pub const DEFAULT_YEAR_LIMIT: u32 = 5;
pub const DEFAULT_CRISIS_LIMIT: usize = 3;
pub const FIRST_CROWN_WIN_ROUNDS: u32 = 9;
pub const CROWN_WIN_ROUNDS: u32 = 6;

// Base action costs --------------------------------------------------------
/// Prestige paid for a court seat; players below it are never offered one.
pub const COURT_ENTRY_PRESTIGE: i64 = 2;
pub const CAMPAIGN_FOOD_COST: i64 = 1;
pub const RETAINER_HIRE_GOLD: i64 = 3;
pub const BLUFF_PENALTY_PRESTIGE: i64 = 2;

// Office actions -----------------------------------------------------------
pub const TITHE_GOLD: i64 = 2;
pub const TAX_GOLD: i64 = 2;
pub const TAX_PRESTIGE_PENALTY: i64 = 2;
pub const AUDIT_MIN_GOLD: i64 = 3;
pub const AUDIT_MAX_GOLD: i64 = 8;
pub const BLACKMAIL_PRESTIGE: i64 = 2;
pub const FINE_GOLD: i64 = 10;
pub const FAILED_ARREST_PRESTIGE: i64 = 2;

// Campaign rolls -----------------------------------------------------------
pub const CAMPAIGN_JACKPOT_GOLD: i64 = 10;
pub const CAMPAIGN_JACKPOT_PRESTIGE: i64 = 2;

// Scoring ------------------------------------------------------------------
pub const CHALLENGE_RISK: f64 = 3.0;
pub const DELEGATED_PREFIX: &str = "As ordered by the crown: ";
