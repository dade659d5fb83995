//! Strategy pools persisted as JSON.
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::Strategy;

/// Read a pool written by [`save_strategies`]. Win counts in the file are
/// kept but reset once the strategy plays.
///
/// # Errors
///
/// Returns an error when the file is missing or is not a strategy list.
pub fn load_strategies(path: &Path) -> Result<Vec<Strategy>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read strategies from {}", path.display()))?;
    let strategies: Vec<Strategy> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse strategies in {}", path.display()))?;
    log::info!("loaded {} strategies from {}", strategies.len(), path.display());
    Ok(strategies)
}

/// # Errors
///
/// Returns an error when the file cannot be written.
pub fn save_strategies(path: &Path, strategies: &[Strategy]) -> Result<()> {
    let json = serde_json::to_string_pretty(strategies)?;
    fs::write(path, json)
        .with_context(|| format!("failed to write strategies to {}", path.display()))?;
    log::info!("saved {} strategies to {}", strategies.len(), path.display());
    Ok(())
}
