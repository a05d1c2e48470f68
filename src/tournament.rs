//! Headless match runner.
//!
//! Provides a pure function interface: `(seed, config, steps) -> MatchReport`
//!
//! The runner handles:
//! - Terrain generation and AI bootstrap from the seed
//! - A simulated clock advancing one attack interval per step
//! - Invariant checks on the final state

use serde::Serialize;

use crate::config::MatchConfig;
use crate::error::ConfigError;
use crate::game::{FactionId, FactionKind, Match, NEUTRAL, check_invariants};

/// Final state of one faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactionReport {
    /// Faction id.
    pub id: FactionId,
    /// Display name.
    pub name: String,
    /// Whether a player controls it.
    pub human: bool,
    /// Tiles owned.
    pub tiles: usize,
    /// Total population.
    pub population: u64,
    /// Troops available.
    pub troops: u64,
    /// Treasury.
    pub money: u64,
    /// Military level.
    pub military_level: u32,
    /// Urbanization level.
    pub urbanization_level: u32,
    /// Last economy score.
    pub economy: u32,
}

/// Final result of a headless match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    /// The seed used for this match.
    pub seed: u64,
    /// Steps simulated.
    pub steps: u64,
    /// Simulated milliseconds at the last step.
    pub simulated_ms: u64,
    /// Tile ownership changes across all steps.
    pub tiles_captured: u64,
    /// Conflicts still running at the end.
    pub open_conflicts: usize,
    /// Faction with the most land (Neutral excluded).
    pub leader: Option<FactionId>,
    /// Every faction except Neutral.
    pub factions: Vec<FactionReport>,
    /// Invariant violations found at the end; empty for a healthy run.
    pub violations: Vec<String>,
}

impl MatchReport {
    /// Factions that still own land.
    #[must_use]
    pub fn surviving(&self) -> usize {
        self.factions.iter().filter(|f| f.tiles > 0).count()
    }
}

/// Run a bot-only match for `steps` attack intervals.
///
/// Given the same seed, configuration and step count, this function always
/// produces the same report.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn run_match(seed: u64, config: &MatchConfig, steps: u64) -> Result<MatchReport, ConfigError> {
    let config = MatchConfig {
        seed,
        ..*config
    };
    let mut game = Match::new(&config)?;
    game.set_game_started();

    let step_ms = config.intervals.attack_ms;
    let mut tiles_captured = 0u64;
    let mut now_ms = 0;
    for step in 0..steps {
        now_ms = step.saturating_mul(step_ms);
        tiles_captured += game.tick_at(now_ms).len() as u64;
    }
    log::debug!("match {seed}: {tiles_captured} tiles captured in {steps} steps");

    Ok(build_report(&game, seed, steps, now_ms, tiles_captured))
}

fn build_report(game: &Match, seed: u64, steps: u64, simulated_ms: u64, tiles_captured: u64) -> MatchReport {
    let factions: Vec<FactionReport> = game
        .countries()
        .iter()
        .filter(|country| country.id() != NEUTRAL)
        .map(|country| FactionReport {
            id: country.id(),
            name: country.name().to_string(),
            human: matches!(country.kind(), FactionKind::Human),
            tiles: game.ownership().count(country.id()),
            population: country.pyramid().total_population(),
            troops: country.troops(),
            money: country.money(),
            military_level: country.military_level(),
            urbanization_level: country.urbanization_level(),
            economy: country.last_economy(),
        })
        .collect();

    let leader = factions
        .iter()
        .filter(|f| f.tiles > 0)
        .max_by_key(|f| (f.tiles, std::cmp::Reverse(f.id)))
        .map(|f| f.id);

    MatchReport {
        seed,
        steps,
        simulated_ms,
        tiles_captured,
        open_conflicts: game.conflicts().count(),
        leader,
        factions,
        violations: check_invariants(game).into_iter().map(|v| v.message).collect(),
    }
}
