//! Output formatting utilities for CLI.

#![allow(clippy::cast_precision_loss)]

use frontier::tournament::MatchReport;
use serde::Serialize;
use std::fmt::Write;

/// Format a match report as human-readable text.
pub(super) fn format_text(report: &MatchReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Match Result (seed: {})", report.seed);
    let _ = writeln!(
        output,
        "  Simulated: {:.1}s over {} steps",
        report.simulated_ms as f64 / 1000.0,
        report.steps
    );
    let _ = writeln!(output, "  Tiles captured: {}", report.tiles_captured);
    let _ = writeln!(output, "  Open conflicts: {}", report.open_conflicts);
    match report.leader {
        Some(leader) => {
            let name = report
                .factions
                .iter()
                .find(|f| f.id == leader)
                .map_or("Unknown", |f| f.name.as_str());
            let _ = writeln!(output, "  Leader: {name} (faction {leader})\n");
        }
        None => output.push_str("  Leader: none\n\n"),
    }

    let _ = writeln!(
        output,
        "  {:<10} {:>6} {:>10} {:>8} {:>10} {:>4} {:>4} {:>4}",
        "faction", "tiles", "people", "troops", "money", "mil", "urb", "eco"
    );
    for f in &report.factions {
        let _ = writeln!(
            output,
            "  {:<10} {:>6} {:>10} {:>8} {:>10} {:>4} {:>4} {:>4}",
            f.name,
            f.tiles,
            f.population,
            f.troops,
            f.money,
            f.military_level,
            f.urbanization_level,
            f.economy
        );
    }

    for violation in &report.violations {
        let _ = writeln!(output, "  VIOLATION: {violation}");
    }

    output
}

/// Tournament statistics for aggregated results.
///
/// Factions are compared by slot: slot `i` is `Bot i` in every match.
#[derive(Debug, Default)]
pub(super) struct TournamentStats {
    /// Total matches played.
    pub(super) games_played: u64,
    /// Matches each slot finished with the most land.
    pub(super) leads: Vec<u64>,
    /// Matches each slot finished with any land.
    survivals: Vec<u64>,
    /// Total tiles per slot.
    total_tiles: Vec<f64>,
    /// Tile sum of squares for std dev calculation.
    tile_sq_sums: Vec<f64>,
    /// Total tiles captured across all matches.
    total_captured: u64,
    /// Matches that ended with invariant violations.
    pub(super) failed_seeds: Vec<u64>,
}

impl TournamentStats {
    /// Create new stats for n slots.
    pub(super) fn new(num_slots: usize) -> Self {
        Self {
            games_played: 0,
            leads: vec![0; num_slots],
            survivals: vec![0; num_slots],
            total_tiles: vec![0.0; num_slots],
            tile_sq_sums: vec![0.0; num_slots],
            total_captured: 0,
            failed_seeds: Vec::new(),
        }
    }

    /// Add a match report to the stats.
    pub(super) fn add_report(&mut self, report: &MatchReport) {
        self.games_played += 1;
        self.total_captured += report.tiles_captured;

        if let Some(leader) = report.leader {
            let idx = usize::from(leader) - 1;
            if let Some(leads) = self.leads.get_mut(idx) {
                *leads += 1;
            }
        }

        for (i, faction) in report.factions.iter().enumerate().take(self.total_tiles.len()) {
            let tiles = faction.tiles as f64;
            self.total_tiles[i] += tiles;
            self.tile_sq_sums[i] += tiles * tiles;
            if faction.tiles > 0 {
                self.survivals[i] += 1;
            }
        }

        if !report.violations.is_empty() {
            self.failed_seeds.push(report.seed);
        }
    }

    /// Merge stats accumulated on another thread.
    pub(super) fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.total_captured += other.total_captured;
        for (a, b) in self.leads.iter_mut().zip(&other.leads) {
            *a += b;
        }
        for (a, b) in self.survivals.iter_mut().zip(&other.survivals) {
            *a += b;
        }
        for (a, b) in self.total_tiles.iter_mut().zip(&other.total_tiles) {
            *a += b;
        }
        for (a, b) in self.tile_sq_sums.iter_mut().zip(&other.tile_sq_sums) {
            *a += b;
        }
        self.failed_seeds.extend_from_slice(&other.failed_seeds);
        self.failed_seeds.sort_unstable();
    }

    fn ratio(&self, count: u64) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        count as f64 / self.games_played as f64
    }

    /// Share of matches a slot finished in the lead (0.0-1.0).
    pub(super) fn lead_rate(&self, slot: usize) -> f64 {
        self.ratio(self.leads.get(slot).copied().unwrap_or(0))
    }

    /// Share of matches a slot still held land at the end (0.0-1.0).
    pub(super) fn survival_rate(&self, slot: usize) -> f64 {
        self.ratio(self.survivals.get(slot).copied().unwrap_or(0))
    }

    /// Average final tiles for a slot.
    pub(super) fn avg_tiles(&self, slot: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_tiles.get(slot).copied().unwrap_or(0.0) / self.games_played as f64
    }

    /// Final tiles standard deviation for a slot.
    pub(super) fn tiles_std_dev(&self, slot: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        let n = self.games_played as f64;
        let mean = self.avg_tiles(slot);
        let sq_sum = self.tile_sq_sums.get(slot).copied().unwrap_or(0.0);
        let variance = (sq_sum / n) - (mean * mean);
        if variance < 0.0 { 0.0 } else { variance.sqrt() }
    }

    /// Average tiles captured per match.
    pub(super) fn avg_captured(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_captured as f64 / self.games_played as f64
    }

    fn slots(&self) -> usize {
        self.leads.len()
    }
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentResult {
    /// Total matches played.
    games_played: u64,
    /// Per-slot statistics.
    factions: Vec<JsonTournamentFaction>,
    /// Average tiles captured per match.
    avg_captured: f64,
    /// Seeds whose final state broke an invariant.
    failed_seeds: Vec<u64>,
}

/// JSON-serializable per-slot tournament stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentFaction {
    /// Faction id (1-based).
    faction: usize,
    /// Matches finished with the most land.
    leads: u64,
    /// Lead rate (0.0-1.0).
    lead_rate: f64,
    /// Survival rate (0.0-1.0).
    survival_rate: f64,
    /// Average final tiles.
    avg_tiles: f64,
    /// Final tiles standard deviation.
    tiles_std_dev: f64,
}

impl JsonTournamentResult {
    /// Create from stats.
    pub(super) fn from_stats(stats: &TournamentStats) -> Self {
        let factions = (0..stats.slots())
            .map(|i| JsonTournamentFaction {
                faction: i + 1,
                leads: stats.leads[i],
                lead_rate: stats.lead_rate(i),
                survival_rate: stats.survival_rate(i),
                avg_tiles: stats.avg_tiles(i),
                tiles_std_dev: stats.tiles_std_dev(i),
            })
            .collect();

        Self {
            games_played: stats.games_played,
            factions,
            avg_captured: stats.avg_captured(),
            failed_seeds: stats.failed_seeds.clone(),
        }
    }
}

/// Format tournament stats as human-readable text.
pub(super) fn format_tournament_text(stats: &TournamentStats) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Tournament Results ({} matches)", stats.games_played);
    output.push_str("========================================\n\n");

    output.push_str("Lead / Survival Rates:\n");
    for i in 0..stats.slots() {
        let _ = writeln!(
            output,
            "  Bot {i}: led {:.1}% ({} times), survived {:.1}%",
            stats.lead_rate(i) * 100.0,
            stats.leads[i],
            stats.survival_rate(i) * 100.0
        );
    }

    output.push_str("\nAverage Final Tiles:\n");
    for i in 0..stats.slots() {
        let _ = writeln!(
            output,
            "  Bot {i}: {:.1} (+/- {:.1})",
            stats.avg_tiles(i),
            stats.tiles_std_dev(i)
        );
    }

    let _ = writeln!(output, "\nAverage Tiles Captured: {:.0}", stats.avg_captured());
    if !stats.failed_seeds.is_empty() {
        let _ = writeln!(output, "Invariant failures in seeds: {:?}", stats.failed_seeds);
    }

    output
}

/// Format tournament stats as CSV.
pub(super) fn format_tournament_csv(stats: &TournamentStats) -> String {
    let mut output = String::new();

    // Header
    output.push_str("faction,leads,lead_rate,survival_rate,avg_tiles,tiles_std_dev\n");

    // Data rows
    for i in 0..stats.slots() {
        let _ = writeln!(
            output,
            "{},{},{:.4},{:.4},{:.2},{:.2}",
            i + 1,
            stats.leads[i],
            stats.lead_rate(i),
            stats.survival_rate(i),
            stats.avg_tiles(i),
            stats.tiles_std_dev(i)
        );
    }

    output
}
