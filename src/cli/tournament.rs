//! Tournament command implementation.

#![allow(clippy::cast_precision_loss)]

use super::output::{
    JsonTournamentResult, TournamentStats, format_tournament_csv, format_tournament_text,
};
use super::{CliError, MatchSettings, TournamentFormat};
use frontier::tournament::run_match;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;

/// Execute the tournament command.
///
/// Seeds run from the configured seed upward, one match each.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or output fails.
pub(crate) fn execute(
    settings: &MatchSettings,
    games: u64,
    threads: Option<usize>,
    format: TournamentFormat,
    progress: bool,
) -> Result<(), CliError> {
    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let config = &settings.config;
    let base_seed = config.seed;
    let num_slots = config.ai_countries;

    let pb = if progress {
        let pb = ProgressBar::new(games);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} matches ({per_sec})")
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    // Each thread folds into its own TournamentStats, merged at the end
    let stats = (0..games)
        .into_par_iter()
        .fold(
            || TournamentStats::new(num_slots),
            |mut local_stats, i| {
                let seed = base_seed.wrapping_add(i);
                match run_match(seed, config, settings.steps) {
                    Ok(report) => local_stats.add_report(&report),
                    Err(e) => log::error!("match {seed} failed: {e}"),
                }
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                local_stats
            },
        )
        .reduce(
            || TournamentStats::new(num_slots),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    let per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games_played as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match format {
        TournamentFormat::Text => {
            println!();
            print!("{}", format_tournament_text(&stats));
            println!();
            println!("Duration: {:.2}s ({per_sec:.1} matches/sec)", duration.as_secs_f64());
        }
        TournamentFormat::Json => {
            let json_result = JsonTournamentResult::from_stats(&stats);
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        TournamentFormat::Csv => {
            print!("{}", format_tournament_csv(&stats));
        }
    }

    if stats.failed_seeds.is_empty() {
        Ok(())
    } else {
        Err(CliError::new(format!(
            "invariant violations in {} match(es)",
            stats.failed_seeds.len()
        )))
    }
}
