//! Frontier CLI - run headless matches and seed tournaments.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Frontier - territorial-conquest simulation core
#[derive(Parser, Debug)]
#[command(name = "frontier")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log filter (error, warn, info, debug, trace); RUST_LOG overrides it
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Match settings shared by every command.
#[derive(ClapArgs, Debug, Clone)]
struct MatchArgs {
    /// JSON match configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed (default: random)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Map width in tiles
    #[arg(long)]
    width: Option<u32>,

    /// Map height in tiles
    #[arg(long)]
    height: Option<u32>,

    /// Number of AI factions
    #[arg(short, long)]
    bots: Option<usize>,

    /// Attack intervals to simulate (default: 2000, 100 simulated seconds)
    #[arg(long, default_value = "2000")]
    steps: u64,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single headless match between AI factions
    Run {
        #[command(flatten)]
        common: MatchArgs,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Suppress the header line
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run many seeds in parallel and aggregate statistics
    Tournament {
        #[command(flatten)]
        common: MatchArgs,

        /// Number of matches to run (default: 100)
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },
}

impl MatchArgs {
    fn settings(&self) -> Result<cli::MatchSettings, cli::CliError> {
        cli::MatchSettings::load(
            self.config.as_deref(),
            self.seed,
            self.width,
            self.height,
            self.bots,
            self.steps,
        )
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level.as_str()))
        .init();

    let result = match args.command {
        Commands::Run {
            common,
            format,
            quiet,
        } => common
            .settings()
            .and_then(|settings| cli::run::execute(&settings, format, quiet)),

        Commands::Tournament {
            common,
            games,
            threads,
            format,
            progress,
        } => common.settings().and_then(|settings| {
            cli::tournament::execute(&settings, games, threads, format, progress)
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
