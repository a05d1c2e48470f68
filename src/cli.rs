//! CLI command implementations for Frontier.

pub(crate) mod run;
pub(crate) mod tournament;

mod output;

use clap::ValueEnum;
use frontier::{ConfigError, MatchConfig, RandomGenerator};
use std::error::Error;
use std::fmt;
use std::path::Path;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

/// Resolved settings for a command: file values overridden by flags.
#[derive(Debug, Clone)]
pub(crate) struct MatchSettings {
    /// Match configuration, seed included.
    pub(crate) config: MatchConfig,
    /// Attack intervals to simulate.
    pub(crate) steps: u64,
}

impl MatchSettings {
    /// Load the optional config file and apply flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or the result is invalid.
    pub(crate) fn load(
        path: Option<&Path>,
        seed: Option<u64>,
        width: Option<u32>,
        height: Option<u32>,
        bots: Option<usize>,
        steps: u64,
    ) -> Result<Self, CliError> {
        let mut config = match path {
            Some(path) => MatchConfig::from_json_file(path)?,
            None => MatchConfig::default(),
        };
        if let Some(width) = width {
            config.width = width;
        }
        if let Some(height) = height {
            config.height = height;
        }
        if let Some(bots) = bots {
            config.ai_countries = bots;
        }
        // Flag first, then the file; with neither, pick one at random.
        config.seed = match (seed, path) {
            (Some(seed), _) => seed,
            (None, Some(_)) => config.seed,
            (None, None) => random_seed(),
        };
        config.validate()?;

        Ok(Self { config, steps })
    }
}

/// Fresh seed from OS entropy.
fn random_seed() -> u64 {
    RandomGenerator::from_entropy().seed()
}
