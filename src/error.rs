//! Error types for the simulation core.

use std::path::PathBuf;

use thiserror::Error;

use crate::game::{Coord, FactionId};

/// Errors returned by match commands.
///
/// Gameplay outcomes such as "not adjacent" or "not enough troops" are not
/// errors; they are reported through `bool` returns. These variants mean the
/// caller asked for something that cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No faction with this id has been created.
    #[error("unknown faction {0}")]
    UnknownFaction(FactionId),
    /// Every faction id is taken.
    #[error("faction table is full ({0} factions)")]
    TooManyFactions(usize),
    /// Coordinate outside the map.
    #[error("coordinate ({}, {}) is outside the map", .0.x, .0.y)]
    OutOfBounds(Coord),
    /// Only Neutral may hold water.
    #[error("coordinate ({}, {}) is water", .0.x, .0.y)]
    NotLand(Coord),
    /// Mobilization targets are percentages in `1..=100`.
    #[error("mobilization target {0}% is outside 1..=100")]
    InvalidMobilization(u8),
    /// The ownership index disagrees with the map.
    #[error(transparent)]
    Territory(#[from] TerritoryError),
}

/// Errors raised by the tile-ownership mutation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TerritoryError {
    /// The tile's recorded owner did not list the tile in its owned set.
    #[error("ownership index drift at ({}, {}): faction {owner} does not list the tile", .coord.x, .coord.y)]
    OwnershipDrift {
        /// Tile being reassigned.
        coord: Coord,
        /// Owner according to the map.
        owner: FactionId,
    },
}

/// Errors loading or validating a [`MatchConfig`](crate::config::MatchConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The configuration is not valid JSON for the expected shape.
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configuration parsed but describes an impossible match.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result alias for match commands.
pub type MatchResult<T> = Result<T, MatchError>;
