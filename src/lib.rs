// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Frontier: the simulation core of a territorial-conquest strategy game.
//!
//! This crate owns everything that decides who holds which tile:
//! - Noise-generated terrain
//! - Factions with age-stratified populations and a simple economy
//! - Conflicts that eat into a neighbour's land tick by tick
//! - Seeded AI opponents
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Headless Runner / Tournament      │
//! ├─────────────────────────────────────┤
//! │   Match (tick loop, commands, AI)   │
//! ├──────────────┬──────────────────────┤
//! │  Conflicts   │  Countries, Pyramids │
//! ├──────────────┴──────────────────────┤
//! │   Map + Ownership Index, Terrain    │
//! └─────────────────────────────────────┘
//! ```
//!
//! Rendering and input are left to the caller: it reads tiles and
//! factions between ticks and uses the set of changed tiles that
//! [`Match::tick`] returns to redraw incrementally.

pub mod config;
pub mod error;
pub mod game;
pub mod rng;
pub mod terrain;
pub mod tournament;

pub use config::MatchConfig;
pub use error::{ConfigError, MatchError, MatchResult, TerritoryError};

// Re-export key game types at crate root for convenience
pub use game::{
    Color, Coord, Country, FactionId, GameState, Map, Match, NEUTRAL, Tile, TileType,
};
pub use rng::RandomGenerator;
