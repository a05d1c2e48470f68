//! Simulation core.
//!
//! - Map with terrain-typed tiles and an ownership index
//! - Countries with a population pyramid, economy and optional AI
//! - Conflict resolution with a cached border front
//! - The match orchestrator and its tick loop

mod attack;
mod country;
mod economy;
mod invariants;
mod map;
pub mod pyramid;
mod state;
mod territory;

pub use attack::{
    AttackOutcome, BASE_TILE_COST, Conflict, NEUTRAL_DEFENCE, combat_strength, expand_front,
    tile_cost,
};
pub use country::{
    AI_DECISION_INTERVAL_MS, AI_MOBILIZATION, AI_RESERVE_TROOPS, AiBehavior, Color, Country,
    DEFAULT_MOBILIZATION, FactionId, FactionKind, NEUTRAL,
};
pub use economy::{
    EconomyHistory, EconomyScore, MONEY_PRODUCING_AGE_MAX, MONEY_PRODUCING_AGE_MIN,
    economy_score, trend_score, workforce,
};
pub use invariants::{InvariantViolation, assert_invariants, check_invariants};
pub use map::{Border, Coord, Map, Tile, TileIndex, TileType};
pub use pyramid::{AgeBand, PopulationPyramid};
pub use state::{GameState, Match, TickIntervals};
pub use territory::{OwnershipIndex, Territory};
