//! Match invariants - consistency checks that detect bugs.
//!
//! None of these can be broken through the public command surface. A
//! violation means the simulation itself corrupted its state.

use crate::game::{FactionKind, Match, NEUTRAL};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check all match invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(game: &Match) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let map = game.map();
    let ownership = game.ownership();

    // Tile owner -> index
    for (index, tile) in map.tiles().iter().enumerate() {
        if !ownership.contains(tile.owner, index) {
            let coord = map.coord_of(index);
            violations.push(violation(format!(
                "Tile ({}, {}) is owned by {} but missing from its ownership set",
                coord.x, coord.y, tile.owner
            )));
        }
        if !tile.tile_type.is_land() && tile.owner != NEUTRAL {
            let coord = map.coord_of(index);
            violations.push(violation(format!(
                "Water tile ({}, {}) is owned by {}",
                coord.x, coord.y, tile.owner
            )));
        }
    }

    // Index -> tile owner
    for (faction, tiles) in ownership.iter() {
        if game.country(faction).is_none() {
            violations.push(violation(format!(
                "Ownership index lists unknown faction {faction}"
            )));
        }
        for &index in tiles {
            match map.tiles().get(index) {
                Some(tile) if tile.owner == faction => {}
                Some(tile) => violations.push(violation(format!(
                    "Faction {faction} lists tile {index}, which belongs to {}",
                    tile.owner
                ))),
                None => violations.push(violation(format!(
                    "Faction {faction} lists tile {index} outside the map"
                ))),
            }
        }
    }

    // Neutral
    match game.country(NEUTRAL) {
        Some(neutral) => {
            if neutral.kind() != &FactionKind::Neutral {
                violations.push(violation("Faction 0 is not Neutral".to_string()));
            }
            if neutral.troops() > 0 {
                violations.push(violation(format!(
                    "Neutral has {} troops",
                    neutral.troops()
                )));
            }
        }
        None => violations.push(violation("Neutral faction is missing".to_string())),
    }

    // Faction table
    for (index, country) in game.countries().iter().enumerate() {
        if usize::from(country.id()) != index {
            violations.push(violation(format!(
                "Faction at slot {index} has id {}",
                country.id()
            )));
        }
        if index > 0 && country.kind() == &FactionKind::Neutral {
            violations.push(violation(format!("Faction {index} claims to be Neutral")));
        }
        if country.urbanization_level() == 0 || country.military_level() == 0 {
            violations.push(violation(format!(
                "Faction {index} has urbanization {} and military {}",
                country.urbanization_level(),
                country.military_level()
            )));
        }
        if !(1..=100).contains(&country.target_mobilization()) {
            violations.push(violation(format!(
                "Faction {index} mobilizes {}%",
                country.target_mobilization()
            )));
        }
    }

    // Conflict table
    for conflict in game.conflicts() {
        let (attacker, defender) = (conflict.attacker(), conflict.defender());
        if attacker == NEUTRAL || attacker == defender {
            violations.push(violation(format!(
                "Conflict {attacker} -> {defender} cannot exist"
            )));
        }
        if game.country(attacker).is_none() || game.country(defender).is_none() {
            violations.push(violation(format!(
                "Conflict {attacker} -> {defender} names an unknown faction"
            )));
        }
        if game.conflict(attacker, defender) != Some(conflict) {
            violations.push(violation(format!(
                "Conflict {attacker} -> {defender} is filed under another pair"
            )));
        }
        let full = map.border(attacker, ownership, Some(defender)).tiles;
        if conflict.contested_border(game.territory()) != full {
            violations.push(violation(format!(
                "Conflict {attacker} -> {defender} would fight over a stale front"
            )));
        }
    }

    violations
}

/// Assert all match invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(game: &Match) {
    let violations = check_invariants(game);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Match invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_game: &Match) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::game::{Color, Conflict, Coord, Map, TileType};

    fn create_valid_game() -> Match {
        let map = Map::from_fn(6, 6, |c| if c.y == 5 { 10 } else { 60 }).unwrap();
        let config = MatchConfig {
            ai_countries: 0,
            ..MatchConfig::default()
        };
        let mut game = Match::from_map(map, &config).unwrap();
        let a = game.new_country("A", true, Color::default()).unwrap();
        let b = game.new_country("B", false, Color::default()).unwrap();
        game.spawn_country(a, Coord::new(1, 1)).unwrap();
        game.spawn_country(b, Coord::new(4, 4)).unwrap();
        game
    }

    #[test]
    fn test_valid_game_passes() {
        let game = create_valid_game();
        assert!(check_invariants(&game).is_empty());
        assert_invariants(&game);
    }

    #[test]
    fn test_generated_match_passes() {
        let config = MatchConfig {
            width: 40,
            height: 30,
            ai_countries: 5,
            ..MatchConfig::default()
        };
        let game = Match::new(&config).unwrap();
        assert!(check_invariants(&game).is_empty());
    }

    #[test]
    fn test_index_drift_detected() {
        let mut game = create_valid_game();
        let index = game.map().index_of(Coord::new(1, 1));
        assert!(game.territory_mut().ownership_mut().remove(1, index));

        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("missing from its ownership set"));
    }

    #[test]
    fn test_stale_index_entry_detected() {
        let mut game = create_valid_game();
        let index = game.map().index_of(Coord::new(0, 0));
        game.territory_mut().ownership_mut().insert(2, index);

        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("belongs to 1"));
    }

    #[test]
    fn test_bad_mobilization_detected() {
        let mut game = create_valid_game();
        game.countries_mut()[1].set_target_mobilization(0);

        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("mobilizes 0%"));
    }

    #[test]
    fn test_armed_neutral_detected() {
        let mut game = create_valid_game();
        game.countries_mut()[0].set_troops_for_test(5);

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("Neutral has 5 troops")));
    }

    #[test]
    fn test_misfiled_conflict_detected() {
        let mut game = create_valid_game();
        game.conflicts_mut().insert((1, 2), Conflict::new(2, 1, 10));
        game.conflicts_mut().insert((0, 1), Conflict::new(0, 1, 10));

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("filed under another pair")));
        assert!(violations.iter().any(|v| v.message.contains("0 -> 1 cannot exist")));
    }

    #[test]
    fn test_owned_water_detected() {
        let mut game = create_valid_game();
        let coord = Coord::new(0, 5);
        assert_eq!(game.map().tile(coord).tile_type, TileType::Water);
        game.territory_mut().assign(coord, 1).unwrap();

        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("Water tile (0, 5)"));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "Match invariant violations")]
    fn test_assert_invariants_panics() {
        let mut game = create_valid_game();
        game.countries_mut()[2].set_target_mobilization(101);
        assert_invariants(&game);
    }
}
