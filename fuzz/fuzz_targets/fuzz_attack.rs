#![no_main]

//! Conflict resolution fuzzer.
//!
//! Builds a small map from fuzzer bytes, splits it between two factions,
//! opens an attack and advances only the attack pass. Checks that:
//! 1. Ownership stays consistent after every tick
//! 2. Attacks never capture water or give tiles to Neutral
//! 3. The attacker's troops never grow while only conflicts run

use arbitrary::Arbitrary;
use frontier::game::{Color, Coord, Map, Match, NEUTRAL, TickIntervals, check_invariants};
use frontier::MatchConfig;
use libfuzzer_sys::fuzz_target;

const SIDE: u16 = 12;

#[derive(Arbitrary, Debug)]
struct AttackInput {
    /// Elevation per tile, wrapped into 0..=100.
    elevations: [u8; (SIDE as usize) * (SIDE as usize)],
    /// Owner per tile: 0 Neutral, 1 attacker, 2 defender.
    owners: [u8; (SIDE as usize) * (SIDE as usize)],
    /// Military upgrades for each side.
    upgrades: [u8; 2],
    /// Mobilization target for each side.
    mobilization: [u8; 2],
    /// Troops committed per attack order.
    orders: Vec<u16>,
    /// Attack the Neutral faction instead of the defender.
    against_neutral: bool,
}

fuzz_target!(|input: AttackInput| {
    let Some(map) = Map::from_fn(SIDE, SIDE, |c| {
        input.elevations[usize::from(c.y * SIDE + c.x)] % 101
    }) else {
        return;
    };
    let config = MatchConfig {
        ai_countries: 0,
        intervals: TickIntervals {
            attack_ms: 1,
            population_ms: u64::MAX,
            ai_ms: u64::MAX,
        },
        ..MatchConfig::default()
    };
    let Ok(mut game) = Match::from_map(map, &config) else {
        return;
    };
    let attacker = game.new_country("A", true, Color::default()).unwrap();
    let defender = game.new_country("B", true, Color::default()).unwrap();

    for y in 0..SIDE {
        for x in 0..SIDE {
            let pos = Coord::new(x, y);
            let owner = match input.owners[usize::from(y * SIDE + x)] % 3 {
                1 => attacker,
                2 => defender,
                _ => NEUTRAL,
            };
            if game.map().tile(pos).tile_type.is_land() {
                game.set_map_tile(pos, owner).unwrap();
            }
        }
    }
    for (faction, (&upgrades, &mobilization)) in [attacker, defender]
        .into_iter()
        .zip(input.upgrades.iter().zip(&input.mobilization))
    {
        for _ in 0..upgrades % 4 {
            game.upgrade_country_military(faction).unwrap();
        }
        let _ = game.set_country_target_mobilization_level(faction, mobilization);
    }

    // The first tick runs every pass once, which sets troops.
    game.set_game_started();
    game.tick_at(0);

    let target = if input.against_neutral { NEUTRAL } else { defender };
    for (now, &troops) in (1u64..).zip(input.orders.iter().take(64)) {
        let _ = game.attack(attacker, target, u64::from(troops), None);

        let before = game.country(attacker).unwrap().troops();
        let changed = game.tick_at(now);
        let after = game.country(attacker).unwrap().troops();
        assert!(after <= before, "troops grew from {before} to {after}");

        for pos in &changed {
            let tile = game.map().tile(*pos);
            assert!(tile.tile_type.is_land());
            assert_eq!(tile.owner, attacker);
        }

        let violations = check_invariants(&game);
        assert!(violations.is_empty(), "violations: {violations:?}");
    }
});
