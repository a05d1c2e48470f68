#![no_main]

//! Match command fuzzer.
//!
//! Drives a generated match with an arbitrary stream of commands and clock
//! advances, the way a UI would. Commands may be rejected, but the match
//! must never panic and its invariants must hold after every step.

use arbitrary::Arbitrary;
use frontier::game::{Color, Coord, Match, check_invariants};
use frontier::MatchConfig;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug, Clone)]
enum Command {
    NewCountry { human: bool },
    Spawn { faction: u8, x: u8, y: u8 },
    SetTile { x: u8, y: u8, owner: u8 },
    Attack { attacker: u8, defender: u8, troops: u32, at: Option<(u8, u8)> },
    Mobilize { faction: u8, target: u8 },
    UpgradeMilitary { faction: u8 },
    UpgradeUrbanization { faction: u8 },
    Ally { a: u8, b: u8 },
    Start,
    Advance { ms: u16 },
}

#[derive(Arbitrary, Debug)]
struct MatchInput {
    seed: u64,
    bots: u8,
    commands: Vec<Command>,
}

fuzz_target!(|input: MatchInput| {
    let config = MatchConfig {
        width: 32,
        height: 24,
        seed: input.seed,
        ai_countries: usize::from(input.bots % 6),
        ..MatchConfig::default()
    };
    let Ok(mut game) = Match::new(&config) else {
        return;
    };

    let mut now = 0u64;
    for command in input.commands.into_iter().take(256) {
        match command {
            Command::NewCountry { human } => {
                let _ = game.new_country("Fuzz", human, Color::default());
            }
            Command::Spawn { faction, x, y } => {
                let _ = game.spawn_country(faction, Coord::new(x.into(), y.into()));
            }
            Command::SetTile { x, y, owner } => {
                let _ = game.set_map_tile(Coord::new(x.into(), y.into()), owner);
            }
            Command::Attack { attacker, defender, troops, at } => {
                let at = at.map(|(x, y)| Coord::new(x.into(), y.into()));
                let _ = game.attack(attacker, defender, troops.into(), at);
            }
            Command::Mobilize { faction, target } => {
                let _ = game.set_country_target_mobilization_level(faction, target);
            }
            Command::UpgradeMilitary { faction } => {
                let _ = game.upgrade_country_military(faction);
            }
            Command::UpgradeUrbanization { faction } => {
                let _ = game.upgrade_country_urbanization(faction);
            }
            Command::Ally { a, b } => {
                let _ = game.new_alliance(a, b);
            }
            Command::Start => game.set_game_started(),
            Command::Advance { ms } => {
                now += u64::from(ms);
                game.tick_at(now);
            }
        }

        let violations = check_invariants(&game);
        assert!(violations.is_empty(), "violations: {violations:?}");
    }
});
