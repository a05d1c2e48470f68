//! Match state and the tick loop.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::config::MatchConfig;
use crate::error::{ConfigError, MatchError, MatchResult};
use crate::game::{
    AiBehavior, AttackOutcome, Color, Conflict, Coord, Country, FactionId, FactionKind, Map,
    NEUTRAL, OwnershipIndex, Territory, economy_score,
};
use crate::rng::RandomGenerator;

/// Attempts at finding free land for each bootstrapped AI faction.
const SPAWN_ATTEMPTS: u32 = 256;

/// Coarse phase of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum GameState {
    /// Waiting for starting claims; ticks do nothing.
    SelectingStartingPoint,
    /// Running.
    InGame,
    /// Finished. Nothing currently drives a match here.
    GameOver,
}

/// How often each update pass runs, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TickIntervals {
    /// Conflict advances.
    pub attack_ms: u64,
    /// Demographics and economy.
    pub population_ms: u64,
    /// AI decisions.
    pub ai_ms: u64,
}

impl Default for TickIntervals {
    fn default() -> Self {
        Self {
            attack_ms: 50,
            population_ms: 10_000,
            ai_ms: 500,
        }
    }
}

/// Whether a pass last run at `last` is due again at `now_ms`.
fn is_due(last: Option<u64>, interval_ms: u64, now_ms: u64) -> bool {
    last.is_none_or(|last| now_ms.saturating_sub(last) >= interval_ms)
}

/// A single match: the map, its factions and their conflicts.
///
/// `Match` is the only owner of simulation state. Readers borrow it between
/// ticks; every change goes through a command method or [`Match::tick_at`].
#[derive(Debug, Clone)]
pub struct Match {
    territory: Territory,
    countries: Vec<Country>,
    conflicts: BTreeMap<(FactionId, FactionId), Conflict>,
    alliances: BTreeMap<FactionId, BTreeSet<FactionId>>,
    state: GameState,
    intervals: TickIntervals,
    spawn_radius: u16,
    last_attack_ms: Option<u64>,
    last_population_ms: Option<u64>,
    last_ai_ms: Option<u64>,
    rng: RandomGenerator,
    created: Instant,
}

impl Match {
    /// Generate terrain from the config's seed and create a match on it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails validation.
    pub fn new(config: &MatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (width, height) = config.dimensions()?;
        let map = Map::new(width, height, config.terrain_seed())
            .ok_or_else(|| ConfigError::Invalid("map has no tiles".to_string()))?;
        Self::from_map(map, config)
    }

    /// Create a match on an existing map.
    ///
    /// Only Neutral and the config's AI factions exist afterwards. Each AI
    /// faction is placed on a random unclaimed land tile; a faction that
    /// finds none within a bounded number of tries starts with no land.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails validation.
    pub fn from_map(map: Map, config: &MatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut territory = Territory::new(map);
        territory.register(NEUTRAL);

        let mut game = Self {
            territory,
            countries: vec![Country::neutral()],
            conflicts: BTreeMap::new(),
            alliances: BTreeMap::new(),
            state: GameState::SelectingStartingPoint,
            intervals: config.intervals,
            spawn_radius: config.spawn_radius,
            last_attack_ms: None,
            last_population_ms: None,
            last_ai_ms: None,
            rng: RandomGenerator::new(config.seed),
            created: Instant::now(),
        };
        game.spawn_ai_countries(config.ai_countries)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(game)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn spawn_ai_countries(&mut self, count: usize) -> MatchResult<()> {
        for n in 0..count {
            let color = Color::rgb(
                self.rng.randint(0, 255) as u8,
                self.rng.randint(0, 255) as u8,
                self.rng.randint(0, 255) as u8,
            );
            let id = self.new_country(format!("Bot {n}"), false, color)?;

            let width = i64::from(self.width()) - 1;
            let height = i64::from(self.height()) - 1;
            for _ in 0..SPAWN_ATTEMPTS {
                let pos = Coord::new(
                    self.rng.randint(0, width) as u16,
                    self.rng.randint(0, height) as u16,
                );
                let tile = self.territory.map().tile(pos);
                if tile.owner == NEUTRAL && tile.tile_type.is_land() {
                    self.spawn_country(id, pos)?;
                    break;
                }
            }
        }
        Ok(())
    }

    // ==================== Queries ====================

    /// The map.
    #[must_use]
    pub const fn map(&self) -> &Map {
        self.territory.map()
    }

    /// Faction → owned tiles.
    #[must_use]
    pub const fn ownership(&self) -> &OwnershipIndex {
        self.territory.ownership()
    }

    /// The map with its ownership index and revisions.
    #[must_use]
    pub const fn territory(&self) -> &Territory {
        &self.territory
    }

    /// Map width in tiles.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.territory.map().width()
    }

    /// Map height in tiles.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.territory.map().height()
    }

    /// Every faction, indexed by id. Entry 0 is Neutral.
    #[must_use]
    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    /// A single faction.
    #[must_use]
    pub fn country(&self, id: FactionId) -> Option<&Country> {
        self.countries.get(usize::from(id))
    }

    /// Current phase.
    #[must_use]
    pub const fn game_state(&self) -> GameState {
        self.state
    }

    /// Update intervals.
    #[must_use]
    pub const fn intervals(&self) -> TickIntervals {
        self.intervals
    }

    /// Ongoing conflicts, ordered by (attacker, defender).
    pub fn conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.values()
    }

    /// The conflict between an ordered pair, if one is active.
    #[must_use]
    pub fn conflict(&self, attacker: FactionId, defender: FactionId) -> Option<&Conflict> {
        self.conflicts.get(&(attacker, defender))
    }

    /// Whether two factions are allied.
    #[must_use]
    pub fn are_allied(&self, a: FactionId, b: FactionId) -> bool {
        self.alliances.get(&a).is_some_and(|allies| allies.contains(&b))
    }

    /// The match's random generator.
    #[must_use]
    pub const fn rng(&self) -> &RandomGenerator {
        &self.rng
    }

    fn check_faction(&self, id: FactionId) -> MatchResult<()> {
        if usize::from(id) < self.countries.len() {
            Ok(())
        } else {
            Err(MatchError::UnknownFaction(id))
        }
    }

    fn check_coord(&self, coord: Coord) -> MatchResult<()> {
        if self.map().in_bounds(coord) {
            Ok(())
        } else {
            Err(MatchError::OutOfBounds(coord))
        }
    }

    // ==================== Commands ====================

    /// Add a faction and return its id.
    ///
    /// Non-human factions get a random AI personality from the match's
    /// generator.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::TooManyFactions`] once every id is taken.
    pub fn new_country(&mut self, name: impl Into<String>, is_human: bool, color: Color) -> MatchResult<FactionId> {
        let id = FactionId::try_from(self.countries.len())
            .map_err(|_| MatchError::TooManyFactions(self.countries.len()))?;
        let kind = if is_human {
            FactionKind::Human
        } else {
            FactionKind::Ai(AiBehavior::random(&mut self.rng))
        };
        let country = Country::new(id, name, kind, color);
        log::info!("new faction {id} ({}), {:?}", country.name(), country.kind());
        self.countries.push(country);
        self.territory.register(id);
        Ok(id)
    }

    /// Claim the unclaimed land around `center` for `faction`.
    ///
    /// The claim is a square of side `2 × spawn_radius + 1`, clipped to the
    /// map. Tiles that are owned or underwater are skipped. Returns the
    /// tiles that changed hands.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown faction or an off-map center.
    pub fn spawn_country(&mut self, faction: FactionId, center: Coord) -> MatchResult<BTreeSet<Coord>> {
        self.check_faction(faction)?;
        self.check_coord(center)?;

        let radius = i32::from(self.spawn_radius);
        let mut claimed = BTreeSet::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let (Ok(x), Ok(y)) = (
                    u16::try_from(i32::from(center.x) + dx),
                    u16::try_from(i32::from(center.y) + dy),
                ) else {
                    continue;
                };
                let pos = Coord::new(x, y);
                let Some(tile) = self.map().get(pos) else {
                    continue;
                };
                if tile.owner != NEUTRAL || !tile.tile_type.is_land() {
                    continue;
                }
                self.territory.assign(pos, faction)?;
                claimed.insert(pos);
            }
        }
        log::info!(
            "faction {faction} spawned at ({}, {}) with {} tiles",
            center.x,
            center.y,
            claimed.len()
        );
        Ok(claimed)
    }

    /// Set a tile's owner, keeping the ownership index in step.
    ///
    /// Returns the previous owner.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown faction, an off-map coordinate, water
    /// given to anyone but Neutral, or ownership-index drift; nothing changes
    /// in any of these cases.
    pub fn set_map_tile(&mut self, coord: Coord, owner: FactionId) -> MatchResult<FactionId> {
        self.check_faction(owner)?;
        self.check_coord(coord)?;
        if owner != NEUTRAL && !self.map().tile(coord).tile_type.is_land() {
            return Err(MatchError::NotLand(coord));
        }
        Ok(self.territory.assign(coord, owner)?)
    }

    /// Send `troops` against `defender`.
    ///
    /// `at` is the tile clicked; without one, any tile on the shared border
    /// is used. Returns `Ok(false)` when the attack is not allowed: Neutral
    /// attacking, allies, no troops, or no adjacency. An attack on a pair
    /// that is already fighting reinforces that conflict.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown faction or an off-map `at`.
    pub fn attack(
        &mut self,
        attacker: FactionId,
        defender: FactionId,
        troops: u64,
        at: Option<Coord>,
    ) -> MatchResult<bool> {
        self.check_faction(attacker)?;
        self.check_faction(defender)?;
        if let Some(pos) = at {
            self.check_coord(pos)?;
        }
        if attacker == NEUTRAL || troops == 0 || self.are_allied(attacker, defender) {
            return Ok(false);
        }

        let target = match at {
            Some(pos) => pos,
            None => {
                let border = self
                    .map()
                    .border(attacker, self.ownership(), Some(defender));
                let Some(pos) = border.tiles.first().copied() else {
                    return Ok(false);
                };
                pos
            }
        };
        if !self.countries[usize::from(attacker)].can_attack(defender, target, self.map()) {
            return Ok(false);
        }

        if let Some(conflict) = self.conflicts.get_mut(&(attacker, defender)) {
            conflict.reinforce(troops);
            log::info!(
                "faction {attacker} reinforces attack on {defender} (+{troops}, now {})",
                conflict.troops_committed()
            );
        } else {
            self.conflicts
                .insert((attacker, defender), Conflict::new(attacker, defender, troops));
            log::info!("faction {attacker} attacks {defender} with {troops} troops");
        }
        Ok(true)
    }

    /// Set a faction's mobilization target in percent.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown faction or a target outside `1..=100`.
    pub fn set_country_target_mobilization_level(&mut self, faction: FactionId, target: u8) -> MatchResult<()> {
        self.check_faction(faction)?;
        if !(1..=100).contains(&target) {
            return Err(MatchError::InvalidMobilization(target));
        }
        self.countries[usize::from(faction)].set_target_mobilization(target);
        Ok(())
    }

    /// Raise a faction's military level, returning the new level.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownFaction`] for an unknown faction.
    pub fn upgrade_country_military(&mut self, faction: FactionId) -> MatchResult<u32> {
        self.check_faction(faction)?;
        Ok(self.countries[usize::from(faction)].upgrade_military_level())
    }

    /// Raise a faction's urbanization level, returning the new level.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownFaction`] for an unknown faction.
    pub fn upgrade_country_urbanization(&mut self, faction: FactionId) -> MatchResult<u32> {
        self.check_faction(faction)?;
        Ok(self.countries[usize::from(faction)].upgrade_urbanization_level())
    }

    /// Ally two factions. Allies never attack each other.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnknownFaction`] for an unknown faction.
    pub fn new_alliance(&mut self, a: FactionId, b: FactionId) -> MatchResult<()> {
        self.check_faction(a)?;
        self.check_faction(b)?;
        self.alliances.entry(a).or_default().insert(b);
        self.alliances.entry(b).or_default().insert(a);
        Ok(())
    }

    /// Leave the starting-point phase. Has no effect once the match runs.
    pub fn set_game_started(&mut self) {
        if self.state == GameState::SelectingStartingPoint {
            self.state = GameState::InGame;
            log::info!("match started with {} factions", self.countries.len());
        }
    }

    #[cfg(test)]
    pub(crate) fn countries_mut(&mut self) -> &mut [Country] {
        &mut self.countries
    }

    #[cfg(test)]
    pub(crate) fn territory_mut(&mut self) -> &mut Territory {
        &mut self.territory
    }

    #[cfg(test)]
    pub(crate) fn conflicts_mut(&mut self) -> &mut BTreeMap<(FactionId, FactionId), Conflict> {
        &mut self.conflicts
    }

    // ==================== Tick ====================

    /// Advance using wall-clock time since the match was created.
    pub fn tick(&mut self) -> BTreeSet<Coord> {
        let now_ms = u64::try_from(self.created.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.tick_at(now_ms)
    }

    /// Advance to simulation time `now_ms`.
    ///
    /// Each pass (attacks, then population, then AI) runs at most once, when
    /// its interval has elapsed since it last ran. Returns the tiles whose
    /// owner changed. Does nothing until the match has started.
    pub fn tick_at(&mut self, now_ms: u64) -> BTreeSet<Coord> {
        let mut changed = BTreeSet::new();
        if self.state != GameState::InGame {
            return changed;
        }

        if is_due(self.last_attack_ms, self.intervals.attack_ms, now_ms) {
            self.last_attack_ms = Some(now_ms);
            changed = self.update_attacks();
        }
        if is_due(self.last_population_ms, self.intervals.population_ms, now_ms) {
            self.last_population_ms = Some(now_ms);
            self.update_populations();
        }
        if is_due(self.last_ai_ms, self.intervals.ai_ms, now_ms) {
            self.last_ai_ms = Some(now_ms);
            self.update_ai_decisions(now_ms);
        }

        changed
    }

    /// Advance every conflict once and drop the ones that stalled.
    fn update_attacks(&mut self) -> BTreeSet<Coord> {
        let mut changed = BTreeSet::new();
        let territory = &mut self.territory;
        let countries = &mut self.countries;

        self.conflicts.retain(|&(attacker, defender), conflict| {
            match conflict.advance(territory, countries) {
                AttackOutcome::Captured(tiles) => {
                    changed.extend(tiles);
                    if conflict.troops_committed() == 0 {
                        log::info!("conflict {attacker} -> {defender} spent its troops");
                        return false;
                    }
                    true
                }
                AttackOutcome::Deferred | AttackOutcome::Exhausted => {
                    log::info!("conflict {attacker} -> {defender} ended");
                    false
                }
            }
        });
        changed
    }

    /// Run one month of demographics for every faction that owns land.
    fn update_populations(&mut self) {
        for country in self.countries.iter_mut().skip(1) {
            let tiles = self.territory.ownership().count(country.id()) as u64;
            if tiles == 0 {
                continue;
            }
            let density = country.pyramid().total_population() / tiles;
            let mobilization = country.target_mobilization();
            let urbanization = country.urbanization_level();

            let mut internals = country.internals();
            let (pyramid, history) = internals.demographics();
            let economy = economy_score(pyramid, mobilization, history);
            pyramid.tick(economy.score, density, urbanization);
            internals.record_economy(economy.score, density);

            country.add_money(economy.money_made);
            country.calculate_troops();
            log::debug!(
                "faction {}: economy {}, density {density}, troops {}",
                country.id(),
                economy.score,
                country.troops()
            );
        }
    }

    /// Let every AI faction whose decision interval elapsed consider an attack.
    fn update_ai_decisions(&mut self, now_ms: u64) {
        let due: Vec<FactionId> = self
            .countries
            .iter()
            .filter(|country| {
                country.ai_behavior().is_some_and(|ai| ai.is_due(now_ms))
                    && self.territory.ownership().count(country.id()) > 0
            })
            .map(Country::id)
            .collect();

        for id in due {
            self.countries[usize::from(id)].internals().mark_ai_decision(now_ms);
            if let Some((target, pos, troops)) = self.choose_ai_target(id) {
                match self.attack(id, target, troops, Some(pos)) {
                    Ok(true) => log::info!("AI faction {id} attacks {target} with {troops} troops"),
                    Ok(false) => {}
                    Err(err) => log::error!("AI faction {id} issued an invalid attack: {err}"),
                }
            }
        }
    }

    /// Weakest non-allied neighbour, if the faction is stronger and the coin agrees.
    fn choose_ai_target(&mut self, id: FactionId) -> Option<(FactionId, Coord, u64)> {
        let border = self.map().border(id, self.ownership(), None);
        let country = &self.countries[usize::from(id)];
        let behavior = country.ai_behavior()?;

        let (target, target_score) = border
            .neighbors
            .iter()
            .filter(|&&neighbor| neighbor != id && !self.are_allied(id, neighbor))
            .map(|&neighbor| (neighbor, self.countries[usize::from(neighbor)].military_score()))
            .min_by_key(|&(_, score)| score)?;

        if target_score >= country.military_score() {
            return None;
        }
        let troops = behavior.committable(country.troops());
        if !self.rng.rand_bool() {
            return None;
        }

        let pos = border
            .tiles
            .iter()
            .copied()
            .find(|pos| self.map().tile(*pos).owner == target)?;
        Some((target, pos, troops))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{TileType, check_invariants};

    fn config() -> MatchConfig {
        MatchConfig {
            ai_countries: 0,
            ..MatchConfig::default()
        }
    }

    fn grass_match(width: u16, height: u16) -> Match {
        Match::from_map(Map::uniform(width, height, TileType::Grass).unwrap(), &config()).unwrap()
    }

    /// Two humans on a 10×10 grass map: A owns `x < 5`, B owns `x >= 5`.
    fn stripes(troops: u64) -> (Match, FactionId, FactionId) {
        let mut game = grass_match(10, 10);
        let a = game.new_country("A", true, Color::rgb(255, 0, 0)).unwrap();
        let b = game.new_country("B", true, Color::rgb(0, 0, 255)).unwrap();
        for (coord, _) in game.map().clone().iter() {
            let owner = if coord.x < 5 { a } else { b };
            game.set_map_tile(coord, owner).unwrap();
        }
        game.countries[usize::from(a)].set_troops_for_test(troops);
        game.countries[usize::from(b)].set_troops_for_test(troops);
        (game, a, b)
    }

    fn ownership_consistent(game: &Match) -> bool {
        game.map().iter().all(|(coord, tile)| {
            game.ownership()
                .contains(tile.owner, game.map().index_of(coord))
        }) && game
            .ownership()
            .iter()
            .map(|(_, tiles)| tiles.len())
            .sum::<usize>()
            == game.map().len()
    }

    #[test]
    fn test_new_match_has_neutral_and_bots() {
        let config = MatchConfig {
            width: 64,
            height: 48,
            ai_countries: 4,
            ..MatchConfig::default()
        };
        let game = Match::new(&config).unwrap();
        assert_eq!(game.countries().len(), 5);
        assert_eq!(game.countries()[0].kind(), &FactionKind::Neutral);
        for (n, bot) in game.countries()[1..].iter().enumerate() {
            assert_eq!(bot.name(), format!("Bot {n}"));
            assert!(bot.ai_behavior().is_some());
        }
        assert_eq!(game.game_state(), GameState::SelectingStartingPoint);
        assert!(ownership_consistent(&game));
    }

    #[test]
    fn test_same_seed_same_match() {
        let config = MatchConfig {
            width: 64,
            height: 48,
            ai_countries: 6,
            seed: 1234,
            ..MatchConfig::default()
        };
        let a = Match::new(&config).unwrap();
        let b = Match::new(&config).unwrap();
        assert_eq!(a.map().tiles(), b.map().tiles());
        for (x, y) in a.countries().iter().zip(b.countries()) {
            assert_eq!(x.color(), y.color());
            assert_eq!(x.ai_behavior(), y.ai_behavior());
        }
    }

    #[test]
    fn test_tick_before_start_is_noop() {
        let (mut game, a, b) = stripes(1_000);
        assert!(game.attack(a, b, 1_000, None).unwrap());
        let before: Vec<_> = game.map().tiles().to_vec();
        let troops = game.country(a).unwrap().troops();

        for now in [0, 50, 10_000, 1_000_000] {
            assert!(game.tick_at(now).is_empty());
        }
        assert_eq!(game.map().tiles(), &before[..]);
        assert_eq!(game.country(a).unwrap().troops(), troops);
        assert_eq!(game.country(a).unwrap().pyramid().months(), 0);
        assert_eq!(game.conflict(a, b).unwrap().troops_committed(), 1_000);
    }

    #[test]
    fn test_set_game_started_only_moves_forward() {
        let mut game = grass_match(4, 4);
        game.set_game_started();
        assert_eq!(game.game_state(), GameState::InGame);
        game.set_game_started();
        assert_eq!(game.game_state(), GameState::InGame);
    }

    #[test]
    fn test_simple_capture_through_tick() {
        let (mut game, a, b) = stripes(1_000);
        assert!(game.attack(a, b, 1_000, None).unwrap());
        game.set_game_started();

        // Intervals: attack 50ms, population 10s. The first tick runs every pass.
        // Populations tick after the attacks, so the capture sees 1_000 troops.
        let changed = game.tick_at(0);
        let column: BTreeSet<_> = (0..10).map(|y| Coord::new(5, y)).collect();
        assert_eq!(changed, column);
        assert_eq!(game.ownership().count(a), 60);
        assert!(game.conflict(a, b).is_none());
        assert!(ownership_consistent(&game));
    }

    #[test]
    fn test_insufficient_troops_conflict_removed_by_orchestrator() {
        let (mut game, a, b) = stripes(1_000);
        assert!(game.attack(a, b, 50, None).unwrap());
        assert_eq!(game.conflict(a, b).unwrap().troops_committed(), 50);
        game.set_game_started();
        assert!(game.tick_at(0).is_empty());
        assert!(game.conflict(a, b).is_none());
    }

    #[test]
    fn test_intervals_gate_passes() {
        let (mut game, a, b) = stripes(1_000_000);
        game.set_game_started();
        game.tick_at(0);
        assert_eq!(game.country(a).unwrap().pyramid().months(), 1);
        // The population pass recomputed troops; restore equal strengths.
        game.countries[usize::from(a)].set_troops_for_test(1_000_000);
        game.countries[usize::from(b)].set_troops_for_test(1_000_000);

        assert!(game.attack(a, b, 1_000, None).unwrap());
        // 49ms later nothing is due.
        assert!(game.tick_at(49).is_empty());
        assert!(game.conflict(a, b).is_some());
        // 50ms after the last attack pass the conflict advances.
        assert!(!game.tick_at(50).is_empty());
        assert_eq!(game.country(a).unwrap().pyramid().months(), 1);

        game.tick_at(10_000);
        assert_eq!(game.country(a).unwrap().pyramid().months(), 2);
    }

    #[test]
    fn test_reinforcement_merges() {
        let (mut game, a, b) = stripes(1_000);
        assert!(game.attack(a, b, 300, None).unwrap());
        assert!(game.attack(a, b, 200, Some(Coord::new(5, 3))).unwrap());
        assert_eq!(game.conflicts().count(), 1);
        assert_eq!(game.conflict(a, b).unwrap().troops_committed(), 500);
    }

    #[test]
    fn test_attack_rejections() {
        let (mut game, a, b) = stripes(1_000);
        let c = game.new_country("C", true, Color::default()).unwrap();

        assert_eq!(game.attack(a, 99, 10, None), Err(MatchError::UnknownFaction(99)));
        assert_eq!(
            game.attack(a, b, 10, Some(Coord::new(10, 0))),
            Err(MatchError::OutOfBounds(Coord::new(10, 0)))
        );
        assert_eq!(game.attack(NEUTRAL, a, 10, None), Ok(false));
        assert_eq!(game.attack(a, b, 0, None), Ok(false));
        assert_eq!(game.attack(a, a, 10, Some(Coord::new(0, 0))), Ok(false));
        // C owns nothing, so A cannot reach it.
        assert_eq!(game.attack(a, c, 10, None), Ok(false));
        // Clicked tile is not B's.
        assert_eq!(game.attack(a, b, 10, Some(Coord::new(0, 0))), Ok(false));

        game.new_alliance(a, b).unwrap();
        assert!(game.are_allied(b, a));
        assert_eq!(game.attack(a, b, 10, None), Ok(false));
        assert_eq!(game.conflicts().count(), 0);
    }

    #[test]
    fn test_spawn_country_claims_free_land() {
        // Column 0 is water.
        let map = Map::from_fn(8, 8, |c| if c.x == 0 { 10 } else { 60 }).unwrap();
        let mut game = Match::from_map(map, &config()).unwrap();
        let a = game.new_country("A", true, Color::default()).unwrap();
        let b = game.new_country("B", true, Color::default()).unwrap();

        let claimed = game.spawn_country(a, Coord::new(1, 1)).unwrap();
        // x in 0..=3 minus water column, y in 0..=3.
        assert_eq!(claimed.len(), 12);
        assert!(claimed.iter().all(|c| c.x >= 1 && c.x <= 3 && c.y <= 3));

        let claimed = game.spawn_country(b, Coord::new(4, 4)).unwrap();
        // 5×5 around (4, 4) minus the 2×2 corner A already holds.
        assert_eq!(claimed.len(), 25 - 4);
        assert!(ownership_consistent(&game));

        assert_eq!(
            game.spawn_country(a, Coord::new(8, 0)),
            Err(MatchError::OutOfBounds(Coord::new(8, 0)))
        );
        assert_eq!(game.spawn_country(7, Coord::new(1, 1)), Err(MatchError::UnknownFaction(7)));
    }

    #[test]
    fn test_mobilization_and_upgrades() {
        let mut game = grass_match(4, 4);
        let a = game.new_country("A", true, Color::default()).unwrap();
        assert_eq!(game.country(a).unwrap().target_mobilization(), 2);

        game.set_country_target_mobilization_level(a, 25).unwrap();
        assert_eq!(game.country(a).unwrap().target_mobilization(), 25);
        assert_eq!(
            game.set_country_target_mobilization_level(a, 0),
            Err(MatchError::InvalidMobilization(0))
        );
        assert_eq!(
            game.set_country_target_mobilization_level(a, 101),
            Err(MatchError::InvalidMobilization(101))
        );

        assert_eq!(game.upgrade_country_military(a), Ok(2));
        assert_eq!(game.upgrade_country_urbanization(a), Ok(2));
        assert_eq!(game.upgrade_country_urbanization(a), Ok(3));
        assert_eq!(game.upgrade_country_military(9), Err(MatchError::UnknownFaction(9)));
    }

    #[test]
    fn test_population_pass_updates_factions_with_land() {
        let mut game = grass_match(8, 8);
        let a = game.new_country("A", true, Color::default()).unwrap();
        let b = game.new_country("B", true, Color::default()).unwrap();
        game.spawn_country(a, Coord::new(2, 2)).unwrap();
        game.set_game_started();
        game.tick_at(0);

        let country = game.country(a).unwrap();
        assert_eq!(country.pyramid().months(), 1);
        assert_eq!(country.economy_history().samples(), 1);
        assert!(country.money() > 0);
        assert_eq!(
            country.troops(),
            country.pyramid().reproductive_population() * 2 / 100
        );
        assert_eq!(
            country.last_density(),
            crate::game::PopulationPyramid::default().total_population() / 25
        );

        // B owns nothing and is skipped.
        assert_eq!(game.country(b).unwrap().pyramid().months(), 0);
        assert_eq!(game.country(NEUTRAL).unwrap().troops(), 0);
    }

    #[test]
    fn test_set_map_tile_validates() {
        let mut game = grass_match(3, 3);
        let a = game.new_country("A", true, Color::default()).unwrap();
        assert_eq!(game.set_map_tile(Coord::new(1, 1), a), Ok(NEUTRAL));
        assert_eq!(game.set_map_tile(Coord::new(1, 1), NEUTRAL), Ok(a));
        assert_eq!(
            game.set_map_tile(Coord::new(3, 1), a),
            Err(MatchError::OutOfBounds(Coord::new(3, 1)))
        );
        assert_eq!(game.set_map_tile(Coord::new(0, 0), 5), Err(MatchError::UnknownFaction(5)));
        assert!(ownership_consistent(&game));
    }

    #[test]
    fn test_set_map_tile_rejects_water() {
        let map = Map::from_fn(3, 1, |c| if c.x == 2 { 10 } else { 60 }).unwrap();
        let mut game = Match::from_map(map, &config()).unwrap();
        let a = game.new_country("A", true, Color::default()).unwrap();
        let sea = Coord::new(2, 0);

        assert_eq!(game.set_map_tile(sea, a), Err(MatchError::NotLand(sea)));
        assert_eq!(game.map().tile(sea).owner, NEUTRAL);
        assert_eq!(game.ownership().count(a), 0);
        assert_eq!(game.set_map_tile(sea, NEUTRAL), Ok(NEUTRAL));
        assert_eq!(game.set_map_tile(Coord::new(1, 0), a), Ok(NEUTRAL));
        assert!(check_invariants(&game).is_empty());
    }

    #[test]
    fn test_outside_change_refreshes_front() {
        let (mut game, a, b) = stripes(10_000);
        assert!(game.attack(a, b, 5_000, None).unwrap());
        game.set_game_started();
        assert_eq!(game.tick_at(0).len(), 10);
        assert!(game.conflict(a, b).is_some());

        // B picks up a tile behind A's lines.
        game.set_map_tile(Coord::new(0, 0), b).unwrap();
        let conflict = game.conflict(a, b).unwrap();
        let full = game.map().border(a, game.ownership(), Some(b)).tiles;
        assert_eq!(full.len(), 11);
        assert_eq!(conflict.contested_border(game.territory()), full);
        assert!(check_invariants(&game).is_empty());
    }

    #[test]
    fn test_emptied_front_conflict_removed_by_orchestrator() {
        let (mut game, a, b) = stripes(10_000);
        assert!(game.attack(a, b, 5_000, None).unwrap());
        game.set_game_started();
        assert_eq!(game.tick_at(0).len(), 10);
        let committed = game.conflict(a, b).unwrap().troops_committed();
        assert!(committed > 0);

        // Release the column in front of A; B's remaining land is out of reach.
        for y in 0..10 {
            game.set_map_tile(Coord::new(6, y), NEUTRAL).unwrap();
        }
        let troops = game.country(a).unwrap().troops();
        let owned = game.ownership().count(a);

        assert!(game.tick_at(50).is_empty());
        assert!(game.conflict(a, b).is_none());
        assert_eq!(game.country(a).unwrap().troops(), troops);
        assert_eq!(game.ownership().count(a), owned);
        assert_eq!(game.ownership().count(b), 30);
        assert!(ownership_consistent(&game));
    }

    #[test]
    fn test_too_many_factions() {
        let mut game = grass_match(2, 2);
        for n in 1..=255 {
            assert_eq!(game.new_country(format!("P{n}"), true, Color::default()), Ok(n));
        }
        assert_eq!(
            game.new_country("overflow", true, Color::default()),
            Err(MatchError::TooManyFactions(256))
        );
    }

    /// A weak AI boxed in by strong humans, with no neutral land in reach.
    fn boxed_ai(seed: u64) -> (Match, FactionId) {
        let config = MatchConfig {
            seed,
            ai_countries: 0,
            ..MatchConfig::default()
        };
        let mut game = Match::from_map(Map::uniform(3, 3, TileType::Grass).unwrap(), &config).unwrap();
        let ai = game.new_country("Bot", false, Color::default()).unwrap();
        let human = game.new_country("Human", true, Color::default()).unwrap();
        for (coord, _) in game.map().clone().iter() {
            let owner = if coord == Coord::new(1, 1) { ai } else { human };
            game.set_map_tile(coord, owner).unwrap();
        }
        game.countries[usize::from(ai)].set_troops_for_test(10);
        game.countries[usize::from(human)].set_troops_for_test(1_000);
        (game, ai)
    }

    #[test]
    fn test_ai_never_attacks_stronger_neighbour() {
        for seed in 0..64 {
            let (mut game, ai) = boxed_ai(seed);
            assert!(game.choose_ai_target(ai).is_none(), "seed {seed}");
            game.update_ai_decisions(0);
            assert_eq!(game.conflicts().count(), 0, "seed {seed}");
            assert_eq!(game.ownership().count(ai), 1);
        }
    }

    #[test]
    fn test_ai_attacks_weaker_neighbour_when_coin_allows() {
        let mut attacked = 0;
        for seed in 0..64 {
            let (mut game, ai) = boxed_ai(seed);
            let human = ai + 1;
            game.countries[usize::from(ai)].set_troops_for_test(1_000);
            game.countries[usize::from(human)].set_troops_for_test(10);

            game.update_ai_decisions(0);
            if let Some(conflict) = game.conflict(ai, human) {
                attacked += 1;
                let reserve = game.country(ai).unwrap().ai_behavior().unwrap().reserve_troops;
                assert_eq!(
                    conflict.troops_committed(),
                    AiBehavior {
                        decision_interval_ms: 0,
                        mobilization_target: 0,
                        reserve_troops: reserve,
                        last_decision_ms: None,
                    }
                    .committable(1_000)
                );
            }
            assert_eq!(
                game.country(ai).unwrap().ai_behavior().unwrap().last_decision_ms,
                Some(0)
            );
        }
        // A fair coin over 64 seeds lands heads at least once.
        assert!(attacked > 0);
        assert!(attacked < 64);
    }

    #[test]
    fn test_ai_ignores_allies() {
        let (mut game, ai) = boxed_ai(3);
        let human = ai + 1;
        game.countries[usize::from(ai)].set_troops_for_test(1_000);
        game.countries[usize::from(human)].set_troops_for_test(10);
        game.new_alliance(ai, human).unwrap();
        for now in (0..200_000).step_by(5_000) {
            game.update_ai_decisions(now);
        }
        assert_eq!(game.conflicts().count(), 0);
    }

    #[test]
    fn test_headless_match_keeps_ownership_consistent() {
        let config = MatchConfig {
            width: 48,
            height: 36,
            ai_countries: 6,
            seed: 7,
            ..MatchConfig::default()
        };
        let mut game = Match::new(&config).unwrap();
        game.set_game_started();
        for step in 0..2_000u64 {
            game.tick_at(step * 50);
        }
        assert!(ownership_consistent(&game));
    }
}
