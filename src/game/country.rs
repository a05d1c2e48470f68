//! Country (faction) state.

use crate::game::{Coord, EconomyHistory, Map, PopulationPyramid};
use crate::rng::RandomGenerator;

/// Unique identifier for a faction.
pub type FactionId = u8;

/// The unclaimed-land faction. Always present, never fights.
pub const NEUTRAL: FactionId = 0;

/// Mobilization target for human factions before they pick one.
pub const DEFAULT_MOBILIZATION: u8 = 2;

/// Range of AI decision intervals, in milliseconds.
pub const AI_DECISION_INTERVAL_MS: (u64, u64) = (5_000, 20_000);

/// Range of AI mobilization targets, in percent.
pub const AI_MOBILIZATION: (u8, u8) = (5, 20);

/// Range of AI troop reserves, in percent.
pub const AI_RESERVE_TROOPS: (u8, u8) = (30, 60);

/// Display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Personality of a computer-controlled faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiBehavior {
    /// How often the AI considers attacking, in milliseconds.
    pub decision_interval_ms: u64,
    /// Share of fighting-age people the AI mobilizes.
    pub mobilization_target: u8,
    /// Share of troops the AI never commits to an attack.
    pub reserve_troops: u8,
    /// Simulation time of the last decision, if any.
    pub last_decision_ms: Option<u64>,
}

impl AiBehavior {
    /// Draw a random personality.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    pub fn random(rng: &mut RandomGenerator) -> Self {
        let (interval_min, interval_max) = AI_DECISION_INTERVAL_MS;
        let (mob_min, mob_max) = AI_MOBILIZATION;
        let (reserve_min, reserve_max) = AI_RESERVE_TROOPS;

        Self {
            decision_interval_ms: rng.randint(interval_min as i64, interval_max as i64) as u64,
            mobilization_target: rng.randint(i64::from(mob_min), i64::from(mob_max)) as u8,
            reserve_troops: rng.randint(i64::from(reserve_min), i64::from(reserve_max)) as u8,
            last_decision_ms: None,
        }
    }

    /// Whether a decision is due at `now_ms`.
    #[must_use]
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.last_decision_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.decision_interval_ms)
    }

    /// Troops the AI is willing to commit out of `troops`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn committable(&self, troops: u64) -> u64 {
        (troops as f64 * (1.0 - f64::from(self.reserve_troops) / 100.0)) as u64
    }
}

/// Who controls a faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactionKind {
    /// Faction 0: unclaimed land.
    Neutral,
    /// Driven by commands from a player.
    Human,
    /// Driven by the AI decision pass.
    Ai(AiBehavior),
}

/// State for a single faction.
#[derive(Debug, Clone)]
pub struct Country {
    id: FactionId,
    name: String,
    kind: FactionKind,
    color: Color,
    troops: u64,
    target_mobilization: u8,
    urbanization_level: u32,
    military_level: u32,
    money: u64,
    last_economy: u32,
    last_density: u64,
    pyramid: PopulationPyramid,
    economy_history: EconomyHistory,
}

impl Country {
    /// The Neutral faction: no people, no troops, no AI.
    #[must_use]
    pub fn neutral() -> Self {
        let mut country = Self::new(NEUTRAL, "Neutral", FactionKind::Neutral, Color::default());
        country.pyramid = PopulationPyramid::empty();
        country
    }

    /// Create a faction with a fresh population.
    ///
    /// AI factions adopt their personality's mobilization target.
    #[must_use]
    pub fn new(id: FactionId, name: impl Into<String>, kind: FactionKind, color: Color) -> Self {
        let target_mobilization = match kind {
            FactionKind::Ai(behavior) => behavior.mobilization_target,
            FactionKind::Human | FactionKind::Neutral => DEFAULT_MOBILIZATION,
        };

        Self {
            id,
            name: name.into(),
            kind,
            color,
            troops: 0,
            target_mobilization,
            urbanization_level: 1,
            military_level: 1,
            money: 0,
            last_economy: 0,
            last_density: 0,
            pyramid: PopulationPyramid::default(),
            economy_history: EconomyHistory::default(),
        }
    }

    /// Faction id.
    #[must_use]
    pub const fn id(&self) -> FactionId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Controller of this faction.
    #[must_use]
    pub const fn kind(&self) -> &FactionKind {
        &self.kind
    }

    /// True for player-controlled factions.
    #[must_use]
    pub const fn is_human(&self) -> bool {
        matches!(self.kind, FactionKind::Human)
    }

    /// AI personality, for computer-controlled factions.
    #[must_use]
    pub const fn ai_behavior(&self) -> Option<&AiBehavior> {
        match &self.kind {
            FactionKind::Ai(behavior) => Some(behavior),
            FactionKind::Human | FactionKind::Neutral => None,
        }
    }

    /// Display color.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Troops available.
    #[must_use]
    pub const fn troops(&self) -> u64 {
        self.troops
    }

    /// Mobilization target, in percent of the fighting-age population.
    #[must_use]
    pub const fn target_mobilization(&self) -> u8 {
        self.target_mobilization
    }

    /// Urbanization level (≥ 1).
    #[must_use]
    pub const fn urbanization_level(&self) -> u32 {
        self.urbanization_level
    }

    /// Military level (≥ 1).
    #[must_use]
    pub const fn military_level(&self) -> u32 {
        self.military_level
    }

    /// Treasury.
    #[must_use]
    pub const fn money(&self) -> u64 {
        self.money
    }

    /// Economy score from the last population pass.
    #[must_use]
    pub const fn last_economy(&self) -> u32 {
        self.last_economy
    }

    /// Population per owned tile at the last population pass.
    #[must_use]
    pub const fn last_density(&self) -> u64 {
        self.last_density
    }

    /// Population model.
    #[must_use]
    pub const fn pyramid(&self) -> &PopulationPyramid {
        &self.pyramid
    }

    /// Running income history.
    #[must_use]
    pub const fn economy_history(&self) -> &EconomyHistory {
        &self.economy_history
    }

    /// Strength used by the AI to compare factions: `troops × military_level`.
    #[must_use]
    pub fn military_score(&self) -> u64 {
        self.troops.saturating_mul(u64::from(self.military_level))
    }

    /// Whether this faction may open an attack on `target` at `pos`.
    ///
    /// The tile must be land owned by `target`, and some tile of `target`
    /// must touch this faction's territory. The adjacency check scans the
    /// whole map.
    #[must_use]
    pub fn can_attack(&self, target: FactionId, pos: Coord, map: &Map) -> bool {
        let Some(tile) = map.get(pos) else {
            return false;
        };
        if target == self.id || !tile.tile_type.is_land() {
            return false;
        }
        if tile.owner != target {
            log::error!(
                "attack target {target} does not own ({}, {}); owner is {}",
                pos.x,
                pos.y,
                tile.owner
            );
            return false;
        }

        map.tiles_owned_by(target)
            .filter(|(_, tile)| tile.tile_type.is_land())
            .any(|(coord, _)| {
                let (adjacent, count) = coord.adjacent(map.width(), map.height());
                adjacent[..count as usize]
                    .iter()
                    .any(|adj| map.tile(*adj).owner == self.id)
            })
    }

    /// Recompute troops from the pyramid and the mobilization target.
    pub fn calculate_troops(&mut self) {
        self.troops =
            self.pyramid.reproductive_population() * u64::from(self.target_mobilization) / 100;
    }

    /// Set the mobilization target. Callers validate the range.
    pub(crate) fn set_target_mobilization(&mut self, target: u8) {
        self.target_mobilization = target;
    }

    /// Raise the military level by one, returning the new level.
    pub(crate) fn upgrade_military_level(&mut self) -> u32 {
        self.military_level = self.military_level.saturating_add(1);
        self.military_level
    }

    /// Raise the urbanization level by one, returning the new level.
    pub(crate) fn upgrade_urbanization_level(&mut self) -> u32 {
        self.urbanization_level = self.urbanization_level.saturating_add(1);
        self.urbanization_level
    }

    /// Add (or, when negative, take) money; the treasury stops at zero.
    pub(crate) fn add_money(&mut self, amount: i64) {
        self.money = self.money.saturating_add_signed(amount);
    }

    /// Spend money. Refuses, leaving the treasury untouched, if it would overdraw.
    pub fn remove_money(&mut self, amount: u64) -> bool {
        match self.money.checked_sub(amount) {
            Some(rest) => {
                self.money = rest;
                true
            }
            None => {
                log::error!("faction {} tried to spend {amount} with {}", self.id, self.money);
                false
            }
        }
    }

    /// Privileged access for the orchestrator and conflict resolution.
    pub(crate) fn internals(&mut self) -> CountryInternals<'_> {
        CountryInternals { country: self }
    }

    #[cfg(test)]
    pub(crate) fn set_troops_for_test(&mut self, troops: u64) {
        self.troops = troops;
    }
}

/// Mutable access to the parts of a [`Country`] only the simulation may touch.
#[derive(Debug)]
pub(crate) struct CountryInternals<'a> {
    country: &'a mut Country,
}

impl CountryInternals<'_> {
    /// Spend troops in combat.
    pub(crate) fn spend_troops(&mut self, troops: u64) {
        self.country.troops = self.country.troops.saturating_sub(troops);
    }

    /// Combat losses come out of the population as well.
    pub(crate) fn remove_casualties(&mut self, casualties: u64) {
        self.country.pyramid.remove_casualties(casualties);
    }

    /// The population model together with its income history.
    pub(crate) fn demographics(&mut self) -> (&mut PopulationPyramid, &mut EconomyHistory) {
        (&mut self.country.pyramid, &mut self.country.economy_history)
    }

    /// Record the inputs of the last population pass.
    pub(crate) fn record_economy(&mut self, score: u32, density: u64) {
        self.country.last_economy = score;
        self.country.last_density = density;
    }

    /// Stamp the AI's last decision time.
    pub(crate) fn mark_ai_decision(&mut self, now_ms: u64) {
        if let FactionKind::Ai(behavior) = &mut self.country.kind {
            behavior.last_decision_ms = Some(now_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Territory, TileType};

    fn human(id: FactionId) -> Country {
        Country::new(id, format!("Player {id}"), FactionKind::Human, Color::rgb(1, 2, 3))
    }

    #[test]
    fn test_neutral_faction() {
        let neutral = Country::neutral();
        assert_eq!(neutral.id(), NEUTRAL);
        assert_eq!(neutral.kind(), &FactionKind::Neutral);
        assert_eq!(neutral.troops(), 0);
        assert!(neutral.ai_behavior().is_none());
        assert_eq!(neutral.pyramid().total_population(), 0);
    }

    #[test]
    fn test_ai_behavior_ranges() {
        let mut rng = RandomGenerator::new(99);
        for _ in 0..200 {
            let behavior = AiBehavior::random(&mut rng);
            assert!((5_000..=20_000).contains(&behavior.decision_interval_ms));
            assert!((5..=20).contains(&behavior.mobilization_target));
            assert!((30..=60).contains(&behavior.reserve_troops));
            assert!(behavior.last_decision_ms.is_none());
        }
    }

    #[test]
    fn test_ai_adopts_behavior_mobilization() {
        let mut rng = RandomGenerator::new(4);
        let behavior = AiBehavior::random(&mut rng);
        let country = Country::new(3, "Bot", FactionKind::Ai(behavior), Color::default());
        assert_eq!(country.target_mobilization(), behavior.mobilization_target);
        assert!(!country.is_human());
        assert_eq!(country.ai_behavior(), Some(&behavior));
    }

    #[test]
    fn test_ai_is_due() {
        let behavior = AiBehavior {
            decision_interval_ms: 5_000,
            mobilization_target: 10,
            reserve_troops: 40,
            last_decision_ms: Some(1_000),
        };
        assert!(!behavior.is_due(5_999));
        assert!(behavior.is_due(6_000));
        assert_eq!(behavior.committable(1_000), 600);
    }

    #[test]
    fn test_calculate_troops() {
        let mut country = human(1);
        country.set_target_mobilization(10);
        country.calculate_troops();
        assert_eq!(country.troops(), country.pyramid().reproductive_population() / 10);
    }

    #[test]
    fn test_military_score() {
        let mut country = human(1);
        country.set_troops_for_test(300);
        assert_eq!(country.military_score(), 300);
        assert_eq!(country.upgrade_military_level(), 2);
        assert_eq!(country.military_score(), 600);
    }

    #[test]
    fn test_money() {
        let mut country = human(1);
        country.add_money(100);
        country.add_money(-30);
        assert_eq!(country.money(), 70);
        country.add_money(-500);
        assert_eq!(country.money(), 0);

        country.add_money(50);
        assert!(!country.remove_money(51));
        assert_eq!(country.money(), 50);
        assert!(country.remove_money(50));
        assert_eq!(country.money(), 0);
    }

    #[test]
    fn test_internals_spend_troops_saturates() {
        let mut country = human(1);
        country.set_troops_for_test(100);
        country.internals().spend_troops(40);
        assert_eq!(country.troops(), 60);
        country.internals().spend_troops(1_000);
        assert_eq!(country.troops(), 0);
    }

    fn two_faction_map() -> Map {
        // 1 owns x == 0, 2 owns x == 1, x == 3 is water owned by nobody, 4 owns x == 4.
        let map = Map::from_fn(5, 3, |c| if c.x == 3 { 20 } else { 60 }).unwrap();
        let mut territory = Territory::new(map);
        for y in 0..3 {
            territory.assign(Coord::new(0, y), 1).unwrap();
            territory.assign(Coord::new(1, y), 2).unwrap();
            territory.assign(Coord::new(4, y), 4).unwrap();
        }
        territory.map().clone()
    }

    #[test]
    fn test_can_attack_adjacent() {
        let map = two_faction_map();
        assert!(human(1).can_attack(2, Coord::new(1, 1), &map));
        assert!(human(2).can_attack(1, Coord::new(0, 0), &map));
        assert!(human(2).can_attack(NEUTRAL, Coord::new(2, 0), &map));
    }

    #[test]
    fn test_cannot_attack_self_water_or_distant() {
        let map = two_faction_map();
        assert!(!human(1).can_attack(1, Coord::new(0, 0), &map));
        assert!(!human(2).can_attack(NEUTRAL, Coord::new(3, 0), &map));
        assert!(!human(1).can_attack(4, Coord::new(4, 0), &map));
        assert!(!human(1).can_attack(2, Coord::new(9, 9), &map));
    }

    #[test]
    fn test_can_attack_owner_mismatch_fails_safe() {
        let map = two_faction_map();
        assert!(!human(1).can_attack(2, Coord::new(4, 0), &map));
    }

    #[test]
    fn test_uniform_map_helper() {
        let map = Map::uniform(2, 1, TileType::Hill).unwrap();
        assert!(!human(1).can_attack(NEUTRAL, Coord::new(0, 0), &map));
    }
}
