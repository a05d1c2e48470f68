//! Conflict resolution between an attacker and a defender.
//!
//! Each combat tick a [`Conflict`] prices one tile of the defender's land at
//!
//! ```text
//! cost = 100 + 100 × (defending / attacking − 1)
//! ```
//!
//! where both sides' strength is `troops × 2^military_level` (a Neutral
//! defender is a flat 100). If the committed troops pay for the whole
//! contested border, every border tile flips at once; otherwise nothing
//! happens this tick.
//!
//! The first advance scans the attacker's whole territory. After that, the
//! tiles just captured become a cached front and only their neighbours are
//! examined. The front is tied to both factions' ownership revisions; any
//! change to either side's land outside this conflict discards it and the
//! next advance rescans.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use std::collections::BTreeSet;

use crate::game::{Coord, Country, FactionId, Map, NEUTRAL, Territory};

/// Cost of one tile when both sides are equally strong.
pub const BASE_TILE_COST: f64 = 100.0;

/// Defending strength assumed for unclaimed land.
pub const NEUTRAL_DEFENCE: f64 = 100.0;

/// Result of one [`Conflict::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackOutcome {
    /// These tiles changed hands.
    Captured(BTreeSet<Coord>),
    /// Not enough troops for the current border; nothing was spent.
    Deferred,
    /// No contested border was found.
    Exhausted,
}

impl AttackOutcome {
    /// Tiles that changed owner, if any.
    #[must_use]
    pub fn captured(&self) -> Option<&BTreeSet<Coord>> {
        match self {
            AttackOutcome::Captured(tiles) => Some(tiles),
            AttackOutcome::Deferred | AttackOutcome::Exhausted => None,
        }
    }
}

/// Strength of a faction in combat: `troops × 2^military_level`.
#[must_use]
pub fn combat_strength(country: &Country) -> f64 {
    country.troops() as f64 * f64::from(country.military_level()).exp2()
}

/// Troops spent per captured tile.
///
/// Not finite when the attacker has no strength at all.
#[must_use]
pub fn tile_cost(defending: f64, attacking: f64) -> f64 {
    BASE_TILE_COST + (defending / attacking - 1.0) * BASE_TILE_COST
}

/// Defender land next to the previously captured front.
///
/// Only the neighbours of `front` are examined. When `front` is everything the
/// attacker took from a complete border and neither side's land has changed
/// since, this equals a full [`Map::border`] scan.
#[must_use]
pub fn expand_front(map: &Map, front: &BTreeSet<Coord>, defender: FactionId) -> BTreeSet<Coord> {
    let mut border = BTreeSet::new();
    for coord in front {
        let (adjacent, count) = coord.adjacent(map.width(), map.height());
        for adj in &adjacent[..count as usize] {
            let tile = map.tile(*adj);
            if tile.owner == defender && tile.tile_type.is_land() {
                border.insert(*adj);
            }
        }
    }
    border
}

/// An ongoing attack of one faction on another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    attacker: FactionId,
    defender: FactionId,
    troops_committed: u64,
    cached_border: BTreeSet<Coord>,
    /// Attacker and defender revisions right after the front was cached.
    front_revisions: (u64, u64),
}

impl Conflict {
    /// Open a conflict with no cached front.
    #[must_use]
    pub fn new(attacker: FactionId, defender: FactionId, troops: u64) -> Self {
        Self {
            attacker,
            defender,
            troops_committed: troops,
            cached_border: BTreeSet::new(),
            front_revisions: (0, 0),
        }
    }

    /// Attacking faction.
    #[must_use]
    pub const fn attacker(&self) -> FactionId {
        self.attacker
    }

    /// Defending faction.
    #[must_use]
    pub const fn defender(&self) -> FactionId {
        self.defender
    }

    /// Troops still available to this conflict.
    #[must_use]
    pub const fn troops_committed(&self) -> u64 {
        self.troops_committed
    }

    /// Tiles captured by the last successful advance.
    #[must_use]
    pub const fn cached_border(&self) -> &BTreeSet<Coord> {
        &self.cached_border
    }

    /// Add troops to this conflict.
    pub fn reinforce(&mut self, troops: u64) {
        self.troops_committed = self.troops_committed.saturating_add(troops);
    }

    /// Whether the cached front still describes the current map.
    #[must_use]
    pub fn front_is_current(&self, territory: &Territory) -> bool {
        !self.cached_border.is_empty() && self.front_revisions == self.revisions(territory)
    }

    /// The border this conflict would fight over next.
    #[must_use]
    pub fn contested_border(&self, territory: &Territory) -> BTreeSet<Coord> {
        if self.front_is_current(territory) {
            return expand_front(territory.map(), &self.cached_border, self.defender);
        }
        if !self.cached_border.is_empty() {
            log::debug!(
                "conflict {} -> {}: land changed outside the conflict, rescanning",
                self.attacker,
                self.defender
            );
        }
        territory
            .map()
            .border(self.attacker, territory.ownership(), Some(self.defender))
            .tiles
    }

    fn revisions(&self, territory: &Territory) -> (u64, u64) {
        (territory.revision(self.attacker), territory.revision(self.defender))
    }

    fn missing_faction(&self, faction: FactionId) -> AttackOutcome {
        log::error!(
            "conflict {} -> {}: faction {faction} is not in the faction table",
            self.attacker,
            self.defender
        );
        AttackOutcome::Exhausted
    }

    /// Run one combat tick.
    ///
    /// `countries` is the faction table indexed by id. A conflict naming a
    /// faction the table does not hold is reported as exhausted.
    pub fn advance(&mut self, territory: &mut Territory, countries: &mut [Country]) -> AttackOutcome {
        let defending = if self.defender == NEUTRAL {
            NEUTRAL_DEFENCE
        } else {
            match countries.get(usize::from(self.defender)) {
                Some(defender) => combat_strength(defender),
                None => return self.missing_faction(self.defender),
            }
        };
        let Some(attacker) = countries.get_mut(usize::from(self.attacker)) else {
            return self.missing_faction(self.attacker);
        };
        let attacking = combat_strength(attacker);

        let cost = tile_cost(defending, attacking);
        let capturable = (self.troops_committed as f64 / cost) as u64;
        log::debug!(
            "conflict {} -> {}: cost per tile {cost:.2}, committed {}, capturable {capturable}",
            self.attacker,
            self.defender,
            self.troops_committed
        );

        let border = self.contested_border(territory);
        if border.is_empty() {
            if !self.cached_border.is_empty() {
                log::warn!(
                    "conflict {} -> {}: cached front has no contested tiles left",
                    self.attacker,
                    self.defender
                );
            }
            return AttackOutcome::Exhausted;
        }

        let needed = (border.len() as f64 * cost).ceil();
        if attacking <= 0.0
            || border.len() as u64 > capturable
            || needed > attacker.troops() as f64
            || needed > self.troops_committed as f64
        {
            log::debug!(
                "conflict {} -> {}: not enough troops for {} tiles",
                self.attacker,
                self.defender,
                border.len()
            );
            return AttackOutcome::Deferred;
        }

        let contested = border.len();
        let mut captured = BTreeSet::new();
        for coord in border {
            if territory.assign(coord, self.attacker).is_err() {
                break;
            }
            captured.insert(coord);
        }

        let spent = (captured.len() as f64 * cost).ceil() as u64;
        let mut internals = attacker.internals();
        internals.spend_troops(spent);
        internals.remove_casualties(spent);
        self.troops_committed = self.troops_committed.saturating_sub(spent);

        if captured.is_empty() {
            self.cached_border.clear();
            return AttackOutcome::Exhausted;
        }
        if captured.len() == contested {
            self.cached_border.clone_from(&captured);
            self.front_revisions = self.revisions(territory);
        } else {
            // Drift cut the capture short; the front is incomplete.
            self.cached_border.clear();
        }
        AttackOutcome::Captured(captured)
    }
}
