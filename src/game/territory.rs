//! Tile ownership: the map plus its inverse index.
//!
//! [`OwnershipIndex`] maps each faction to the tiles it owns. It is exactly the
//! inverse of `Tile::owner`, including Neutral, which starts out owning every
//! tile. [`Territory::assign`] is the only code path that changes an owner and
//! updates both sides together. Every change also bumps a per-faction
//! revision, so derived data such as a cached attack front can tell whether
//! the tiles it was computed from are still current.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::TerritoryError;
use crate::game::{Coord, FactionId, Map, NEUTRAL, TileIndex};

/// Inverse of the map's owner field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipIndex {
    owned: BTreeMap<FactionId, BTreeSet<TileIndex>>,
}

impl OwnershipIndex {
    /// Iterate the tiles a faction owns, in index order.
    pub fn tiles_of(&self, faction: FactionId) -> impl Iterator<Item = TileIndex> + '_ {
        self.owned.get(&faction).into_iter().flatten().copied()
    }

    /// Number of tiles a faction owns.
    #[must_use]
    pub fn count(&self, faction: FactionId) -> usize {
        self.owned.get(&faction).map_or(0, BTreeSet::len)
    }

    /// Whether the index lists `index` under `faction`.
    #[must_use]
    pub fn contains(&self, faction: FactionId, index: TileIndex) -> bool {
        self.owned
            .get(&faction)
            .is_some_and(|tiles| tiles.contains(&index))
    }

    /// Every faction with an entry, and its tiles.
    pub fn iter(&self) -> impl Iterator<Item = (FactionId, &BTreeSet<TileIndex>)> {
        self.owned.iter().map(|(id, tiles)| (*id, tiles))
    }

    fn register(&mut self, faction: FactionId) {
        self.owned.entry(faction).or_default();
    }

    pub(crate) fn insert(&mut self, faction: FactionId, index: TileIndex) {
        self.owned.entry(faction).or_default().insert(index);
    }

    pub(crate) fn remove(&mut self, faction: FactionId, index: TileIndex) -> bool {
        self.owned
            .get_mut(&faction)
            .is_some_and(|tiles| tiles.remove(&index))
    }
}

/// The map together with its ownership index.
#[derive(Debug, Clone)]
pub struct Territory {
    map: Map,
    ownership: OwnershipIndex,
    revisions: BTreeMap<FactionId, u64>,
}

impl Territory {
    /// Wrap a map, indexing every tile under its current owner.
    #[must_use]
    pub fn new(map: Map) -> Self {
        let mut ownership = OwnershipIndex::default();
        ownership.register(NEUTRAL);
        for (index, tile) in map.tiles().iter().enumerate() {
            ownership.insert(tile.owner, index);
        }
        Self {
            map,
            ownership,
            revisions: BTreeMap::new(),
        }
    }

    /// Read-only map.
    #[must_use]
    pub const fn map(&self) -> &Map {
        &self.map
    }

    /// Read-only ownership index.
    #[must_use]
    pub const fn ownership(&self) -> &OwnershipIndex {
        &self.ownership
    }

    /// How many times `faction` has gained or lost a tile.
    #[must_use]
    pub fn revision(&self, faction: FactionId) -> u64 {
        self.revisions.get(&faction).copied().unwrap_or(0)
    }

    /// Make sure a faction has an (initially empty) entry.
    pub(crate) fn register(&mut self, faction: FactionId) {
        self.ownership.register(faction);
    }

    /// Give `coord` to `owner`, returning the previous owner.
    ///
    /// The previous owner must list the tile; if it does not, the index has
    /// drifted from the map, nothing is changed and the drift is reported.
    ///
    /// # Errors
    ///
    /// Returns [`TerritoryError::OwnershipDrift`] when the index and the map disagree.
    ///
    /// # Panics
    ///
    /// Panics if `coord` is outside the map.
    pub(crate) fn assign(&mut self, coord: Coord, owner: FactionId) -> Result<FactionId, TerritoryError> {
        let index = self.map.index_of(coord);
        let previous = self.map.tile_at(index).owner;
        if previous == owner {
            return Ok(previous);
        }

        if !self.ownership.remove(previous, index) {
            log::error!(
                "faction {previous} owns ({}, {}) on the map but not in the ownership index",
                coord.x,
                coord.y
            );
            return Err(TerritoryError::OwnershipDrift {
                coord,
                owner: previous,
            });
        }
        self.ownership.insert(owner, index);
        self.map.set_owner(index, owner);
        for faction in [previous, owner] {
            *self.revisions.entry(faction).or_default() += 1;
        }
        Ok(previous)
    }

    #[cfg(test)]
    pub(crate) fn ownership_mut(&mut self) -> &mut OwnershipIndex {
        &mut self.ownership
    }
}
