//! Map and tile types.

use std::collections::BTreeSet;

use crate::game::{FactionId, NEUTRAL, OwnershipIndex};
use crate::terrain::TerrainGenerator;

/// Flattened row-major tile index, `y * width + x`.
pub type TileIndex = usize;

/// A coordinate on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct Coord {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Get adjacent coordinates (up, down, left, right).
    ///
    /// Returns a fixed-size array and count to avoid heap allocation.
    /// The array contains valid coordinates in indices 0..count.
    #[must_use]
    #[inline]
    pub fn adjacent(&self, width: u16, height: u16) -> ([Coord; 4], u8) {
        let mut result = [Coord::new(0, 0); 4];
        let mut count = 0u8;

        if self.y > 0 {
            result[count as usize] = Coord::new(self.x, self.y - 1); // up
            count += 1;
        }
        if self.y + 1 < height {
            result[count as usize] = Coord::new(self.x, self.y + 1); // down
            count += 1;
        }
        if self.x > 0 {
            result[count as usize] = Coord::new(self.x - 1, self.y); // left
            count += 1;
        }
        if self.x + 1 < width {
            result[count as usize] = Coord::new(self.x + 1, self.y); // right
            count += 1;
        }

        (result, count)
    }
}

/// Type of terrain on a tile.
///
/// Discriminants are the minimum elevation (in percent) of each class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[repr(u8)]
pub enum TileType {
    /// Elevation below 50. Never owned by anyone but Neutral.
    Water = 0,
    /// Elevation 50..55.
    Beach = 50,
    /// Elevation 55..70.
    Grass = 55,
    /// Elevation 70..80.
    Hill = 70,
    /// Elevation 80 and above.
    Mountain = 80,
}

impl TileType {
    /// Classify an elevation percentage.
    #[must_use]
    pub const fn from_elevation(elevation: u8) -> Self {
        if elevation >= TileType::Mountain as u8 {
            TileType::Mountain
        } else if elevation >= TileType::Hill as u8 {
            TileType::Hill
        } else if elevation >= TileType::Grass as u8 {
            TileType::Grass
        } else if elevation >= TileType::Beach as u8 {
            TileType::Beach
        } else {
            TileType::Water
        }
    }

    /// Lowest elevation that still classifies as this type.
    #[must_use]
    pub const fn min_elevation(self) -> u8 {
        self as u8
    }

    /// Check if factions can claim this tile.
    #[must_use]
    pub const fn is_land(self) -> bool {
        !matches!(self, TileType::Water)
    }
}

/// A single tile on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Elevation in percent, `0..=100`.
    pub elevation: u8,
    /// Terrain class derived from `elevation`.
    pub tile_type: TileType,
    /// Owning faction ([`NEUTRAL`] when unclaimed).
    pub owner: FactionId,
}

impl Tile {
    /// Create an unclaimed tile at the given elevation.
    #[must_use]
    pub const fn from_elevation(elevation: u8) -> Self {
        let elevation = if elevation > 100 { 100 } else { elevation };
        Self {
            elevation,
            tile_type: TileType::from_elevation(elevation),
            owner: NEUTRAL,
        }
    }
}

/// Result of a border scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Border {
    /// Land tiles orthogonally adjacent to the scanning faction.
    pub tiles: BTreeSet<Coord>,
    /// Owners of those tiles.
    pub neighbors: BTreeSet<FactionId>,
}

impl Border {
    /// True when no contested tile was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// The game map.
///
/// Terrain never changes after construction. Owners change only through
/// [`Territory::assign`](crate::game::Territory::assign).
#[derive(Debug, Clone)]
pub struct Map {
    /// Width of the map in tiles.
    width: u16,
    /// Height of the map in tiles.
    height: u16,
    /// Tiles stored in row-major order.
    tiles: Vec<Tile>,
}

impl Map {
    /// Generate a map from noise terrain.
    ///
    /// Returns `None` if width or height is zero.
    #[must_use]
    pub fn new(width: u16, height: u16, seed: u32) -> Option<Self> {
        let generator = TerrainGenerator::new(seed);
        Self::from_fn(width, height, |coord| {
            generator.elevation_percent(coord.x, coord.y)
        })
    }

    /// Build a map from an elevation function.
    ///
    /// Returns `None` if width or height is zero.
    #[must_use]
    pub fn from_fn(width: u16, height: u16, mut elevation: impl FnMut(Coord) -> u8) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }

        let size = usize::from(width) * usize::from(height);
        let mut tiles = Vec::with_capacity(size);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::from_elevation(elevation(Coord::new(x, y))));
            }
        }

        Some(Self {
            width,
            height,
            tiles,
        })
    }

    /// Build a map where every tile has the same terrain.
    #[must_use]
    pub fn uniform(width: u16, height: u16, tile_type: TileType) -> Option<Self> {
        Self::from_fn(width, height, |_| tile_type.min_elevation())
    }

    /// Get the width of the map.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Get the height of the map.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always false; maps have at least one tile.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Get a reference to the raw tiles slice for efficient iteration.
    #[must_use]
    #[inline]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Check if a coordinate is within the map bounds.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Convert a coordinate to an index, or `None` outside the map.
    #[must_use]
    pub fn checked_index(&self, coord: Coord) -> Option<TileIndex> {
        self.in_bounds(coord).then(|| self.index_of(coord))
    }

    /// Convert an in-bounds coordinate to its row-major index.
    #[must_use]
    #[inline]
    pub fn index_of(&self, coord: Coord) -> TileIndex {
        debug_assert!(self.in_bounds(coord), "{coord:?} outside map");
        usize::from(coord.y) * usize::from(self.width) + usize::from(coord.x)
    }

    /// Convert a row-major index back to its coordinate.
    #[must_use]
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn coord_of(&self, index: TileIndex) -> Coord {
        debug_assert!(index < self.tiles.len(), "index {index} outside map");
        let width = usize::from(self.width);
        Coord::new((index % width) as u16, (index / width) as u16)
    }

    /// Get a reference to the tile at the given coordinate.
    #[must_use]
    pub fn get(&self, coord: Coord) -> Option<&Tile> {
        self.checked_index(coord).map(|idx| &self.tiles[idx])
    }

    /// Tile at an in-bounds coordinate.
    ///
    /// # Panics
    ///
    /// Panics if `coord` is outside the map.
    #[must_use]
    pub fn tile(&self, coord: Coord) -> &Tile {
        &self.tiles[self.index_of(coord)]
    }

    /// Tile at an in-bounds index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the map.
    #[must_use]
    pub fn tile_at(&self, index: TileIndex) -> &Tile {
        &self.tiles[index]
    }

    /// Overwrite a tile's owner. Callers keep the ownership index in step.
    pub(crate) fn set_owner(&mut self, index: TileIndex, owner: FactionId) {
        self.tiles[index].owner = owner;
    }

    /// Iterate over all coordinates and tiles.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Tile)> {
        self.tiles
            .iter()
            .enumerate()
            .map(|(idx, tile)| (self.coord_of(idx), tile))
    }

    /// Get all tiles owned by a specific faction by scanning the whole map.
    pub fn tiles_owned_by(&self, faction: FactionId) -> impl Iterator<Item = (Coord, &Tile)> {
        self.iter().filter(move |(_, tile)| tile.owner == faction)
    }

    /// Land tiles bordering `from`'s territory, optionally restricted to owner `to`.
    ///
    /// Walks only the tiles `ownership` lists for `from`, so the cost grows with
    /// the faction's size rather than the map's.
    #[must_use]
    pub fn border(&self, from: FactionId, ownership: &OwnershipIndex, to: Option<FactionId>) -> Border {
        let mut border = Border::default();

        for index in ownership.tiles_of(from) {
            let coord = self.coord_of(index);
            let (adjacent, count) = coord.adjacent(self.width, self.height);
            for adj in &adjacent[..count as usize] {
                let tile = self.tile(*adj);
                if tile.owner == from || !tile.tile_type.is_land() {
                    continue;
                }
                if to.is_some_and(|target| tile.owner != target) {
                    continue;
                }
                border.tiles.insert(*adj);
                border.neighbors.insert(tile.owner);
            }
        }

        border
    }
}
