//! Deterministic elevation field for map generation.
//!
//! Elevation is a five-octave sum of Perlin noise. Each octave doubles the
//! frequency and halves the weight; the sum is divided by the total weight so
//! the result stays in `[0, 1]` before scaling to whole percent.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use noise::{NoiseFn, Perlin};

use crate::game::TileType;

/// Number of noise octaves summed per sample.
pub const OCTAVES: usize = 5;

/// Frequency of the first octave, in cycles per tile.
pub const BASE_FREQUENCY: f64 = 0.015;

/// Elevation generator for one seed.
#[derive(Debug, Clone, Copy)]
pub struct TerrainGenerator {
    noise: Perlin,
    base_frequency: f64,
}

impl TerrainGenerator {
    /// Create a generator for `seed`.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self::with_frequency(seed, BASE_FREQUENCY)
    }

    /// Create a generator with a custom first-octave frequency.
    #[must_use]
    pub fn with_frequency(seed: u32, base_frequency: f64) -> Self {
        Self {
            noise: Perlin::new(seed),
            base_frequency,
        }
    }

    /// Perlin sample remapped from `[-1, 1]` to `[0, 1]`.
    fn raw(&self, x: f64, y: f64) -> f64 {
        ((self.noise.get([x, y]) + 1.0) / 2.0).clamp(0.0, 1.0)
    }

    /// Normalized elevation in `[0, 1]` at a tile position.
    #[must_use]
    pub fn elevation(&self, x: u16, y: u16) -> f64 {
        let mut sum = 0.0;
        let mut total_weight = 0.0;
        let mut weight = 1.0;
        let mut frequency = self.base_frequency;

        for _ in 0..OCTAVES {
            sum += self.raw(f64::from(x) * frequency, f64::from(y) * frequency) * weight;
            total_weight += weight;
            weight *= 0.5;
            frequency *= 2.0;
        }

        sum / total_weight
    }

    /// Elevation scaled to whole percent, `0..=100`.
    #[must_use]
    pub fn elevation_percent(&self, x: u16, y: u16) -> u8 {
        (self.elevation(x, y) * 100.0).round().clamp(0.0, 100.0) as u8
    }

    /// Terrain class at a tile position.
    #[must_use]
    pub fn tile_type(&self, x: u16, y: u16) -> TileType {
        TileType::from_elevation(self.elevation_percent(x, y))
    }
}
