//! Match configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "width": 200, "height": 150, "seed": 7, "intervals": { "ai_ms": 250 } }
//! ```

use std::path::Path;

use crate::error::ConfigError;
use crate::game::{FactionId, TickIntervals};

/// Default map width in tiles.
pub const DEFAULT_WIDTH: u32 = 400;

/// Default map height in tiles.
pub const DEFAULT_HEIGHT: u32 = 300;

/// Default number of AI factions created with a match.
pub const DEFAULT_AI_COUNTRIES: usize = 15;

/// Default spawn radius; 2 claims a 5×5 square.
pub const DEFAULT_SPAWN_RADIUS: u16 = 2;

/// Settings for a new [`Match`](crate::game::Match).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Seed for terrain and every random decision.
    pub seed: u64,
    /// AI factions created and placed with the match.
    pub ai_countries: usize,
    /// Half-width of the square claimed by a spawn.
    pub spawn_radius: u16,
    /// How often each update pass runs.
    pub intervals: TickIntervals,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            seed: 0,
            ai_countries: DEFAULT_AI_COUNTRIES,
            spawn_radius: DEFAULT_SPAWN_RADIUS,
            intervals: TickIntervals::default(),
        }
    }
}

impl MatchConfig {
    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] if the values fail [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check that the values describe a playable match.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dimensions()?;
        let intervals = &self.intervals;
        if intervals.attack_ms == 0 || intervals.population_ms == 0 || intervals.ai_ms == 0 {
            return Err(ConfigError::Invalid(format!(
                "tick intervals must be positive, got {intervals:?}"
            )));
        }
        let max_ai = usize::from(FactionId::MAX);
        if self.ai_countries > max_ai {
            return Err(ConfigError::Invalid(format!(
                "{} AI countries requested, at most {max_ai} fit",
                self.ai_countries
            )));
        }
        Ok(())
    }

    /// Map size as tile coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero side or one beyond `u16`.
    pub fn dimensions(&self) -> Result<(u16, u16), ConfigError> {
        let side = |name: &str, value: u32| {
            u16::try_from(value)
                .ok()
                .filter(|&v| v > 0)
                .ok_or_else(|| ConfigError::Invalid(format!("{name} must be in 1..=65535, got {value}")))
        };
        Ok((side("width", self.width)?, side("height", self.height)?))
    }

    /// Seed for the terrain noise, which takes 32 bits.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn terrain_seed(&self) -> u32 {
        (self.seed ^ (self.seed >> 32)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.ai_countries, 15);
        assert_eq!(config.spawn_radius, 2);
        assert_eq!(config.intervals.attack_ms, 50);
        assert_eq!(config.intervals.population_ms, 10_000);
        assert_eq!(config.intervals.ai_ms, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            MatchConfig::from_json_str(r#"{ "width": 64, "seed": 9, "intervals": { "ai_ms": 250 } }"#)
                .unwrap();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.seed, 9);
        assert_eq!(config.intervals.ai_ms, 250);
        assert_eq!(config.intervals.attack_ms, 50);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for json in [
            r#"{ "width": 0 }"#,
            r#"{ "height": 70000 }"#,
            r#"{ "intervals": { "attack_ms": 0 } }"#,
            r#"{ "ai_countries": 300 }"#,
        ] {
            assert!(
                matches!(MatchConfig::from_json_str(json), Err(ConfigError::Invalid(_))),
                "{json}"
            );
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            MatchConfig::from_json_str("{ width: 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            MatchConfig::from_json_str(r#"{ "width": "wide" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "width": 32, "height": 24, "ai_countries": 3 }}"#).unwrap();

        let config = MatchConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.dimensions().unwrap(), (32, 24));
        assert_eq!(config.ai_countries, 3);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        match MatchConfig::from_json_file(&path) {
            Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_roundtrip_through_json() {
        let config = MatchConfig {
            seed: u64::MAX,
            ..MatchConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(MatchConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_terrain_seed_folds_high_bits() {
        let low = MatchConfig { seed: 5, ..MatchConfig::default() };
        let high = MatchConfig { seed: 5 << 32, ..MatchConfig::default() };
        assert_eq!(low.terrain_seed(), 5);
        assert_eq!(high.terrain_seed(), 5);
    }
}
