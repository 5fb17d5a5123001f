//! Simulation configuration.
//!
//! [`SimConfig`] is plain serde data. Every field has a default, so a JSON
//! document only needs the keys it wants to change:
//!
//! ```
//! use skirmish_core::config::SimConfig;
//!
//! let config = SimConfig::from_json_str(r#"{ "map_size": 40, "seed": 7 }"#).unwrap();
//! assert_eq!(config.map_size, 40);
//! assert_eq!(config.population, 50);
//! assert_eq!(config.seed, Some(7));
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::{Grid, KindStats, KindTable};
use crate::error::ConfigError;

/// Tunables for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Cells per axis of the square grid.
    pub map_size: i32,
    /// Agents generated when no population is loaded.
    pub population: usize,
    /// Pause between movement ticks, in milliseconds.
    pub tick_interval_ms: u64,
    /// How long an idle resolver waits for work before re-checking the stop
    /// signal, in milliseconds.
    pub resolver_idle_ms: u64,
    /// Number of combat resolver threads.
    pub resolver_threads: usize,
    /// Master seed. `None` draws one at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Movement and engagement ranges per kind.
    pub kinds: KindTable<KindStats>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            map_size: 100,
            population: 50,
            tick_interval_ms: 200,
            resolver_idle_ms: 50,
            resolver_threads: 1,
            seed: None,
            kinds: KindTable::default(),
        }
    }
}

impl SimConfig {
    /// Parses a JSON document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the
    /// [`validate`](Self::validate) errors for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Checks the values a run cannot start with.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.map_size <= 0 {
            return Err(ConfigError::InvalidMapSize(self.map_size));
        }
        if self.resolver_threads == 0 {
            return Err(ConfigError::NoResolvers);
        }
        if let Some((kind, stats)) = self.kinds.iter().find(|(_, stats)| stats.move_range < 0) {
            return Err(ConfigError::NegativeMoveRange {
                kind: kind.label(),
                range: stats.move_range,
            });
        }
        Ok(())
    }

    /// The grid described by `map_size`.
    #[must_use]
    pub const fn grid(&self) -> Grid {
        Grid::new(self.map_size)
    }

    /// Pause between movement ticks.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Idle wait of a resolver.
    #[must_use]
    pub const fn resolver_idle(&self) -> Duration {
        Duration::from_millis(self.resolver_idle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod default_tests {
        use super::*;

        #[test]
        fn defaults_are_valid() {
            let config = SimConfig::default();
            assert!(config.validate().is_ok());
            assert_eq!(config.grid().size(), 100);
            assert_eq!(config.tick_interval(), Duration::from_millis(200));
            assert_eq!(config.resolver_idle(), Duration::from_millis(50));
        }

        #[test]
        fn default_kind_stats() {
            let kinds = SimConfig::default().kinds;
            assert_eq!(kinds.predator, KindStats::new(50, 30));
            assert_eq!(kinds.brawler, KindStats::new(30, 10));
            assert_eq!(kinds.prey, KindStats::new(1, 10));
        }
    }

    mod json_tests {
        use super::*;

        #[test]
        fn empty_object_is_default() {
            assert_eq!(SimConfig::from_json_str("{}").unwrap(), SimConfig::default());
        }

        #[test]
        fn partial_kinds_override() {
            let json = r#"{
                "resolver_threads": 4,
                "kinds": {
                    "predator": { "move_range": 5, "kill_range": 2 },
                    "brawler": { "move_range": 3, "kill_range": 1 },
                    "prey": { "move_range": 0, "kill_range": 0 }
                }
            }"#;
            let config = SimConfig::from_json_str(json).unwrap();
            assert_eq!(config.resolver_threads, 4);
            assert_eq!(config.kinds.predator, KindStats::new(5, 2));
            assert_eq!(config.kinds.prey.move_range, 0);
        }

        #[test]
        fn serializes_back() {
            let config = SimConfig {
                seed: Some(3),
                ..SimConfig::default()
            };
            let json = serde_json::to_string(&config).unwrap();
            assert_eq!(SimConfig::from_json_str(&json).unwrap(), config);
        }

        #[test]
        fn malformed_json_is_parse_error() {
            let err = SimConfig::from_json_str("{ map_size: }").unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)));
        }

        #[test]
        fn missing_file_is_read_error() {
            let err = SimConfig::load("/definitely/not/here.json").unwrap_err();
            assert!(matches!(err, ConfigError::Read { .. }));
        }
    }

    mod validate_tests {
        use super::*;

        #[test]
        fn rejects_empty_map() {
            let config = SimConfig {
                map_size: 0,
                ..SimConfig::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::InvalidMapSize(0))));
        }

        #[test]
        fn rejects_zero_resolvers() {
            let err = SimConfig::from_json_str(r#"{ "resolver_threads": 0 }"#).unwrap_err();
            assert!(matches!(err, ConfigError::NoResolvers));
        }

        #[test]
        fn rejects_negative_move_range() {
            let mut config = SimConfig::default();
            config.kinds.brawler.move_range = -1;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::NegativeMoveRange {
                    kind: "brawler",
                    range: -1
                })
            ));
        }
    }
}
