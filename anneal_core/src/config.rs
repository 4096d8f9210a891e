//! Run parameters.

use crate::coordinator::InitialState;
use crate::error::ConfigError;
use crate::grid::DEFAULT_WIDTH;
use crate::partition::RingLayout;
use crate::source::DEFAULT_SEED;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for one automaton run.
///
/// Missing fields in a JSON file fall back to [`RunConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Total rows in the global grid
    pub rows: usize,

    /// Generations to compute
    pub iterations: u64,

    /// Cells per row
    pub width: usize,

    /// Seed for the coordinator's random fill
    pub seed: u64,

    /// Ranks in the ring
    pub workers: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            rows: 1024,
            iterations: 100,
            width: DEFAULT_WIDTH,
            seed: DEFAULT_SEED,
            workers: 4,
        }
    }
}

impl RunConfig {
    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Rejects parameters that cannot be partitioned or addressed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::NoWidth);
        }
        let layout = self.layout()?;

        // Largest buffer of the run: the coordinator's grid, or a lone partition with halos
        let too_large = || ConfigError::TooLarge {
            width: self.width,
            rows: self.rows,
        };
        let stride = self.width.checked_add(2).ok_or_else(too_large)?;
        let halo_rows = layout.total_rows().checked_add(2).ok_or_else(too_large)?;
        halo_rows.checked_mul(stride).ok_or_else(too_large)?;
        Ok(())
    }

    /// The row decomposition for this run.
    pub fn layout(&self) -> Result<RingLayout, ConfigError> {
        Ok(RingLayout::new(self.rows, self.workers)?)
    }

    /// Same run with a different ring size.
    pub fn with_workers(&self, workers: usize) -> Self {
        Self {
            workers,
            ..self.clone()
        }
    }

    /// The seeded random fill.
    pub fn initial_state(&self) -> InitialState {
        InitialState::Random { seed: self.seed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;

    #[test]
    fn test_defaults_are_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.width, 1024);
        assert_eq!(config.seed, 424243);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RunConfig::from_json_str(r#"{ "rows": 64, "iterations": 3 }"#).unwrap();
        assert_eq!(config.rows, 64);
        assert_eq!(config.iterations, 3);
        assert_eq!(config.workers, 4);
        assert_eq!(config.width, 1024);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            RunConfig::from_json_str(r#"{ "rows": -1 }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = RunConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_validation() {
        let base = RunConfig { rows: 8, workers: 2, width: 16, ..Default::default() };
        assert!(base.validate().is_ok());

        let no_width = RunConfig { width: 0, ..base.clone() };
        assert!(matches!(no_width.validate(), Err(ConfigError::NoWidth)));

        let no_rows = RunConfig { rows: 0, ..base.clone() };
        assert!(matches!(no_rows.validate(), Err(ConfigError::Layout(LayoutError::NoRows))));

        let crowded = base.with_workers(9);
        assert!(matches!(
            crowded.validate(),
            Err(ConfigError::Layout(LayoutError::TooManyWorkers { rows: 8, workers: 9 }))
        ));

        let idle = base.with_workers(0);
        assert!(matches!(idle.validate(), Err(ConfigError::Layout(LayoutError::NoWorkers))));
    }

    #[test]
    fn test_unaddressable_grid_rejected() {
        let wide = RunConfig { rows: 4, width: usize::MAX, workers: 1, ..Default::default() };
        assert!(matches!(
            wide.validate(),
            Err(ConfigError::TooLarge { width: usize::MAX, rows: 4 })
        ));

        let tall = RunConfig { rows: usize::MAX, width: 8, workers: 1, ..Default::default() };
        assert!(matches!(tall.validate(), Err(ConfigError::TooLarge { .. })));

        let square = RunConfig {
            rows: 1 << 33,
            width: 1 << 33,
            workers: 1,
            ..Default::default()
        };
        assert!(matches!(square.validate(), Err(ConfigError::TooLarge { .. })));

        let from_json = RunConfig::from_json_str(r#"{ "width": 18446744073709551615 }"#).unwrap();
        assert!(from_json.validate().is_err());
    }
}
