//! Match configuration.
//!
//! All fields have defaults, so an empty JSON object is a valid config:
//!
//! ```json
//! { "core_size": 8000, "cycle_limit": 80000, "seed": 42 }
//! ```

use crate::vm::DEFAULT_CORE_SIZE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of ticks before a match is declared a draw.
pub const DEFAULT_CYCLE_LIMIT: u64 = 80_000;

/// Parameters of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Number of cells in the core.
    #[serde(default = "MatchConfig::default_core_size")]
    pub core_size: usize,

    /// Ticks before a draw is declared. `None` runs without limit.
    #[serde(default = "MatchConfig::default_cycle_limit")]
    pub cycle_limit: Option<u64>,

    /// Explicit load address of each program, in program order.
    #[serde(default)]
    pub start_positions: Option<Vec<usize>>,

    /// Address of the first program when placement is automatic.
    #[serde(default)]
    pub base_offset: usize,

    /// When set, the base offset is drawn from a generator seeded with this
    /// value instead of taken from `base_offset`.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl MatchConfig {
    fn default_core_size() -> usize {
        DEFAULT_CORE_SIZE
    }

    fn default_cycle_limit() -> Option<u64> {
        Some(DEFAULT_CYCLE_LIMIT)
    }

    /// Parse a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builder-style core size.
    pub fn with_core_size(mut self, size: usize) -> Self {
        self.core_size = size;
        self
    }

    /// Builder-style cycle limit.
    pub fn with_cycle_limit(mut self, limit: Option<u64>) -> Self {
        self.cycle_limit = limit;
        self
    }

    /// Builder-style explicit start positions.
    pub fn with_start_positions(mut self, positions: Vec<usize>) -> Self {
        self.start_positions = Some(positions);
        self
    }

    /// Builder-style fixed base offset.
    pub fn with_base_offset(mut self, offset: usize) -> Self {
        self.base_offset = offset;
        self
    }

    /// Builder-style placement seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            core_size: DEFAULT_CORE_SIZE,
            cycle_limit: Some(DEFAULT_CYCLE_LIMIT),
            start_positions: None,
            base_offset: 0,
            seed: None,
        }
    }
}

/// Errors reading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = MatchConfig::from_json("{}").unwrap();
        assert_eq!(config, MatchConfig::default());
        assert_eq!(config.core_size, 8000);
        assert_eq!(config.cycle_limit, Some(DEFAULT_CYCLE_LIMIT));
    }

    #[test]
    fn test_json_overrides() {
        let config = MatchConfig::from_json(
            r#"{ "core_size": 100, "cycle_limit": null, "start_positions": [0, 50], "seed": 7 }"#,
        )
        .unwrap();
        assert_eq!(config.core_size, 100);
        assert_eq!(config.cycle_limit, None);
        assert_eq!(config.start_positions, Some(vec![0, 50]));
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_malformed_json() {
        let err = MatchConfig::from_json(r#"{ "core_size": "big" }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid config"));
    }

    #[test]
    fn test_builders() {
        let config = MatchConfig::default()
            .with_core_size(64)
            .with_cycle_limit(Some(10))
            .with_base_offset(3)
            .with_seed(1)
            .with_start_positions(vec![1, 2]);
        assert_eq!(config.core_size, 64);
        assert_eq!(config.cycle_limit, Some(10));
        assert_eq!(config.base_offset, 3);
        assert_eq!(config.seed, Some(1));
        assert_eq!(config.start_positions, Some(vec![1, 2]));
    }
}
