//! Game parameter configuration.
//!
//! The defaults are the canonical table stakes: 400-chip stacks, 1/2
//! blinds, four aggressive actions per street. A YAML file can override
//! them for experiments with shallower stacks or tighter trees.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chip and tree parameters for a Hold'em Toss game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Starting stack for both seats.
    #[serde(default = "default_starting_stack")]
    pub starting_stack: u32,
    /// Small blind posted by seat 0.
    #[serde(default = "default_small_blind")]
    pub small_blind: u32,
    /// Big blind posted by seat 1; also the minimum bet.
    #[serde(default = "default_big_blind")]
    pub big_blind: u32,
    /// Cap on aggressive actions (bet plus raises) per street.
    #[serde(default = "default_max_raises")]
    pub max_raises_per_street: u8,
}

fn default_starting_stack() -> u32 {
    400
}
fn default_small_blind() -> u32 {
    1
}
fn default_big_blind() -> u32 {
    2
}
fn default_max_raises() -> u8 {
    4
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_stack: default_starting_stack(),
            small_blind: default_small_blind(),
            big_blind: default_big_blind(),
            max_raises_per_street: default_max_raises(),
        }
    }
}

impl GameConfig {
    /// Load a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_yaml(&content)
    }

    /// Parse a configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or the values are not a
    /// playable game.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.small_blind == 0 {
            return Err(ConfigError::InvalidBlinds {
                small: self.small_blind,
                big: self.big_blind,
            });
        }
        if self.big_blind <= self.small_blind {
            return Err(ConfigError::InvalidBlinds {
                small: self.small_blind,
                big: self.big_blind,
            });
        }
        if self.starting_stack <= self.big_blind {
            return Err(ConfigError::StackTooSmall {
                stack: self.starting_stack,
                big_blind: self.big_blind,
            });
        }
        if self.max_raises_per_street == 0 {
            return Err(ConfigError::NoRaisesAllowed);
        }
        Ok(())
    }
}

/// Errors loading or validating a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("blinds must satisfy 0 < small < big, got {small}/{big}")]
    InvalidBlinds { small: u32, big: u32 },

    #[error("starting stack {stack} must exceed the big blind {big_blind}")]
    StackTooSmall { stack: u32, big_blind: u32 },

    #[error("max_raises_per_street must be at least 1")]
    NoRaisesAllowed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_macros::timed_test;

    #[timed_test]
    fn defaults_are_the_canonical_stakes() {
        let config = GameConfig::default();
        assert_eq!(config.starting_stack, 400);
        assert_eq!(config.small_blind, 1);
        assert_eq!(config.big_blind, 2);
        assert_eq!(config.max_raises_per_street, 4);
    }

    #[timed_test]
    fn partial_yaml_fills_defaults() {
        let config = GameConfig::from_yaml("starting_stack: 100\n").unwrap();
        assert_eq!(config.starting_stack, 100);
        assert_eq!(config.big_blind, 2);
    }

    #[timed_test]
    fn inverted_blinds_rejected() {
        let result = GameConfig::from_yaml("small_blind: 2\nbig_blind: 2\n");
        assert!(matches!(result, Err(ConfigError::InvalidBlinds { .. })));
    }

    #[timed_test]
    fn tiny_stack_rejected() {
        let result = GameConfig::from_yaml("starting_stack: 2\n");
        assert!(matches!(result, Err(ConfigError::StackTooSmall { .. })));
    }

    #[timed_test]
    fn zero_raise_cap_rejected() {
        let result = GameConfig::from_yaml("max_raises_per_street: 0\n");
        assert!(matches!(result, Err(ConfigError::NoRaisesAllowed)));
    }

    #[timed_test]
    fn malformed_yaml_is_a_parse_error() {
        let result = GameConfig::from_yaml(": not yaml");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
