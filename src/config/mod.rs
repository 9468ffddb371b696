//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::models::Color;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pair weights used to rank candidate opponents.
///
/// A pair scores `base - score_step * gap + color_term - rematch_penalty`,
/// where `gap` is the score difference in half points and `color_term` is
/// `color_preference` when both players can get their due colour,
/// `color_tolerated` when one of them loses it without breaking the colour
/// limit, and zero otherwise. Validation keeps the terms in strict order:
/// any rematch-free pair outranks any rematch, a score step outweighs the
/// whole colour term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    #[serde(default = "default_base")]
    pub base: i64,

    /// Cost per half point of score difference
    #[serde(default = "default_score_step")]
    pub score_step: i64,

    /// Bonus when both players get their due colour
    #[serde(default = "default_color_preference")]
    pub color_preference: i64,

    /// Bonus when a colour clash stays within the imbalance limit
    #[serde(default = "default_color_tolerated")]
    pub color_tolerated: i64,

    /// Cost of a rematch, applied only once rematches are allowed
    #[serde(default = "default_rematch_penalty")]
    pub rematch_penalty: i64,
}

fn default_base() -> i64 {
    10_000_000
}

fn default_score_step() -> i64 {
    100
}

fn default_color_preference() -> i64 {
    20
}

fn default_color_tolerated() -> i64 {
    10
}

fn default_rematch_penalty() -> i64 {
    1_000_000
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            score_step: default_score_step(),
            color_preference: default_color_preference(),
            color_tolerated: default_color_tolerated(),
            rematch_penalty: default_rematch_penalty(),
        }
    }
}

/// Pairing rules for a tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingConfig {
    /// Largest |whites - blacks| allowed before a pairing is flagged
    #[serde(default = "default_max_color_imbalance")]
    pub max_color_imbalance: u32,

    /// Colour of the higher-ranked player on board 1 when nobody has history
    #[serde(default)]
    pub first_board_color: Color,

    /// Round ceiling for the tournament
    #[serde(default)]
    pub max_rounds: Option<u32>,

    /// Relax no-rematch when no rematch-free round exists
    #[serde(default = "default_allow_rematches")]
    pub allow_rematches: bool,

    #[serde(default)]
    pub weights: WeightConfig,
}

fn default_max_color_imbalance() -> u32 {
    1
}

fn default_allow_rematches() -> bool {
    true
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            max_color_imbalance: default_max_color_imbalance(),
            first_board_color: Color::default(),
            max_rounds: None,
            allow_rematches: default_allow_rematches(),
            weights: WeightConfig::default(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub pairing: PairingConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            pairing: PairingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pairing.validate()
    }
}

impl PairingConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;

        if w.color_tolerated < 0 || w.color_preference < w.color_tolerated {
            return Err(ConfigError::ValidationError(
                "color_preference must be >= color_tolerated >= 0".to_string(),
            ));
        }

        if w.score_step <= w.color_preference {
            return Err(ConfigError::ValidationError(
                "score_step must exceed color_preference".to_string(),
            ));
        }

        if w.rematch_penalty <= w.score_step {
            return Err(ConfigError::ValidationError(
                "rematch_penalty must exceed score_step".to_string(),
            ));
        }

        if w.base <= w.rematch_penalty {
            return Err(ConfigError::ValidationError(
                "base must exceed rematch_penalty".to_string(),
            ));
        }

        if self.max_rounds == Some(0) {
            return Err(ConfigError::ValidationError(
                "max_rounds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.pairing.max_color_imbalance, 1);
        assert_eq!(config.pairing.first_board_color, Color::White);
        assert!(config.pairing.allow_rematches);
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_color_outweighs_score() {
        let mut config = PairingConfig::default();
        config.weights.color_preference = 500;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_cheap_rematch() {
        let mut config = PairingConfig::default();
        config.weights.rematch_penalty = 50;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_rounds() {
        let mut config = PairingConfig::default();
        config.max_rounds = Some(0);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            log_level = "debug"

            [pairing]
            max_rounds = 7
            first_board_color = "black"

            [pairing.weights]
            score_step = 200
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.pairing.max_rounds, Some(7));
        assert_eq!(config.pairing.first_board_color, Color::Black);
        assert_eq!(config.pairing.weights.score_step, 200);
        assert_eq!(config.pairing.weights.rematch_penalty, 1_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        // Should be parseable
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.pairing, parsed.pairing);
    }
}
