//! Contest configuration loaded from an optional TOML file.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tas_core::Rules;
use tas_system_spawning::SpawnTuning;

/// Field rules and generator tuning shared by every subcommand.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ContestConfig {
    /// Field dimensions, horizon, and levelling.
    pub(crate) rules: Rules,
    /// Difficulty ramp of generated cases.
    pub(crate) tuning: SpawnTuning,
}

impl ContestConfig {
    /// Loads the configuration from `path`, or the contest defaults when absent.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read rules file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid rules file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("failed to parse rules toml")?;
        config.rules.validate()?;
        if config.tuning.min_percent > config.tuning.max_percent {
            bail!(
                "tuning.min_percent {} exceeds tuning.max_percent {}",
                config.tuning.min_percent,
                config.tuning.max_percent
            );
        }
        if config.tuning.roll_sides == 0 {
            bail!("tuning.roll_sides must be positive");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_contest_defaults() {
        let config = ContestConfig::parse("").expect("empty config");
        assert_eq!(config, ContestConfig::default());
        assert_eq!(config.rules.width, 25);
        assert_eq!(config.rules.max_turn, 1000);
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config = ContestConfig::parse("[rules]\nmax_turn = 50\n\n[tuning]\nmax_percent = 20\n")
            .expect("partial config");
        assert_eq!(config.rules.max_turn, 50);
        assert_eq!(config.rules.height, 60);
        assert_eq!(config.tuning.max_percent, 20);
        assert_eq!(config.tuning.min_percent, 1);
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let error = ContestConfig::parse("[rules]\nwidth = 4\nstart_lane = 9\n")
            .expect_err("start lane outside field");
        assert!(error.to_string().contains("start lane"), "{error:#}");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ContestConfig::parse("[rules]\nwidht = 4\n").is_err());
    }

    #[test]
    fn inverted_percent_range_is_rejected() {
        assert!(ContestConfig::parse("[tuning]\nmin_percent = 9\nmax_percent = 2\n").is_err());
    }
}
