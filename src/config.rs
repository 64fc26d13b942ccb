// Settings file handling.
//
// The TOML file is deserialized as-is into `Settings` (every field
// optional), then validated into the typed values each component takes in
// its constructor. Nothing here is global.
use crate::error::{Result, StatsError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "dig_report.toml";
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analytics: AnalyticsSettings,
    pub names: NameSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    pub rolling_window_days: Option<u32>,
    pub leaderboard_limit: Option<usize>,
}

/// Additions merged over the built-in name rule tables.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NameSettings {
    pub aliases: BTreeMap<String, String>,
    pub connector_words: BTreeMap<String, String>,
    pub preserve_suffixes: Vec<String>,
    pub remove_suffixes: Vec<String>,
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loaded settings from {}", path.display());
        Self::from_toml_str(&text)
    }
}

/// Validated analytics parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsConfig {
    pub rolling_window_days: u32,
    pub leaderboard_limit: usize,
}

impl AnalyticsConfig {
    /// The rolling window has no sensible default, so its absence is fatal.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let rolling_window_days = settings
            .analytics
            .rolling_window_days
            .ok_or(StatsError::MissingConfig("analytics.rolling_window_days"))?;
        if rolling_window_days == 0 {
            return Err(StatsError::InvalidConfig(
                "analytics.rolling_window_days must be at least 1".to_string(),
            ));
        }
        let leaderboard_limit = settings
            .analytics
            .leaderboard_limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
        if leaderboard_limit == 0 {
            return Err(StatsError::InvalidConfig(
                "analytics.leaderboard_limit must be at least 1".to_string(),
            ));
        }
        Ok(Self { rolling_window_days, leaderboard_limit })
    }
}
