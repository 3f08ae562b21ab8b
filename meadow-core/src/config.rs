//! Bot configuration and operator-facing option handling.
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or changing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown option: {0}")]
    UnknownOption(String),
    #[error("invalid interval {0:?}: expected a whole number of milliseconds >= 1")]
    InvalidInterval(String),
    #[error("{field} must be at least 1 (got {value})")]
    IntervalTooSmall { field: &'static str, value: u64 },
    #[error("upgradeChance must be between 0 and 1 (got {0})")]
    ChanceOutOfRange(f64),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Process-wide bot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotConfig {
    /// Milliseconds between clicks on the main target.
    pub click_interval: u64,
    /// Milliseconds between decision ticks.
    pub purchase_interval: u64,
    /// Milliseconds between status reports.
    pub status_interval: u64,
    /// Milliseconds between weed/hazard/final-offer scans.
    pub scan_interval: u64,
    pub auto_upgrade: bool,
    pub collect_lootboxes: bool,
    pub collect_level_rewards: bool,
    pub remove_weeds: bool,
    pub avoid_lawnmowers: bool,
    pub finish_game: bool,
    /// Lifts `excluded_items` for priority purchases when enabled.
    pub experimental_mode: bool,
    /// Offer ids to buy first, in order.
    pub priority_items: Vec<u32>,
    pub excluded_items: Vec<u32>,
    /// Item ids favored by the upgrade patch.
    pub focus_items: Vec<String>,
    pub points_reserve: u64,
    pub debug_mode: bool,
    /// Label substring that identifies the final offer.
    pub final_item_label: String,
    /// Item whose metadata carries the current level.
    pub level_item_id: String,
    /// Chance per decision tick of running the upgrade patch.
    pub upgrade_chance: f64,
    /// Minimum runtime before stuck detection may fire.
    pub stuck_threshold_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            click_interval: 10,
            purchase_interval: 500,
            status_interval: 3000,
            scan_interval: 250,
            auto_upgrade: true,
            collect_lootboxes: true,
            collect_level_rewards: true,
            remove_weeds: true,
            avoid_lawnmowers: true,
            finish_game: false,
            experimental_mode: false,
            priority_items: vec![26, 18, 24, 14, 13, 12],
            excluded_items: Vec::new(),
            focus_items: Vec::new(),
            points_reserve: 100,
            debug_mode: false,
            final_item_label: "Final".to_string(),
            level_item_id: "0".to_string(),
            upgrade_chance: 0.05,
            stuck_threshold_secs: 30,
        }
    }
}

const BOOLEAN_OPTIONS: [&str; 8] = [
    "autoUpgrade",
    "collectLootboxes",
    "collectLevelRewards",
    "removeWeeds",
    "avoidLawnmowers",
    "finishGame",
    "experimentalMode",
    "debugMode",
];

impl BotConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check intervals and probabilities.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("clickInterval", self.click_interval),
            ("purchaseInterval", self.purchase_interval),
            ("statusInterval", self.status_interval),
            ("scanInterval", self.scan_interval),
        ] {
            if value < 1 {
                return Err(ConfigError::IntervalTooSmall { field, value });
            }
        }
        if !(0.0..=1.0).contains(&self.upgrade_chance) {
            return Err(ConfigError::ChanceOutOfRange(self.upgrade_chance));
        }
        Ok(())
    }

    /// Names accepted by [`BotConfig::toggle`].
    #[must_use]
    pub fn boolean_options() -> &'static [&'static str] {
        &BOOLEAN_OPTIONS
    }

    /// Flip a named boolean option and return its new value.
    ///
    /// Accepts camelCase or `snake_case` names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownOption`] when no boolean option has that name.
    pub fn toggle(&mut self, name: &str) -> Result<bool, ConfigError> {
        let flag = self
            .flag_mut(name)
            .ok_or_else(|| ConfigError::UnknownOption(name.to_string()))?;
        *flag = !*flag;
        Ok(*flag)
    }

    /// Validate and apply a new click interval given as operator text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidInterval`] for non-numeric or zero input.
    pub fn set_click_interval(&mut self, raw: &str) -> Result<Duration, ConfigError> {
        let ms = parse_interval(raw)?;
        self.click_interval = ms;
        Ok(self.click_period())
    }

    #[must_use]
    pub fn click_period(&self) -> Duration {
        Duration::from_millis(self.click_interval)
    }

    #[must_use]
    pub fn purchase_period(&self) -> Duration {
        Duration::from_millis(self.purchase_interval)
    }

    #[must_use]
    pub fn status_period(&self) -> Duration {
        Duration::from_millis(self.status_interval)
    }

    #[must_use]
    pub fn scan_period(&self) -> Duration {
        Duration::from_millis(self.scan_interval)
    }

    #[must_use]
    pub fn stuck_threshold(&self) -> Duration {
        Duration::from_secs(self.stuck_threshold_secs)
    }

    /// Whether excluded offers are skipped for priority purchases.
    #[must_use]
    pub fn restricted(&self) -> bool {
        !self.experimental_mode
    }

    #[must_use]
    pub fn is_excluded(&self, id: u32) -> bool {
        self.excluded_items.contains(&id)
    }

    /// Labels of the mode flags currently switched on.
    #[must_use]
    pub fn active_flags(&self) -> Vec<&'static str> {
        Self::boolean_options()
            .iter()
            .copied()
            .filter(|name| self.flag(name).unwrap_or(false))
            .collect()
    }

    fn flag(&self, name: &str) -> Option<bool> {
        match option_key(name).as_str() {
            "autoupgrade" => Some(self.auto_upgrade),
            "collectlootboxes" => Some(self.collect_lootboxes),
            "collectlevelrewards" => Some(self.collect_level_rewards),
            "removeweeds" => Some(self.remove_weeds),
            "avoidlawnmowers" => Some(self.avoid_lawnmowers),
            "finishgame" => Some(self.finish_game),
            "experimentalmode" => Some(self.experimental_mode),
            "debugmode" => Some(self.debug_mode),
            _ => None,
        }
    }

    fn flag_mut(&mut self, name: &str) -> Option<&mut bool> {
        match option_key(name).as_str() {
            "autoupgrade" => Some(&mut self.auto_upgrade),
            "collectlootboxes" => Some(&mut self.collect_lootboxes),
            "collectlevelrewards" => Some(&mut self.collect_level_rewards),
            "removeweeds" => Some(&mut self.remove_weeds),
            "avoidlawnmowers" => Some(&mut self.avoid_lawnmowers),
            "finishgame" => Some(&mut self.finish_game),
            "experimentalmode" => Some(&mut self.experimental_mode),
            "debugmode" => Some(&mut self.debug_mode),
            _ => None,
        }
    }
}

fn option_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn parse_interval(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms >= 1 => Ok(ms),
        _ => Err(ConfigError::InvalidInterval(raw.to_string())),
    }
}
