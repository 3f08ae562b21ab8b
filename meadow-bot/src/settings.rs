//! The config file: bot options plus an optional `selectors` section.
use std::path::Path;

use serde::{Deserialize, Serialize};

use meadow_core::{BotConfig, ConfigError};

use crate::browser::Selectors;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub bot: BotConfig,
    #[serde(default)]
    pub selectors: Selectors,
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.bot.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
