use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{clef::ClefSetting, DomainError};

pub const MAX_LEDGER_LINES: u8 = 6;
pub const MIN_TIME_LIMIT_SECONDS: f64 = 1.0;
pub const MAX_TIME_LIMIT_SECONDS: f64 = 30.0;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettings {
    pub clef: ClefSetting,
    pub max_ledger_lines: u8,
    pub only_ledger_lines: bool,
    pub time_limit_enabled: bool,
    pub time_limit_seconds: f64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            clef: ClefSetting::Treble,
            max_ledger_lines: 1,
            only_ledger_lines: false,
            time_limit_enabled: false,
            time_limit_seconds: 10.0,
        }
    }
}

impl GameSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_ledger_lines > MAX_LEDGER_LINES {
            return Err(DomainError::validation(format!(
                "max ledger lines must be between 0 and {MAX_LEDGER_LINES}"
            )));
        }
        if !self.time_limit_seconds.is_finite() || self.time_limit_seconds <= 0.0 {
            return Err(DomainError::validation(
                "time limit must be a positive number of seconds",
            ));
        }
        if self.time_limit_enabled
            && !(MIN_TIME_LIMIT_SECONDS..=MAX_TIME_LIMIT_SECONDS).contains(&self.time_limit_seconds)
        {
            return Err(DomainError::validation(format!(
                "time limit must be between {MIN_TIME_LIMIT_SECONDS} and {MAX_TIME_LIMIT_SECONDS} seconds"
            )));
        }
        Ok(())
    }

    /// Parses settings from JSON, or YAML when the extension says so.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read settings file {:?}", path))?;
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        let settings: GameSettings = if is_yaml {
            serde_yaml::from_str(&text).map_err(DomainError::from)?
        } else {
            serde_json::from_str(&text).map_err(DomainError::from)?
        };
        settings.validate()?;
        Ok(settings)
    }
}
