//! TOML-based configuration.
//!
//! Stores the tuning knobs of the progression rules:
//! - Level curve
//! - Reward amounts and the free-crate interval
//! - Weekly token allowance
//! - Anti-cheat mode for reopening days
//! - Static perk flags and the schedule file used by the CLI
//!
//! Configuration is stored at `~/.config/dailyquest/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::perks::Perks;
use crate::progression::LevelCurve;

/// Level curve configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default = "default_exp_base")]
    pub exp_base: u64,
    #[serde(default = "default_exp_step")]
    pub exp_step: u64,
}

/// Reward amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardsConfig {
    #[serde(default = "default_daily_clear_exp")]
    pub daily_clear_exp: u64,
    #[serde(default = "default_partial_exp")]
    pub partial_exp: u64,
    #[serde(default = "default_penalty_clear_exp")]
    pub penalty_clear_exp: u64,
    #[serde(default = "default_boss_exp")]
    pub boss_exp: u64,
    /// Consolation experience for a duplicate badge.
    #[serde(default = "default_duplicate_exp")]
    pub duplicate_exp: u64,
    #[serde(default = "default_free_crate_hours")]
    pub free_crate_hours: u32,
}

/// Streak token configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityConfig {
    /// Weekly allowance before perk bonuses.
    #[serde(default = "default_base_tokens")]
    pub base_tokens: u32,
}

/// Day journal configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Require a written reason to reopen a closed day.
    #[serde(default)]
    pub anti_cheat: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// JSON array of schedule rows read by the CLI.
    #[serde(default)]
    pub schedule_path: Option<String>,
    #[serde(default)]
    pub progression: ProgressionConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub continuity: ContinuityConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub perks: Perks,
}

fn default_exp_base() -> u64 {
    120
}
fn default_exp_step() -> u64 {
    40
}
fn default_daily_clear_exp() -> u64 {
    50
}
fn default_partial_exp() -> u64 {
    15
}
fn default_penalty_clear_exp() -> u64 {
    150
}
fn default_boss_exp() -> u64 {
    400
}
fn default_duplicate_exp() -> u64 {
    25
}
fn default_free_crate_hours() -> u32 {
    24
}
fn default_base_tokens() -> u32 {
    1
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            exp_base: default_exp_base(),
            exp_step: default_exp_step(),
        }
    }
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            daily_clear_exp: default_daily_clear_exp(),
            partial_exp: default_partial_exp(),
            penalty_clear_exp: default_penalty_clear_exp(),
            boss_exp: default_boss_exp(),
            duplicate_exp: default_duplicate_exp(),
            free_crate_hours: default_free_crate_hours(),
        }
    }
}

impl Default for ContinuityConfig {
    fn default() -> Self {
        Self {
            base_tokens: default_base_tokens(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule_path: None,
            progression: ProgressionConfig::default(),
            rewards: RewardsConfig::default(),
            continuity: ContinuityConfig::default(),
            journal: JournalConfig::default(),
            perks: Perks::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location, `<data_dir>/config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from the default location, writing defaults when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there when the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Flattened `key = value` pairs, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out.sort();
        out
    }

    pub fn level_curve(&self) -> LevelCurve {
        LevelCurve {
            base: self.progression.exp_base,
            step: self.progression.exp_step,
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
