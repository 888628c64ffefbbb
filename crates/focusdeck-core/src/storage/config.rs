//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Work phase length and whether phases auto-advance
//! - Reward amounts
//! - Focus blocker settings
//!
//! Configuration is stored at `~/.config/focusdeck/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::blocker::default_blocked_sites;
use crate::error::ConfigError;
use crate::progress::BADGE_BONUS_POINTS;
use crate::rewards::POMODORO_POINTS;
use crate::timer::{clamp_custom_duration, WORK_SECS};

/// Timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: i64,
    #[serde(default)]
    pub work_seconds: i64,
    /// Start the next phase right away after an automatic transition.
    #[serde(default)]
    pub auto_advance: bool,
}

/// Reward configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    #[serde(default = "default_pomodoro_points")]
    pub pomodoro_points: i64,
    #[serde(default = "default_badge_bonus_points")]
    pub badge_bonus_points: i64,
}

/// Focus blocker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_blocked_sites")]
    pub blocked_sites: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusdeck/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub blocker: BlockerConfig,
}

// Default functions
fn default_work_minutes() -> i64 {
    (WORK_SECS / 60) as i64
}
fn default_pomodoro_points() -> i64 {
    POMODORO_POINTS
}
fn default_badge_bonus_points() -> i64 {
    BADGE_BONUS_POINTS
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            work_seconds: 0,
            auto_advance: false,
        }
    }
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            pomodoro_points: POMODORO_POINTS,
            badge_bonus_points: BADGE_BONUS_POINTS,
        }
    }
}

impl Default for BlockerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blocked_sites: default_blocked_sites(),
        }
    }
}

impl TimerConfig {
    /// Configured work length after clamping. Zero falls back to the default.
    pub fn work_secs(&self) -> u32 {
        match clamp_custom_duration(self.work_minutes, self.work_seconds) {
            0 => WORK_SECS,
            secs => secs,
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
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => serde_json::Value::Number(
                    value
                        .parse::<i64>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?
                        .into(),
                ),
                serde_json::Value::Array(_) => {
                    let items: Vec<String> = if value.trim_start().starts_with('[') {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    } else {
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect()
                    };
                    serde_json::to_value(items).map_err(|e| invalid(e.to_string()))?
                }
                serde_json::Value::Object(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from a specific file, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default config");
            Self::default()
        })
    }
}
