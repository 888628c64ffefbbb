mod config;
pub mod database;

pub use config::{BlockerConfig, Config, RewardsConfig, TimerConfig};
pub use database::{Database, Stats};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/focusdeck[-dev]/` based on FOCUSDECK_ENV.
///
/// Set FOCUSDECK_ENV=dev to use the development data directory, or
/// FOCUSDECK_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSDECK_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSDECK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusdeck-dev")
            } else {
                base_dir.join("focusdeck")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
