//! TOML-based application configuration.
//!
//! Stores the settings the scheduler core reads:
//! - Automatic on/off times and whether they are enabled
//! - Whether the schedule follows sunset/sunrise (location mode)
//! - Foreground app monitoring ("secure suspend") settings
//! - Log level
//!
//! Configuration is stored at `~/.config/redmoon/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::alarm::{Direction, TimeOfDay};
use crate::error::{ConfigError, CoreError, Result};

/// Automatic on/off schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Master switch for the two daily alarms.
    #[serde(default)]
    pub time_toggle: bool,
    /// Fade at sunset/sunrise instead of switching instantly.
    #[serde(default)]
    pub use_location: bool,
    #[serde(default = "default_turn_on_time")]
    pub turn_on_time: TimeOfDay,
    #[serde(default = "default_turn_off_time")]
    pub turn_off_time: TimeOfDay,
}

/// Foreground app monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Suspend the filter over installers and superuser prompts.
    #[serde(default)]
    pub secure_suspend: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Identifiers added to the built-in suspend set.
    #[serde(default)]
    pub extra_suspend_apps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/redmoon/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_turn_on_time() -> TimeOfDay {
    TimeOfDay::new(22, 0).unwrap_or(TimeOfDay::MIDNIGHT)
}
fn default_turn_off_time() -> TimeOfDay {
    TimeOfDay::new(6, 0).unwrap_or(TimeOfDay::MIDNIGHT)
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            time_toggle: false,
            use_location: false,
            turn_on_time: default_turn_on_time(),
            turn_off_time: default_turn_off_time(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            secure_suspend: false,
            poll_interval_ms: default_poll_interval_ms(),
            extra_suspend_apps: Vec::new(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ScheduleConfig {
    /// Configured time for one of the two alarms.
    pub fn time_for(&self, direction: Direction) -> TimeOfDay {
        match direction {
            Direction::On => self.turn_on_time,
            Direction::Off => self.turn_off_time,
        }
    }
}

impl Config {
    fn value_at<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        key.split('.').try_fold(root, |node, part| node.get(part))
    }

    /// Replaces the leaf at `key`, coercing `value` to the type already
    /// stored there.
    fn replace_at(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut parent = root;
        if let Some(path) = parent_path {
            for part in path.split('.') {
                parent = parent.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = parent.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value
                    .parse::<u64>()
                    .map_err(|e| invalid(e.to_string()))?
                    .into(),
            ),
            serde_json::Value::Array(_) => {
                let items = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| serde_json::Value::String(s.to_string()))
                    .collect();
                serde_json::Value::Array(items)
            }
            serde_json::Value::Object(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Parse the config at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| {
            CoreError::from(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        })
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match Self::value_at(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field (including malformed `HH:MM` times).
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::replace_at(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}
