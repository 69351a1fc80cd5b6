//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Timer defaults
//! - Daypart nudges and quiet hours
//! - Calendar time zone and first weekday
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::clock::Calendar;
use crate::error::ConfigError;
use crate::model::DEFAULT_HABIT_DURATION_SECS;

/// Timer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Duration for new habits when none is given.
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u32,
    /// Interval of the background tick loop.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Daypart nudges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub morning: bool,
    #[serde(default = "default_true")]
    pub midday: bool,
    #[serde(default = "default_true")]
    pub afternoon: bool,
    #[serde(default = "default_true")]
    pub evening: bool,
    /// First quiet hour (inclusive).
    #[serde(default = "default_quiet_start")]
    pub quiet_start_hour: u32,
    /// Last quiet hour (exclusive). Smaller than the start when the range wraps midnight.
    #[serde(default = "default_quiet_end")]
    pub quiet_end_hour: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Saturday,
    Sunday,
}

impl From<WeekStart> for Weekday {
    fn from(value: WeekStart) -> Self {
        match value {
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Saturday => Weekday::Sat,
            WeekStart::Sunday => Weekday::Sun,
        }
    }
}

/// Calendar configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CalendarConfig {
    #[serde(default)]
    pub week_start: WeekStart,
    /// IANA zone name, e.g. `Europe/Berlin`. `None` uses the machine's zone.
    #[serde(default)]
    pub time_zone: Option<String>,
    /// Fixed offset east of UTC. Overrides `time_zone` when set.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

fn default_duration_secs() -> u32 {
    DEFAULT_HABIT_DURATION_SECS
}
fn default_tick_interval_ms() -> u64 {
    1_000
}
fn default_true() -> bool {
    true
}
fn default_quiet_start() -> u32 {
    22
}
fn default_quiet_end() -> u32 {
    7
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: default_duration_secs(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            morning: true,
            midday: true,
            afternoon: true,
            evening: true,
            quiet_start_hour: default_quiet_start(),
            quiet_end_hour: default_quiet_end(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue { key: key.to_string(), message };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                // `null` clears optional fields; required ones reject it on deserialize.
                let new_value = match existing {
                    _ if value == "null" => serde_json::Value::Null,
                    serde_json::Value::Bool(_) => {
                        serde_json::Value::Bool(value.parse::<bool>().map_err(|e| invalid(e.to_string()))?)
                    }
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as integer")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    serde_json::Value::Null => {
                        serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.into()))
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from `<data_dir>/config.toml`, writing the defaults when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
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

    /// Persist to `<data_dir>/config.toml`.
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

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue { key: key.to_string(), message };

        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Range checks serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };
        if self.timer.default_duration_secs == 0 {
            return invalid("timer.default_duration_secs", "must be at least 1");
        }
        if self.timer.tick_interval_ms == 0 {
            return invalid("timer.tick_interval_ms", "must be at least 1");
        }
        if self.notifications.quiet_start_hour > 23 {
            return invalid("notifications.quiet_start_hour", "must be 0-23");
        }
        if self.notifications.quiet_end_hour > 23 {
            return invalid("notifications.quiet_end_hour", "must be 0-23");
        }
        if let Some(offset) = self.calendar.utc_offset_minutes {
            if !(-14 * 60..=14 * 60).contains(&offset) {
                return invalid("calendar.utc_offset_minutes", "must be within ±14 hours");
            }
        }
        if let Some(name) = &self.calendar.time_zone {
            if Calendar::named(name).is_none() {
                return invalid("calendar.time_zone", "unknown IANA time zone");
            }
        }
        Ok(())
    }

    /// Calendar described by the `calendar` section.
    pub fn calendar(&self) -> Calendar {
        let base = match (self.calendar.utc_offset_minutes, &self.calendar.time_zone) {
            (Some(minutes), _) => Calendar::with_offset_minutes(minutes),
            (None, Some(name)) => Calendar::named(name).unwrap_or_else(Calendar::local),
            (None, None) => Calendar::local(),
        };
        base.with_week_start(self.calendar.week_start.into())
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timer.tick_interval_ms)
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("using default config: {e}");
            Self::default()
        })
    }
}
