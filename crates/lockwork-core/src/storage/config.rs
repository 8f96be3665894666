//! TOML-based application settings.
//!
//! One logical row of configuration: block durations, the three feature
//! flags, and the controller policy knobs. Stored at
//! `~/.config/lockwork/settings.toml`; first access writes the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::timer::BlockType;

/// Application settings.
///
/// Serialized to/from TOML at `~/.config/lockwork/settings.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub haptics_enabled: bool,
    #[serde(default = "default_true")]
    pub display_sync_enabled: bool,
    /// Whether completing a block immediately starts the next one, or
    /// leaves it idle awaiting user action.
    #[serde(default = "default_true")]
    pub auto_continue: bool,
    /// Minimum interval between pushes to the external display.
    #[serde(default = "default_publish_interval")]
    pub publish_min_interval_secs: u64,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_true() -> bool {
    true
}
fn default_publish_interval() -> u64 {
    2
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            break_minutes: default_break_minutes(),
            sound_enabled: true,
            haptics_enabled: true,
            display_sync_enabled: true,
            auto_continue: true,
            publish_min_interval_secs: default_publish_interval(),
        }
    }
}

impl Settings {
    /// Configured duration of a block, in minutes.
    pub fn minutes_for(&self, block_type: BlockType) -> u32 {
        match block_type {
            BlockType::Focus => self.focus_minutes,
            BlockType::Break => self.break_minutes,
        }
    }

    pub fn secs_for(&self, block_type: BlockType) -> u64 {
        u64::from(self.minutes_for(block_type)) * 60
    }

    /// Durations must be positive; everything else is unconstrained.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.focus_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "focus_minutes".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.break_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "break_minutes".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?
            .join("settings.toml"))
    }

    /// Load from disk, writing and returning the defaults if no file
    /// exists yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let settings: Settings =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                settings.validate().map_err(|e| ConfigError::InvalidValue {
                    key: "durations".into(),
                    message: e.to_string(),
                })?;
                Ok(settings)
            }
            Err(_) => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get a settings value as a string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a settings value by key, parsing `value` against the field's
    /// current type. Does not persist; call [`Settings::save`] after.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ConfigError::ParseFailed("settings are not a table".into()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => {
                let b = value.parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as bool"),
                })?;
                serde_json::Value::Bool(b)
            }
            serde_json::Value::Number(_) => {
                let n = value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as number"),
                })?;
                serde_json::Value::Number(n.into())
            }
            _ => serde_json::Value::String(value.to_string()),
        };
        obj.insert(key.to_string(), new_value);

        let updated: Settings =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }
}
