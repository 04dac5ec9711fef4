use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

pub const DEFAULT_INTERVAL_MINUTES: f64 = 1.0;

/// The persisted scheduler state. Nothing else survives a restart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_interval")]
    pub interval_minutes: f64,
    #[serde(default = "default_running")]
    pub running: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            interval_minutes: default_interval(),
            running: default_running(),
        }
    }
}

impl TimerSettings {
    pub fn new(interval_minutes: f64, running: bool) -> Self {
        Self {
            version: default_version(),
            interval_minutes,
            running,
        }
    }

    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        if crate::commands::validate_minutes(self.interval_minutes).is_err() {
            self.interval_minutes = default_interval();
        }
        self
    }
}

fn default_version() -> u32 {
    1
}

fn default_interval() -> f64 {
    DEFAULT_INTERVAL_MINUTES
}

fn default_running() -> bool {
    true
}

/// Where the scheduler keeps `{intervalMinutes, running}`.
pub trait StateStore {
    /// Missing or unreadable state yields the defaults.
    fn load(&self) -> TimerSettings;
    fn save(&self, settings: &TimerSettings) -> Result<(), SettingsError>;
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        Self::new(resolve_settings_path(|k| std::env::var_os(k).map(PathBuf::from)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn resolve_settings_path<F>(mut get_env: F) -> PathBuf
where
    F: FnMut(&str) -> Option<PathBuf>,
{
    if let Some(explicit) = get_env("BREAKTIME_SETTINGS_PATH") {
        return explicit;
    }

    let base = get_env("XDG_CONFIG_HOME")
        .or_else(|| get_env("HOME").map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("breaktime").join("settings.json")
}

impl StateStore for SettingsStore {
    fn load(&self) -> TimerSettings {
        let Ok(bytes) = fs::read(&self.path) else {
            return TimerSettings::default();
        };
        match serde_json::from_slice::<TimerSettings>(&bytes) {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "unreadable settings, using defaults");
                TimerSettings::default()
            }
        }
    }

    fn save(&self, settings: &TimerSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}
