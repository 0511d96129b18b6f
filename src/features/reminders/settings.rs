//! # Settings Store
//!
//! User notification preferences, loaded once at startup and mutated through
//! `update`. Every read returns the latest committed value.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Lead minutes clamped on load and update
//! - 1.0.0: Initial release with JSON-in-key-value persistence

use anyhow::{anyhow, Context, Result};
use dashmap::DashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use super::occurrence::MAX_LEAD_MINUTES;

/// Storage key for the serialized settings
pub const SETTINGS_KEY: &str = "notification_settings";

/// Minimal persistence contract (local-storage equivalent)
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store for tests and hosts without a database
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    /// Master switch; when off nothing is shown, played or vibrated
    pub enabled: bool,
    pub sound: bool,
    pub vibration: bool,
    /// Minutes before the nominal time of day to notify
    pub lead_minutes: u32,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            enabled: true,
            sound: true,
            vibration: true,
            lead_minutes: 0,
        }
    }
}

impl NotificationSettings {
    fn normalized(mut self) -> Self {
        self.lead_minutes = self.lead_minutes.min(MAX_LEAD_MINUTES);
        self
    }

    /// Set one field from its name and a string value (host `set` command)
    pub fn apply_field(&mut self, field: &str, value: &str) -> Result<()> {
        let flag = || -> Result<bool> {
            match value.trim().to_lowercase().as_str() {
                "on" | "true" | "yes" | "1" => Ok(true),
                "off" | "false" | "no" | "0" => Ok(false),
                other => Err(anyhow!("Expected on/off, got {other:?}")),
            }
        };

        match field {
            "enabled" => self.enabled = flag()?,
            "sound" => self.sound = flag()?,
            "vibration" => self.vibration = flag()?,
            "lead" | "lead_minutes" | "leadMinutes" => {
                self.lead_minutes = value
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid lead minutes: {value:?}"))?;
            }
            _ => return Err(anyhow!("Unknown setting: {field}")),
        }
        Ok(())
    }
}

pub struct SettingsStore {
    backend: Arc<dyn KeyValueStore>,
    current: RwLock<NotificationSettings>,
}

impl SettingsStore {
    /// Load persisted settings, falling back to defaults when absent or unreadable
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Self {
        let settings = match backend.get(SETTINGS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<NotificationSettings>(&raw) {
                Ok(settings) => settings.normalized(),
                Err(e) => {
                    warn!("Stored notification settings are unreadable, using defaults: {e}");
                    NotificationSettings::default()
                }
            },
            Ok(None) => NotificationSettings::default(),
            Err(e) => {
                warn!("Failed to load notification settings, using defaults: {e}");
                NotificationSettings::default()
            }
        };

        debug!("Loaded notification settings: {settings:?}");
        SettingsStore {
            backend,
            current: RwLock::new(settings),
        }
    }

    /// Snapshot of the latest committed settings
    pub fn get(&self) -> NotificationSettings {
        match self.current.read() {
            Ok(settings) => settings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the settings.
    ///
    /// The new value is committed in memory before persisting, so a storage
    /// failure is reported but the running engine still observes the change.
    pub fn set(&self, settings: NotificationSettings) -> Result<()> {
        let settings = settings.normalized();
        match self.current.write() {
            Ok(mut current) => *current = settings.clone(),
            Err(poisoned) => *poisoned.into_inner() = settings.clone(),
        }

        let raw = serde_json::to_string(&settings)?;
        self.backend
            .set(SETTINGS_KEY, &raw)
            .context("Failed to persist notification settings")
    }

    /// Read-modify-write helper
    pub fn update<F>(&self, f: F) -> Result<NotificationSettings>
    where
        F: FnOnce(&mut NotificationSettings),
    {
        let mut settings = self.get();
        f(&mut settings);
        self.set(settings.clone())?;
        Ok(self.get())
    }
}
