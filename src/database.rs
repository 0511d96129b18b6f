//! # Database
//!
//! SQLite key-value persistence for process-wide preferences.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use sqlite::{ConnectionWithFullMutex, State};
use std::sync::{Arc, Mutex};

use crate::features::reminders::settings::KeyValueStore;

/// Shared handle to the settings database
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<ConnectionWithFullMutex>>,
}

impl Database {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// Pass `":memory:"` for a throwaway database.
    pub fn new(path: &str) -> Result<Self> {
        let connection = sqlite::Connection::open_with_full_mutex(path)
            .with_context(|| format!("Failed to open database at {path}"))?;
        let database = Database {
            connection: Arc::new(Mutex::new(connection)),
        };
        database.migrate()?;
        info!("Opened settings database at {path}");
        Ok(database)
    }

    fn migrate(&self) -> Result<()> {
        let connection = self.lock()?;
        connection.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ConnectionWithFullMutex>> {
        self.connection
            .lock()
            .map_err(|_| anyhow!("Database connection mutex poisoned"))
    }

    /// Read a setting value by key
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let connection = self.lock()?;
        let mut statement = connection.prepare("SELECT value FROM settings WHERE key = ?")?;
        statement.bind((1, key))?;

        if let State::Row = statement.next()? {
            let value = statement.read::<String, _>("value")?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Insert or replace a setting value
    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        let connection = self.lock()?;
        let mut statement = connection
            .prepare("INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, ?)")?;
        statement.bind((1, key))?;
        statement.bind((2, value))?;
        statement.bind((3, updated_at.as_str()))?;
        while statement.next()? != State::Done {}

        debug!("Persisted setting {key}");
        Ok(())
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_setting(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_setting(key, value)
    }
}
