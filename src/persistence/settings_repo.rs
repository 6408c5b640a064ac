//! Settings singleton persistence.

use std::sync::Arc;

use crate::models::settings::Settings;
use crate::Result;

use super::kv::{get_json, put_json, KeyValueStore};

/// Store key of the settings singleton.
pub const SETTINGS_KEY: &str = "settings";

/// Reads and replaces the settings singleton, falling back to configured
/// defaults while nothing has been stored.
#[derive(Clone)]
pub struct SettingsRepo {
    store: Arc<dyn KeyValueStore>,
    defaults: Settings,
}

impl SettingsRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, defaults: Settings) -> Self {
        Self { store, defaults }
    }

    /// Current settings snapshot; never cached.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the read fails or the record is malformed.
    pub async fn load(&self) -> Result<Settings> {
        Ok(get_json(self.store.as_ref(), SETTINGS_KEY)
            .await?
            .unwrap_or_else(|| self.defaults.clone()))
    }

    /// Replace the stored settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        put_json(self.store.as_ref(), SETTINGS_KEY, settings, None).await
    }
}
