//! App settings and account maintenance

use app_state::SessionStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{keys, KeyValueStore, KeyValueStoreExt};
use tokio::sync::watch;

use crate::library::{AdviceLibrary, Result};

/// User-facing toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Push notifications enabled
    pub notifications: bool,
    /// Record generated advice in history
    pub save_history: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self { notifications: true, save_history: true }
    }
}

/// Persisted settings, stored under [`keys::SETTINGS`]
pub struct SettingsStore {
    kv: Arc<dyn KeyValueStore>,
    tx: watch::Sender<AppSettings>,
}

impl SettingsStore {
    /// Create a store holding the defaults
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        let (tx, _) = watch::channel(AppSettings::default());
        Self { kv, tx }
    }

    /// Restore persisted settings; faults keep the defaults
    pub fn load(&self) {
        match self.kv.get::<AppSettings>(keys::SETTINGS) {
            Ok(Some(settings)) => {
                self.tx.send_replace(settings);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to load settings"),
        }
    }

    /// Current settings
    pub fn get(&self) -> AppSettings {
        *self.tx.borrow()
    }

    /// Receive settings on every change
    pub fn subscribe(&self) -> watch::Receiver<AppSettings> {
        self.tx.subscribe()
    }

    /// Replace all settings; returns whether they were persisted
    ///
    /// The new value takes effect for this run either way.
    pub fn update(&self, settings: AppSettings) -> bool {
        let persisted = match self.kv.set(keys::SETTINGS, &settings) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save settings");
                false
            }
        };
        self.tx.send_replace(settings);
        persisted
    }

    /// Enable or disable notifications
    pub fn set_notifications(&self, enabled: bool) -> bool {
        self.update(AppSettings { notifications: enabled, ..self.get() })
    }

    /// Enable or disable history recording
    pub fn set_save_history(&self, enabled: bool) -> bool {
        self.update(AppSettings { save_history: enabled, ..self.get() })
    }
}

/// Clear the signed-in user's history
///
/// Returns `false` when nobody is signed in.
pub fn clear_history(session: &SessionStore, library: &AdviceLibrary) -> Result<bool> {
    let Some(user) = session.current_user() else {
        return Ok(false);
    };
    library.clear_history(&user.id)?;
    Ok(true)
}

/// Remove the signed-in user's stored data and sign out
///
/// Returns `false` when nobody is signed in or the sign-out could not be
/// persisted; in the latter case the lists are already gone and the user
/// stays signed in.
pub async fn delete_account(session: &SessionStore, library: &AdviceLibrary) -> Result<bool> {
    let Some(user) = session.current_user() else {
        return Ok(false);
    };

    let removed = library.remove_account(&user.id)?;
    if !session.logout().await {
        tracing::warn!(user_id = %user.id, removed, "account data removed but sign-out failed");
        return Ok(false);
    }
    tracing::info!(user_id = %user.id, removed, "account deleted");
    Ok(true)
}
