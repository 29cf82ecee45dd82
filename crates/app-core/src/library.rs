//! Advice history and saved favorites
//!
//! Both lists are kept per account under `account:<id>:history` and
//! `account:<id>:saved`, newest first.

use advice_client::AnswerSet;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{AccountStore, KeyValueStore, KvError};
use thiserror::Error;

use crate::plans::PlanLimits;

const HISTORY: &str = "history";
const SAVED: &str = "saved";

/// Library error types
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] KvError),

    /// Plan's saved-item cap reached
    #[error("Saved advice limit of {limit} reached")]
    SavedLimitReached {
        /// Cap for the user's plan
        limit: usize,
    },
}

/// Result type for library operations
pub type Result<T> = std::result::Result<T, LibraryError>;

/// One piece of generated advice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceRecord {
    /// Record id
    pub id: String,
    /// When the advice was generated
    pub created_at: DateTime<Utc>,
    /// Situation the user described
    pub situation: String,
    /// Questionnaire answers; older records without them load as placeholders
    #[serde(default = "AnswerSet::placeholder")]
    pub answers: AnswerSet,
    /// Advice text
    pub advice: String,
}

impl AdviceRecord {
    /// New record stamped now
    pub fn new(situation: impl Into<String>, answers: AnswerSet, advice: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            situation: situation.into(),
            answers,
            advice: advice.into(),
        }
    }

    /// Date label for list rows, e.g. `2024-05-01`
    pub fn date_label(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }
}

/// Per-account advice lists
#[derive(Clone)]
pub struct AdviceLibrary {
    accounts: AccountStore,
    write_lock: Arc<Mutex<()>>,
}

impl AdviceLibrary {
    /// Create a library over `kv`
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            accounts: AccountStore::new(kv),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// History, newest first
    pub fn history(&self, account_id: &str) -> Result<Vec<AdviceRecord>> {
        self.load(account_id, HISTORY)
    }

    /// Add `record` to the front of the history
    pub fn record(&self, account_id: &str, record: AdviceRecord) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut history = self.load(account_id, HISTORY)?;
        history.insert(0, record);
        self.accounts.set(account_id, HISTORY, &history)?;
        tracing::debug!(account_id, entries = history.len(), "history recorded");
        Ok(())
    }

    /// Remove a history entry; returns whether it existed
    pub fn remove_history(&self, account_id: &str, record_id: &str) -> Result<bool> {
        self.remove_from(account_id, HISTORY, record_id)
    }

    /// Drop the whole history
    pub fn clear_history(&self, account_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.accounts.remove(account_id, HISTORY)?;
        tracing::info!(account_id, "history cleared");
        Ok(())
    }

    /// Saved advice, newest first
    pub fn saved(&self, account_id: &str) -> Result<Vec<AdviceRecord>> {
        self.load(account_id, SAVED)
    }

    /// Save `record`, honouring `limits`
    ///
    /// Returns `false` if it was already saved.
    pub fn save(&self, account_id: &str, record: &AdviceRecord, limits: PlanLimits) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let mut saved = self.load(account_id, SAVED)?;

        if saved.iter().any(|r| r.id == record.id) {
            return Ok(false);
        }
        if !limits.allows_saving(saved.len()) {
            return Err(LibraryError::SavedLimitReached {
                limit: limits.max_saved.unwrap_or(saved.len()),
            });
        }

        saved.insert(0, record.clone());
        self.accounts.set(account_id, SAVED, &saved)?;
        Ok(true)
    }

    /// Remove a saved entry; returns whether it existed
    pub fn unsave(&self, account_id: &str, record_id: &str) -> Result<bool> {
        self.remove_from(account_id, SAVED, record_id)
    }

    /// Whether `record_id` is saved
    pub fn is_saved(&self, account_id: &str, record_id: &str) -> Result<bool> {
        Ok(self.saved(account_id)?.iter().any(|r| r.id == record_id))
    }

    /// Find a record in either list
    pub fn find(&self, account_id: &str, record_id: &str) -> Result<Option<AdviceRecord>> {
        let found = self
            .history(account_id)?
            .into_iter()
            .chain(self.saved(account_id)?)
            .find(|r| r.id == record_id);
        Ok(found)
    }

    /// Delete every list stored for the account
    pub fn remove_account(&self, account_id: &str) -> Result<usize> {
        let _guard = self.write_lock.lock();
        Ok(self.accounts.remove_account(account_id)?)
    }

    fn load(&self, account_id: &str, list: &str) -> Result<Vec<AdviceRecord>> {
        Ok(self.accounts.get(account_id, list)?.unwrap_or_default())
    }

    fn remove_from(&self, account_id: &str, list: &str, record_id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let mut records = self.load(account_id, list)?;
        let before = records.len();
        records.retain(|r| r.id != record_id);

        if records.len() == before {
            return Ok(false);
        }
        self.accounts.set(account_id, list, &records)?;
        Ok(true)
    }
}
