//! Key-value store for the session, preferences and advice lists
//!
//! Values are stored as JSON. The [`KeyValueStore`] trait is the seam the
//! stores depend on; [`KvStore`] is the sled-backed implementation used on
//! device, and tests substitute their own implementations to simulate
//! storage faults.

use serde::{de::DeserializeOwned, Serialize};
use sled::Db;
use std::sync::Arc;
use thiserror::Error;

/// Well-known top-level keys
pub mod keys {
    /// Serialized signed-in user
    pub const USER: &str = "user";
    /// Theme preference (`light`, `dark` or `system`)
    pub const THEME_MODE: &str = "themeMode";
    /// App settings toggles
    pub const SETTINGS: &str = "settings";
}

/// Key-value store error types
#[derive(Debug, Error)]
pub enum KvError {
    /// Sled database error
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Backend could not be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for key-value operations
pub type Result<T> = std::result::Result<T, KvError>;

/// Raw byte-level access to a key-value backend
///
/// Implementations must be safe to share between the stores; typed access
/// goes through [`KeyValueStoreExt`].
pub trait KeyValueStore: Send + Sync {
    /// Read the raw bytes stored under `key`
    fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store raw bytes under `key`, replacing any previous value
    fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Remove `key`, returning whether it existed
    fn remove(&self, key: &str) -> Result<bool>;

    /// List every key starting with `prefix`
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Typed JSON helpers available on every [`KeyValueStore`]
pub trait KeyValueStoreExt: KeyValueStore {
    /// Get a value by key
    fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.get_bytes(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value by key
    fn set<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec(value)?;
        self.set_bytes(key, bytes)
    }

    /// Check if a key exists
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get_bytes(key)?.is_some())
    }

    /// Get a value by scoped key (e.g., `["account", "user-123", "history"]`)
    fn get_scoped<T>(&self, scopes: &[&str]) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.get(&scoped_key(scopes)?)
    }

    /// Set a value by scoped key
    fn set_scoped<T>(&self, scopes: &[&str], value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.set(&scoped_key(scopes)?, value)
    }

    /// Remove a value by scoped key
    fn remove_scoped(&self, scopes: &[&str]) -> Result<bool> {
        self.remove(&scoped_key(scopes)?)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

const SEPARATOR: &str = ":";

fn scoped_key(scopes: &[&str]) -> Result<String> {
    if scopes.is_empty() {
        return Err(KvError::InvalidKey("empty scope".to_string()));
    }
    if let Some(bad) = scopes.iter().find(|s| s.is_empty() || s.contains(SEPARATOR)) {
        return Err(KvError::InvalidKey(format!("bad scope segment: {:?}", bad)));
    }
    Ok(scopes.join(SEPARATOR))
}

/// Key-value store configuration
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// Database path
    pub path: String,
    /// Cache capacity in bytes
    pub cache_capacity: u64,
    /// Enable compression
    pub use_compression: bool,
    /// Flush interval in milliseconds (None for immediate flush)
    pub flush_every_ms: Option<u64>,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            path: "social_confidence.db".to_string(),
            cache_capacity: 8 * 1024 * 1024, // 8MB
            use_compression: true,
            flush_every_ms: Some(500),
        }
    }
}

impl KvConfig {
    /// Create a new configuration with a custom path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set cache capacity in bytes
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Enable or disable compression
    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }

    /// Set flush interval in milliseconds
    pub fn flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.flush_every_ms = ms;
        self
    }
}

/// Sled-backed key-value store
#[derive(Clone)]
pub struct KvStore {
    db: Arc<Db>,
}

impl KvStore {
    /// Open (or create) a store with configuration
    pub fn new(config: KvConfig) -> Result<Self> {
        let mut db_config = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .use_compression(config.use_compression);

        if let Some(ms) = config.flush_every_ms {
            db_config = db_config.flush_every_ms(Some(ms));
        }

        let db = db_config.open()?;
        tracing::debug!(path = %config.path, "opened key-value store");

        Ok(Self { db: Arc::new(db) })
    }

    /// Create an in-memory key-value store (for testing)
    pub fn in_memory() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl KeyValueStore for KvStore {
    fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.db.insert(key.as_bytes(), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.db.remove(key.as_bytes())?.is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for item in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item?;
            if let Ok(key_str) = String::from_utf8(key.to_vec()) {
                keys.push(key_str);
            }
        }

        Ok(keys)
    }
}

/// Scoped view for per-account data (`account:{id}:{key}`)
#[derive(Clone)]
pub struct AccountStore {
    kv: Arc<dyn KeyValueStore>,
}

impl AccountStore {
    /// Create a new account store
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Get an account-level value
    pub fn get<T>(&self, account_id: &str, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.kv.get_scoped(&["account", account_id, key])
    }

    /// Set an account-level value
    pub fn set<T>(&self, account_id: &str, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.kv.set_scoped(&["account", account_id, key], value)
    }

    /// Remove an account-level value
    pub fn remove(&self, account_id: &str, key: &str) -> Result<bool> {
        self.kv.remove_scoped(&["account", account_id, key])
    }

    /// Remove all data for an account
    pub fn remove_account(&self, account_id: &str) -> Result<usize> {
        let prefix = format!("account:{}:", account_id);
        let keys = self.kv.keys_with_prefix(&prefix)?;
        let mut count = 0;
        for key in keys {
            if self.kv.remove(&key)? {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        count: i32,
    }

    #[test]
    fn test_kv_store_creation() {
        let kv = KvStore::in_memory().unwrap();
        assert!(kv.keys_with_prefix("").unwrap().is_empty());
    }

    #[test]
    fn test_set_and_get_struct() {
        let kv = KvStore::in_memory().unwrap();

        let data = TestData { name: "Alice".to_string(), count: 42 };
        kv.set("user", &data).unwrap();

        let retrieved: Option<TestData> = kv.get("user").unwrap();
        assert_eq!(retrieved, Some(data));
    }

    #[test]
    fn test_get_nonexistent() {
        let kv = KvStore::in_memory().unwrap();
        let value: Option<String> = kv.get("nonexistent").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_remove() {
        let kv = KvStore::in_memory().unwrap();

        kv.set(keys::THEME_MODE, "dark").unwrap();
        assert!(kv.contains(keys::THEME_MODE).unwrap());

        assert!(kv.remove(keys::THEME_MODE).unwrap());
        assert!(!kv.contains(keys::THEME_MODE).unwrap());
        assert!(!kv.remove(keys::THEME_MODE).unwrap());
    }

    #[test]
    fn test_string_values_are_json_encoded() {
        let kv = KvStore::in_memory().unwrap();
        kv.set(keys::THEME_MODE, "system").unwrap();

        let raw = kv.get_bytes(keys::THEME_MODE).unwrap().unwrap();
        assert_eq!(raw, b"\"system\"".to_vec());
    }

    #[test]
    fn test_corrupt_value_is_serialization_error() {
        let kv = KvStore::in_memory().unwrap();
        kv.set_bytes(keys::USER, b"{not json".to_vec()).unwrap();

        let result: Result<Option<TestData>> = kv.get(keys::USER);
        assert!(matches!(result, Err(KvError::Serialization(_))));
    }

    #[test]
    fn test_scoped_operations() {
        let kv = KvStore::in_memory().unwrap();

        kv.set_scoped(&["account", "user-1", "history"], &vec![1, 2, 3])
            .unwrap();

        let history: Option<Vec<i32>> = kv.get_scoped(&["account", "user-1", "history"]).unwrap();
        assert_eq!(history, Some(vec![1, 2, 3]));
        assert!(kv.contains("account:user-1:history").unwrap());
    }

    #[test]
    fn test_scoped_key_rejects_separator() {
        let kv = KvStore::in_memory().unwrap();
        let result = kv.set_scoped(&["account", "evil:id", "history"], &1);
        assert!(matches!(result, Err(KvError::InvalidKey(_))));

        let result = kv.set_scoped(&[], &1);
        assert!(matches!(result, Err(KvError::InvalidKey(_))));
    }

    #[test]
    fn test_keys_with_prefix() {
        let kv = KvStore::in_memory().unwrap();

        kv.set("account:a:history", &1).unwrap();
        kv.set("account:a:saved", &2).unwrap();
        kv.set("user", &3).unwrap();

        let keys = kv.keys_with_prefix("account:").unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"account:a:history".to_string()));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kv").to_string_lossy().to_string();

        {
            let kv = KvStore::new(KvConfig::new(&path).flush_every_ms(None)).unwrap();
            kv.set(keys::THEME_MODE, "light").unwrap();
            kv.flush().unwrap();
        }

        let kv = KvStore::new(KvConfig::new(&path)).unwrap();
        let mode: Option<String> = kv.get(keys::THEME_MODE).unwrap();
        assert_eq!(mode.as_deref(), Some("light"));
    }

    #[test]
    fn test_account_store() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(KvStore::in_memory().unwrap());
        let accounts = AccountStore::new(kv);

        accounts.set("alice", "history", &vec!["a"]).unwrap();
        accounts.set("alice", "saved", &vec!["b"]).unwrap();
        accounts.set("bob", "history", &vec!["c"]).unwrap();

        let removed = accounts.remove_account("alice").unwrap();
        assert_eq!(removed, 2);

        let alice: Option<Vec<String>> = accounts.get("alice", "history").unwrap();
        assert!(alice.is_none());
        let bob: Option<Vec<String>> = accounts.get("bob", "history").unwrap();
        assert_eq!(bob, Some(vec!["c".to_string()]));
    }

    #[test]
    fn test_config_builder() {
        let config = KvConfig::new("test.db")
            .cache_capacity(32 * 1024 * 1024)
            .use_compression(false)
            .flush_every_ms(Some(1000));

        assert_eq!(config.path, "test.db");
        assert_eq!(config.cache_capacity, 32 * 1024 * 1024);
        assert!(!config.use_compression);
        assert_eq!(config.flush_every_ms, Some(1000));
    }
}
