//! Session state
//!
//! [`SessionStore`] owns the signed-in [`User`]. Every mutation goes through
//! the store: the new value is persisted under [`keys::USER`] first and only
//! then published to subscribers, so a storage fault never leaves the
//! in-memory user ahead of what a restart would restore.
//!
//! Identity checks are delegated to an [`IdentityProvider`]. The default
//! [`FakeIdentityProvider`] accepts any credentials.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storage::{keys, KeyValueStore, KeyValueStoreExt, KvError};
use tokio::sync::{watch, Mutex};

/// Identity provider errors
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Credentials were refused
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Provider could not be reached
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Persisting or reading the user failed
    #[error("Storage error: {0}")]
    Storage(#[from] KvError),

    /// Identity provider refused or failed
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Operation needs a signed-in user
    #[error("No user is signed in")]
    NotSignedIn,
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Free tier
    #[default]
    Free,
    /// Premium tier
    Premium,
    /// Pro tier
    Pro,
}

impl Plan {
    /// All tiers, cheapest first
    pub const ALL: [Plan; 3] = [Plan::Free, Plan::Premium, Plan::Pro];

    /// Lowercase identifier used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
            Plan::Pro => "pro",
        }
    }

    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Free => "Free",
            Plan::Premium => "Premium",
            Plan::Pro => "Pro",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "premium" => Ok(Plan::Premium),
            "pro" => Ok(Plan::Pro),
            _ => Err(format!("Unknown plan: {}", s)),
        }
    }
}

/// Signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Current subscription tier
    pub plan: Plan,
}

impl User {
    /// Create a free-plan user
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            plan: Plan::Free,
        }
    }
}

/// Partial user record; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    /// New display name
    pub name: Option<String>,
    /// New email address
    pub email: Option<String>,
    /// New subscription tier
    pub plan: Option<Plan>,
}

impl UserUpdate {
    /// Update only the plan
    pub fn plan(plan: Plan) -> Self {
        Self { plan: Some(plan), ..Default::default() }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Whether the update changes nothing
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.plan.is_none()
    }

    /// Merge into a user record, returning the result
    pub fn apply_to(&self, user: &User) -> User {
        User {
            id: user.id.clone(),
            name: self.name.clone().unwrap_or_else(|| user.name.clone()),
            email: self.email.clone().unwrap_or_else(|| user.email.clone()),
            plan: self.plan.unwrap_or(user.plan),
        }
    }
}

/// Backend that authenticates users
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticate an existing user
    async fn login(&self, email: &str, password: &str) -> std::result::Result<User, IdentityError>;

    /// Register a new user
    async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> std::result::Result<User, IdentityError>;

    /// Start a password reset
    async fn forgot_password(&self, email: &str) -> std::result::Result<(), IdentityError>;
}

/// Identity provider that accepts everything
///
/// Login always yields the same demo account; signup mints a fresh id.
#[derive(Debug, Clone, Default)]
pub struct FakeIdentityProvider {
    latency: Duration,
}

impl FakeIdentityProvider {
    /// Id of the account returned by [`IdentityProvider::login`]
    pub const DEMO_USER_ID: &'static str = "user-123";
    /// Name of the account returned by [`IdentityProvider::login`]
    pub const DEMO_USER_NAME: &'static str = "John Doe";

    /// Create a provider that answers immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a slow backend
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn login(&self, email: &str, _password: &str) -> std::result::Result<User, IdentityError> {
        self.delay().await;
        Ok(User::new(Self::DEMO_USER_ID, Self::DEMO_USER_NAME, email))
    }

    async fn signup(
        &self,
        name: &str,
        email: &str,
        _password: &str,
    ) -> std::result::Result<User, IdentityError> {
        self.delay().await;
        Ok(User::new(format!("user-{}", uuid::Uuid::new_v4()), name, email))
    }

    async fn forgot_password(&self, _email: &str) -> std::result::Result<(), IdentityError> {
        self.delay().await;
        Ok(())
    }
}

/// Store for the signed-in user
///
/// Readers call [`current_user`](Self::current_user) or hold a receiver from
/// [`subscribe`](Self::subscribe). Writers are serialized internally.
///
/// # Examples
/// ```
/// use app_state::SessionStore;
/// use std::sync::Arc;
/// use storage::KvStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let kv = Arc::new(KvStore::in_memory()?);
/// let session = SessionStore::with_fake_identity(kv);
/// session.hydrate().await;
///
/// assert!(session.login("me@example.com", "secret").await);
/// assert_eq!(session.current_user().unwrap().name, "John Doe");
/// # Ok(())
/// # }
/// ```
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    identity: Arc<dyn IdentityProvider>,
    user_tx: watch::Sender<Option<User>>,
    loading: AtomicBool,
    write_lock: Mutex<()>,
}

impl SessionStore {
    /// Create a store backed by `kv` and `identity`
    pub fn new(kv: Arc<dyn KeyValueStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        let (user_tx, _) = watch::channel(None);
        Self {
            kv,
            identity,
            user_tx,
            loading: AtomicBool::new(true),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store using [`FakeIdentityProvider`]
    pub fn with_fake_identity(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::new(kv, Arc::new(FakeIdentityProvider::new()))
    }

    /// Restore the persisted user
    ///
    /// A missing, unreadable or corrupt record leaves the store signed out.
    pub async fn hydrate(&self) {
        let _guard = self.write_lock.lock().await;

        match self.kv.get::<User>(keys::USER) {
            Ok(Some(user)) => {
                tracing::info!(user_id = %user.id, "restored session");
                self.user_tx.send_replace(Some(user));
            }
            Ok(None) => {
                tracing::debug!("no stored session");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to restore session");
            }
        }

        self.loading.store(false, Ordering::SeqCst);
    }

    /// Whether [`hydrate`](Self::hydrate) has not finished yet
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Sign in; returns whether a user is now signed in
    pub async fn login(&self, email: &str, password: &str) -> bool {
        match self.try_login(email, password).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                false
            }
        }
    }

    /// Sign in, surfacing the failure
    pub async fn try_login(&self, email: &str, password: &str) -> Result<User> {
        let _guard = self.write_lock.lock().await;
        let user = self.identity.login(email, password).await?;
        self.commit(user.clone())?;
        tracing::info!(user_id = %user.id, "logged in");
        Ok(user)
    }

    /// Register and sign in; returns whether a user is now signed in
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> bool {
        match self.try_signup(name, email, password).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "signup failed");
                false
            }
        }
    }

    /// Register and sign in, surfacing the failure
    pub async fn try_signup(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let _guard = self.write_lock.lock().await;
        let user = self.identity.signup(name, email, password).await?;
        self.commit(user.clone())?;
        tracing::info!(user_id = %user.id, "signed up");
        Ok(user)
    }

    /// Sign out
    ///
    /// The stored record is removed before the in-memory user is cleared.
    /// Returns `false` if the record could not be removed, in which case
    /// the user stays signed in.
    pub async fn logout(&self) -> bool {
        let _guard = self.write_lock.lock().await;

        if let Err(e) = self.kv.remove(keys::USER) {
            tracing::warn!(error = %e, "logout failed");
            return false;
        }

        if let Some(user) = self.user_tx.send_replace(None) {
            tracing::info!(user_id = %user.id, "logged out");
        }
        true
    }

    /// Request a password reset email
    pub async fn forgot_password(&self, email: &str) -> bool {
        match self.identity.forgot_password(email).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "password reset failed");
                false
            }
        }
    }

    /// Merge `update` into the signed-in user
    ///
    /// Does nothing when signed out. Returns whether the update was applied.
    pub async fn update_user(&self, update: UserUpdate) -> bool {
        match self.try_update_user(update).await {
            Ok(_) => true,
            Err(SessionError::NotSignedIn) => false,
            Err(e) => {
                tracing::warn!(error = %e, "update user failed");
                false
            }
        }
    }

    /// Merge `update` into the signed-in user, surfacing the failure
    pub async fn try_update_user(&self, update: UserUpdate) -> Result<User> {
        let _guard = self.write_lock.lock().await;

        let current = self.current_user().ok_or(SessionError::NotSignedIn)?;
        let updated = update.apply_to(&current);
        self.commit(updated.clone())?;
        tracing::debug!(user_id = %updated.id, plan = %updated.plan, "user updated");
        Ok(updated)
    }

    /// Signed-in user, if any
    pub fn current_user(&self) -> Option<User> {
        self.user_tx.borrow().clone()
    }

    /// Whether a user is signed in
    pub fn is_authenticated(&self) -> bool {
        self.user_tx.borrow().is_some()
    }

    /// Receive the user on every change
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.user_tx.subscribe()
    }

    fn commit(&self, user: User) -> Result<()> {
        self.kv.set(keys::USER, &user)?;
        self.user_tx.send_replace(Some(user));
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use storage::{KeyValueStore, KvError};

    /// Store whose every operation fails
    pub struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get_bytes(&self, _key: &str) -> storage::Result<Option<Vec<u8>>> {
            Err(KvError::Unavailable("disk gone".to_string()))
        }

        fn set_bytes(&self, _key: &str, _value: Vec<u8>) -> storage::Result<()> {
            Err(KvError::Unavailable("disk gone".to_string()))
        }

        fn remove(&self, _key: &str) -> storage::Result<bool> {
            Err(KvError::Unavailable("disk gone".to_string()))
        }

        fn keys_with_prefix(&self, _prefix: &str) -> storage::Result<Vec<String>> {
            Err(KvError::Unavailable("disk gone".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FailingStore;
    use super::*;
    use storage::KvStore;
    use tempfile::TempDir;

    fn memory_store() -> Arc<KvStore> {
        Arc::new(KvStore::in_memory().unwrap())
    }

    #[test]
    fn test_plan_serialization() {
        assert_eq!(serde_json::to_string(&Plan::Premium).unwrap(), "\"premium\"");
        let plan: Plan = serde_json::from_str("\"pro\"").unwrap();
        assert_eq!(plan, Plan::Pro);
        assert_eq!("FREE".parse::<Plan>().unwrap(), Plan::Free);
        assert!("gold".parse::<Plan>().is_err());
    }

    #[test]
    fn test_user_update_merge() {
        let user = User::new("user-1", "Ann", "ann@example.com");
        let updated = UserUpdate::plan(Plan::Pro).with_name("Annie").apply_to(&user);

        assert_eq!(updated.id, "user-1");
        assert_eq!(updated.name, "Annie");
        assert_eq!(updated.email, "ann@example.com");
        assert_eq!(updated.plan, Plan::Pro);
        assert!(UserUpdate::default().is_empty());
    }

    #[tokio::test]
    async fn test_hydrate_empty() {
        let session = SessionStore::with_fake_identity(memory_store());
        assert!(session.is_loading());

        session.hydrate().await;
        assert!(!session.is_loading());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_fabricates_demo_user() {
        let kv = memory_store();
        let session = SessionStore::with_fake_identity(kv.clone());
        session.hydrate().await;

        assert!(session.login("a@b.co", "whatever").await);

        let user = session.current_user().unwrap();
        assert_eq!(user.id, "user-123");
        assert_eq!(user.name, "John Doe");
        assert_eq!(user.email, "a@b.co");
        assert_eq!(user.plan, Plan::Free);

        let stored: User = kv.get(keys::USER).unwrap().unwrap();
        assert_eq!(stored, user);
    }

    #[tokio::test]
    async fn test_signup_mints_id() {
        let session = SessionStore::with_fake_identity(memory_store());
        session.hydrate().await;

        assert!(session.signup("Sam", "sam@example.com", "secret1").await);
        let first = session.current_user().unwrap();
        assert!(first.id.starts_with("user-"));
        assert_eq!(first.name, "Sam");
        assert_eq!(first.plan, Plan::Free);

        assert!(session.signup("Sam", "sam@example.com", "secret1").await);
        assert_ne!(session.current_user().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn test_logout_clears_storage() {
        let kv = memory_store();
        let session = SessionStore::with_fake_identity(kv.clone());
        session.hydrate().await;
        session.login("a@b.co", "pw").await;

        assert!(session.logout().await);
        assert!(session.current_user().is_none());
        assert!(!kv.contains(keys::USER).unwrap());

        let fresh = SessionStore::with_fake_identity(kv);
        fresh.hydrate().await;
        assert!(!fresh.is_authenticated());
    }

    #[tokio::test]
    async fn test_update_user_persists_across_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db").to_string_lossy().to_string();
        let config = storage::KvConfig::new(&path).flush_every_ms(None);

        {
            let kv = Arc::new(KvStore::new(config.clone()).unwrap());
            let session = SessionStore::with_fake_identity(kv.clone());
            session.hydrate().await;
            session.login("a@b.co", "pw").await;

            assert!(session.update_user(UserUpdate::plan(Plan::Premium)).await);
            assert_eq!(session.current_user().unwrap().plan, Plan::Premium);
            kv.flush().unwrap();
        }

        let kv = Arc::new(KvStore::new(config).unwrap());
        let session = SessionStore::with_fake_identity(kv);
        session.hydrate().await;
        assert_eq!(session.current_user().unwrap().plan, Plan::Premium);
    }

    #[tokio::test]
    async fn test_update_user_signed_out_is_noop() {
        let kv = memory_store();
        let session = SessionStore::with_fake_identity(kv.clone());
        session.hydrate().await;

        assert!(!session.update_user(UserUpdate::plan(Plan::Pro)).await);
        assert!(session.current_user().is_none());
        assert!(!kv.contains(keys::USER).unwrap());
    }

    #[tokio::test]
    async fn test_storage_fault_leaves_state_unchanged() {
        let session = SessionStore::with_fake_identity(Arc::new(FailingStore));
        session.hydrate().await;

        assert!(!session.is_loading());
        assert!(!session.login("a@b.co", "pw").await);
        assert!(!session.signup("A", "a@b.co", "pw").await);
        assert!(session.current_user().is_none());

        let err = session.try_login("a@b.co", "pw").await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
    }

    #[tokio::test]
    async fn test_corrupt_record_hydrates_signed_out() {
        let kv = memory_store();
        kv.set_bytes(keys::USER, b"{not json".to_vec()).unwrap();

        let session = SessionStore::with_fake_identity(kv);
        session.hydrate().await;
        assert!(!session.is_loading());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let session = SessionStore::with_fake_identity(memory_store());
        session.hydrate().await;
        let mut rx = session.subscribe();

        session.login("a@b.co", "pw").await;
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        session.logout().await;
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_rejected_login() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_login()
            .times(1)
            .returning(|_, _| Err(IdentityError::Rejected("bad password".to_string())));

        let session = SessionStore::new(memory_store(), Arc::new(identity));
        session.hydrate().await;

        assert!(!session.login("a@b.co", "nope").await);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_forgot_password() {
        let session = SessionStore::with_fake_identity(memory_store());
        assert!(session.forgot_password("a@b.co").await);

        let mut identity = MockIdentityProvider::new();
        identity
            .expect_forgot_password()
            .returning(|_| Err(IdentityError::Unavailable("offline".to_string())));
        let session = SessionStore::new(memory_store(), Arc::new(identity));
        assert!(!session.forgot_password("a@b.co").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fake_provider_latency() {
        let provider = FakeIdentityProvider::new().with_latency(Duration::from_secs(1));
        let started = tokio::time::Instant::now();
        provider.login("a@b.co", "pw").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(1));
    }
}
