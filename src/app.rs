//! Store wiring for one run of the binary

use std::sync::Arc;

use advice_client::AdviceGenerator;
use anyhow::Context;
use app_core::{AdviceLibrary, AdviceServices, SettingsStore};
use app_state::SessionStore;
use app_ui::{AppNavigator, ColorScheme, ThemeStore};
use storage::{KeyValueStore, KvStore};

use crate::config::AppConfig;

pub struct App {
    pub kv: Arc<KvStore>,
    pub session: Arc<SessionStore>,
    pub theme: ThemeStore,
    pub settings: Arc<SettingsStore>,
    pub library: AdviceLibrary,
    pub generator: AdviceGenerator,
    pub navigator: AppNavigator,
}

impl App {
    /// Open the store and restore persisted state
    pub async fn open(config: &AppConfig, system_scheme: Option<ColorScheme>) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("creating {}", config.data_dir.display()))?;
        let kv = Arc::new(KvStore::new(config.kv_config()).context("opening store")?);
        let generator =
            AdviceGenerator::http(config.advice_config()).context("building advice client")?;
        Ok(Self::with_store(kv, generator, system_scheme).await)
    }

    /// Wire stores over an already open key-value store
    pub async fn with_store(
        kv: Arc<KvStore>,
        generator: AdviceGenerator,
        system_scheme: Option<ColorScheme>,
    ) -> Self {
        let shared: Arc<dyn KeyValueStore> = kv.clone();

        let session = Arc::new(SessionStore::with_fake_identity(shared.clone()));
        session.hydrate().await;

        let theme = ThemeStore::new(shared.clone());
        theme.set_system_scheme(system_scheme);
        theme.load();

        let settings = Arc::new(SettingsStore::new(shared.clone()));
        settings.load();

        let navigator = AppNavigator::new(session.is_authenticated());

        Self {
            kv,
            session,
            theme,
            settings,
            library: AdviceLibrary::new(shared),
            generator,
            navigator,
        }
    }

    pub fn services(&self) -> AdviceServices {
        AdviceServices {
            generator: self.generator.clone(),
            session: Arc::clone(&self.session),
            library: self.library.clone(),
            settings: Arc::clone(&self.settings),
        }
    }

    /// Follow the session into the matching navigation shell
    pub fn sync_navigation(&mut self) {
        self.navigator.sync_auth(self.session.is_authenticated());
    }

    /// Persist pending writes
    pub fn flush(&self) {
        if let Err(e) = self.kv.flush() {
            tracing::warn!(error = %e, "failed to flush store");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advice_client::{CompletionBackend, CompletionRequest, CompletionResponse};
    use app_ui::{Route, Shell, ThemeMode};

    struct EchoBackend;

    #[async_trait::async_trait]
    impl CompletionBackend for EchoBackend {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> advice_client::Result<CompletionResponse> {
            Ok(CompletionResponse {
                completion: request.user_prompt().unwrap_or_default().to_string(),
            })
        }
    }

    async fn app() -> App {
        let kv = Arc::new(KvStore::in_memory().unwrap());
        App::with_store(kv, AdviceGenerator::new(Arc::new(EchoBackend)), None).await
    }

    #[tokio::test]
    async fn test_starts_signed_out_on_onboarding() {
        let app = app().await;
        assert!(!app.session.is_authenticated());
        assert_eq!(app.navigator.shell(), Shell::Auth);
        assert_eq!(app.navigator.current_route(), &Route::Onboarding);
        assert_eq!(app.theme.mode(), ThemeMode::System);
    }

    #[tokio::test]
    async fn test_login_switches_shell() {
        let mut app = app().await;
        assert!(app.session.login("sam@example.com", "secret1").await);
        app.sync_navigation();
        assert_eq!(app.navigator.shell(), Shell::Main);
        assert_eq!(app.navigator.current_route(), &Route::HomeMain);
    }

    #[tokio::test]
    async fn test_system_scheme_applies_before_load() {
        let kv = Arc::new(KvStore::in_memory().unwrap());
        let app = App::with_store(
            kv,
            AdviceGenerator::new(Arc::new(EchoBackend)),
            Some(ColorScheme::Dark),
        )
        .await;
        assert!(app.theme.is_dark());
    }
}
