//! Advice screen flow
//!
//! An [`AdviceSession`] is created for one situation and answer set. It
//! requests advice on creation and on every "another suggestion", keeping
//! only the newest result. Dropping the session aborts the request in
//! flight.

use advice_client::{AdviceGenerator, AnswerSet};
use app_state::{LatestRequest, Plan, SessionStore};
use std::sync::Arc;
use thiserror::Error;

use crate::library::{AdviceLibrary, AdviceRecord, LibraryError};
use crate::plans::PlanLimits;
use crate::settings::SettingsStore;

/// Advice session error types
#[derive(Debug, Error)]
pub enum AdviceSessionError {
    /// No advice has arrived yet
    #[error("No advice to act on yet")]
    NoAdvice,

    /// Action needs a signed-in user
    #[error("Sign in to save advice")]
    NotSignedIn,

    /// Library error
    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// Result type for advice session operations
pub type Result<T> = std::result::Result<T, AdviceSessionError>;

/// Outcome of [`AdviceSession::toggle_saved`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveToggle {
    /// Added to favorites
    Saved,
    /// Removed from favorites
    Removed,
}

/// Text handed to the share sheet
pub fn share_text(advice: &str) -> String {
    format!("Social Confidence Advice:\n\n{}\n\nShared from Social Confidence App", advice)
}

/// Shared collaborators for advice sessions
#[derive(Clone)]
pub struct AdviceServices {
    /// Completion client
    pub generator: AdviceGenerator,
    /// Signed-in user
    pub session: Arc<SessionStore>,
    /// History and favorites
    pub library: AdviceLibrary,
    /// App settings
    pub settings: Arc<SettingsStore>,
}

/// Advice for one situation
pub struct AdviceSession {
    services: AdviceServices,
    situation: String,
    answers: AnswerSet,
    request: LatestRequest<AdviceRecord>,
    replayed: Option<AdviceRecord>,
}

impl AdviceSession {
    /// Create a session and request advice
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(services: AdviceServices, situation: impl Into<String>, answers: AnswerSet) -> Self {
        let session = Self {
            services,
            situation: situation.into(),
            answers,
            request: LatestRequest::new(),
            replayed: None,
        };
        session.generate();
        session
    }

    /// Show a stored record without requesting new advice
    pub fn replay(services: AdviceServices, record: AdviceRecord) -> Self {
        Self {
            services,
            situation: record.situation.clone(),
            answers: record.answers.clone(),
            request: LatestRequest::new(),
            replayed: Some(record),
        }
    }

    /// Situation being advised on
    pub fn situation(&self) -> &str {
        &self.situation
    }

    /// Answers being advised on
    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    /// Request fresh advice, superseding any request in flight
    ///
    /// Returns the request generation.
    pub fn generate(&self) -> u64 {
        let generator = self.services.generator.clone();
        let session = Arc::clone(&self.services.session);
        let library = self.services.library.clone();
        let settings = Arc::clone(&self.services.settings);
        let situation = self.situation.clone();
        let answers = self.answers.clone();

        let request = async move {
            let advice = generator.generate_advice(&situation, &answers).await;
            AdviceRecord::new(situation, answers, advice)
        };

        self.request.issue_with(request, move |record: &AdviceRecord| {
            if !settings.get().save_history {
                return;
            }
            if let Some(user) = session.current_user() {
                if let Err(e) = library.record(&user.id, record.clone()) {
                    tracing::warn!(error = %e, "failed to record history");
                }
            }
        })
    }

    /// Whether a request is in flight
    pub fn is_loading(&self) -> bool {
        self.request.is_pending()
    }

    /// Latest advice, if any has arrived
    pub fn current(&self) -> Option<AdviceRecord> {
        self.request
            .state()
            .value()
            .cloned()
            .or_else(|| self.replayed.clone())
    }

    /// Wait for the newest request to finish
    ///
    /// Returns `None` if it was cancelled.
    pub async fn wait(&self) -> Option<AdviceRecord> {
        match self.request.wait().await {
            Some(record) => Some(record),
            None => self.replayed.clone(),
        }
    }

    /// Abort the request in flight
    pub fn cancel(&self) {
        self.request.cancel();
    }

    /// Whether the current advice is in favorites
    pub fn is_saved(&self) -> bool {
        let (Some(record), Some(user)) = (self.current(), self.services.session.current_user())
        else {
            return false;
        };

        match self.services.library.is_saved(&user.id, &record.id) {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read saved advice");
                false
            }
        }
    }

    /// Add the current advice to favorites, or remove it if present
    pub fn toggle_saved(&self) -> Result<SaveToggle> {
        let record = self.current().ok_or(AdviceSessionError::NoAdvice)?;
        let user = self
            .services
            .session
            .current_user()
            .ok_or(AdviceSessionError::NotSignedIn)?;
        let library = &self.services.library;

        if library.unsave(&user.id, &record.id)? {
            return Ok(SaveToggle::Removed);
        }

        library.save(&user.id, &record, PlanLimits::for_plan(user.plan))?;
        Ok(SaveToggle::Saved)
    }

    /// Share-sheet text for the current advice
    pub fn share_text(&self) -> Option<String> {
        self.current().map(|record| share_text(&record.advice))
    }

    /// Whether to show the upgrade card
    pub fn shows_upgrade_prompt(&self) -> bool {
        self.services
            .session
            .current_user()
            .is_some_and(|user| user.plan == Plan::Free)
    }
}
