//! Core application logic for Social Confidence
//!
//! This crate contains the questionnaire, plan catalog, advice library,
//! settings, form validation and the advice screen flow.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod advice;
pub mod library;
pub mod plans;
pub mod questionnaire;
pub mod settings;
pub mod validation;

pub use advice::{share_text, AdviceServices, AdviceSession, AdviceSessionError, SaveToggle};
pub use library::{AdviceLibrary, AdviceRecord, LibraryError};
pub use plans::{plan_options, pricing_for, subscribe, PlanLimits, PlanOption, PricingPlan, CATALOG};
pub use questionnaire::{
    BackOutcome, Question, Questionnaire, QuestionnaireError, Step, Submission, QUESTIONS,
};
pub use settings::{clear_history, delete_account, AppSettings, SettingsStore};
pub use validation::{
    validate_forgot_password, validate_login, validate_profile, validate_signup,
    validate_situation, Field, ValidationErrors,
};
