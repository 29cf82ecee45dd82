//! Advice completion client
//!
//! This crate builds the advice prompt from a situation and its answers,
//! sends it to the completion endpoint, and applies the fallback policy
//! when the endpoint cannot produce advice.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod prompt;
pub mod types;

pub use client::{
    AdviceClientConfig, AdviceGenerator, CompletionBackend, HttpCompletionClient,
    DEFAULT_ENDPOINT, FALLBACK_ADVICE,
};
pub use prompt::{build_prompt, AnswerSet, QUESTION_COUNT, SYSTEM_PERSONA};
pub use types::{ChatMessage, ChatRole, CompletionRequest, CompletionResponse};

/// Result type for advice operations
pub type Result<T> = std::result::Result<T, AdviceError>;

/// Error types for advice operations
#[derive(Debug, thiserror::Error)]
pub enum AdviceError {
    /// Answer list did not match the questionnaire length
    #[error("Expected {expected} answers, got {found}")]
    InvalidAnswers {
        /// Required number of answers
        expected: usize,
        /// Number of answers supplied
        found: usize,
    },

    /// HTTP client could not be built
    #[error("Client error: {0}")]
    Client(String),

    /// Request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// Endpoint answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

impl AdviceError {
    /// Whether the failure happened on the wire rather than in the input
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            AdviceError::Network(_) | AdviceError::Status { .. } | AdviceError::Parse(_)
        )
    }
}
