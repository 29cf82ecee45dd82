//! Completion endpoint client
//!
//! [`CompletionBackend`] is the transport seam; [`HttpCompletionClient`] is
//! the reqwest implementation. [`AdviceGenerator`] sits on top and turns any
//! transport failure into [`FALLBACK_ADVICE`], so the advice screen never
//! has to handle an error.
//!
//! There is no retry and no response cache: asking again re-queries the
//! endpoint with the same prompt.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::prompt::AnswerSet;
use crate::types::{CompletionRequest, CompletionResponse};
use crate::{AdviceError, Result};

/// Default completion endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.a0.dev/ai/llm";

/// Text shown when advice could not be generated
pub const FALLBACK_ADVICE: &str =
    "I apologize, but I couldn't generate advice at the moment. Please try again.";

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the completion client
#[derive(Debug, Clone)]
pub struct AdviceClientConfig {
    /// Full endpoint URL
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Custom headers to include in all requests
    pub default_headers: HashMap<String, String>,
}

impl Default for AdviceClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("Social-Confidence/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }
}

impl AdviceClientConfig {
    /// Create a new config with an endpoint URL
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Sends a completion request and returns the parsed response
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Perform one request
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}

/// HTTP completion client
///
/// # Examples
/// ```no_run
/// use advice_client::{AdviceClientConfig, CompletionBackend, CompletionRequest, HttpCompletionClient, AnswerSet};
///
/// async fn example() -> Result<(), Box<dyn std::error::Error>> {
///     let client = HttpCompletionClient::new(AdviceClientConfig::default())?;
///     let answers = AnswerSet::new(["Alone", "Quiet and calm", "Yes, once"])?;
///     let request = CompletionRequest::for_advice("At a bookshop", &answers);
///     let response = client.complete(&request).await?;
///     println!("{}", response.completion);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: ReqwestClient,
    config: AdviceClientConfig,
}

impl HttpCompletionClient {
    /// Create a new client
    pub fn new(config: AdviceClientConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| AdviceError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let mut req = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json");

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        let body = serde_json::to_vec(request).map_err(|e| AdviceError::Parse(e.to_string()))?;

        tracing::debug!(endpoint = %self.config.endpoint, "sending completion request");
        let response = req
            .body(body)
            .send()
            .await
            .map_err(|e| AdviceError::Network(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AdviceError::Network(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AdviceError::Status { status: status.as_u16(), body: text });
        }

        serde_json::from_str(&text)
            .map_err(|e| AdviceError::Parse(format!("Failed to parse JSON: {}", e)))
    }
}

// =============================================================================
// Advice Generation
// =============================================================================

/// Formats advice requests and applies the fallback policy
#[derive(Clone)]
pub struct AdviceGenerator {
    backend: Arc<dyn CompletionBackend>,
}

impl AdviceGenerator {
    /// Wrap a completion backend
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Generator backed by the HTTP client
    pub fn http(config: AdviceClientConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpCompletionClient::new(config)?)))
    }

    /// Ask for advice, surfacing the failure
    pub async fn try_generate_advice(&self, situation: &str, answers: &AnswerSet) -> Result<String> {
        let request = CompletionRequest::for_advice(situation, answers);
        let response = self.backend.complete(&request).await?;
        Ok(response.completion)
    }

    /// Ask for advice; failures resolve to [`FALLBACK_ADVICE`]
    pub async fn generate_advice(&self, situation: &str, answers: &AnswerSet) -> String {
        match self.try_generate_advice(situation, answers).await {
            Ok(advice) => advice,
            Err(err) => {
                tracing::warn!(error = %err, "advice generation failed, using fallback");
                FALLBACK_ADVICE.to_string()
            }
        }
    }
}
