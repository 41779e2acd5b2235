//! Video analysis provider abstractions and implementations.
//!
//! The relay talks to the upstream model through the
//! [`VideoAnalysisProvider`] trait so the Gemini client can be swapped for a
//! scripted mock in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Error type for a single provider call.
///
/// Every variant is transient from the relay's point of view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rate limited by upstream: {0}")]
    RateLimited(String),

    #[error("Gemini API error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Upstream returned invalid JSON: {0}")]
    InvalidJson(String),
}

impl ProviderError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::NetworkError(_) => "network",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::ApiError { .. } => "api_error",
            ProviderError::MalformedResponse(_) => "malformed_response",
            ProviderError::InvalidJson(_) => "invalid_json",
        }
    }

    /// False when the error carries no upstream detail at all.
    pub fn has_message(&self) -> bool {
        match self {
            ProviderError::NotConfigured(msg)
            | ProviderError::NetworkError(msg)
            | ProviderError::RateLimited(msg)
            | ProviderError::MalformedResponse(msg)
            | ProviderError::InvalidJson(msg) => !msg.trim().is_empty(),
            ProviderError::Timeout(_) | ProviderError::ApiError { .. } => true,
        }
    }
}

/// Video payload handed to a provider for one attempt.
///
/// The base64 text is produced once per request and borrowed by every
/// attempt.
#[derive(Debug, Clone, Copy)]
pub struct VideoInput<'a> {
    pub data_base64: &'a str,
    pub mime_type: &'a str,
}

/// Trait for providers that turn a video into a JSON analysis.
#[async_trait]
pub trait VideoAnalysisProvider: Send + Sync {
    /// Perform exactly one upstream call and return the parsed JSON result.
    async fn analyze(&self, video: &VideoInput<'_>) -> Result<Value, ProviderError>;

    /// Check that the provider is usable. Makes no upstream call.
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Provider name for logs.
    fn name(&self) -> &'static str;
}
