//! The analysis relay: encode an upload, submit it to the provider and retry
//! transient failures with exponential backoff.

use crate::models::{Upload, UploadError};
use crate::services::providers::{ProviderError, VideoAnalysisProvider, VideoInput};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use metrics::{counter, histogram};
use serde_json::Value;
use service_core::error::AppError;
use service_core::retry::{retry_with_backoff, RetryExhausted, RetryPolicy};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Reported when the last upstream error carries no message.
pub const FALLBACK_FAILURE_MESSAGE: &str = "Failed to process AI analysis";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    InvalidUpload(#[from] UploadError),

    #[error("all {attempts} attempt(s) failed: {last_error}")]
    Exhausted {
        attempts: u32,
        last_error: ProviderError,
    },
}

impl AnalysisError {
    /// Message surfaced to the client.
    pub fn detail(&self) -> String {
        match self {
            AnalysisError::InvalidUpload(err) => err.to_string(),
            AnalysisError::Exhausted { last_error, .. } if last_error.has_message() => {
                last_error.to_string()
            }
            AnalysisError::Exhausted { .. } => FALLBACK_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<RetryExhausted<ProviderError>> for AnalysisError {
    fn from(err: RetryExhausted<ProviderError>) -> Self {
        AnalysisError::Exhausted {
            attempts: err.attempts,
            last_error: err.last_error,
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        let detail = err.detail();
        match err {
            AnalysisError::InvalidUpload(UploadError::TooLarge { .. }) => {
                AppError::PayloadTooLarge(detail)
            }
            AnalysisError::InvalidUpload(_) => AppError::BadRequest(anyhow::anyhow!(detail)),
            AnalysisError::Exhausted { .. } => AppError::InternalError(anyhow::anyhow!(detail)),
        }
    }
}

/// Relays uploads to a [`VideoAnalysisProvider`] under a [`RetryPolicy`].
///
/// Holds no per-request state; concurrent calls run independent retry loops.
#[derive(Clone)]
pub struct AnalysisRelay {
    provider: Arc<dyn VideoAnalysisProvider>,
    policy: RetryPolicy,
}

impl AnalysisRelay {
    pub fn new(provider: Arc<dyn VideoAnalysisProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider(&self) -> &Arc<dyn VideoAnalysisProvider> {
        &self.provider
    }

    /// Analyze one upload, returning the upstream JSON untouched or the
    /// terminal error once every attempt has failed.
    pub async fn analyze(&self, upload: Upload) -> Result<Value, AnalysisError> {
        let start = Instant::now();
        let data_base64 = STANDARD.encode(upload.bytes());
        let input = VideoInput {
            data_base64: &data_base64,
            mime_type: upload.mime_type(),
        };

        tracing::info!(
            provider = self.provider.name(),
            mime_type = %upload.mime_type(),
            size_bytes = upload.size_bytes(),
            file_name = upload.file_name().unwrap_or("-"),
            max_attempts = self.policy.max_attempts,
            "Starting video analysis"
        );

        let provider = &self.provider;
        let outcome = retry_with_backoff(&self.policy, "analyze_video", |_attempt| async move {
            let result = provider.analyze(&input).await;
            let label = match &result {
                Ok(_) => "success",
                Err(err) => err.kind(),
            };
            counter!("analysis_upstream_attempts_total", "outcome" => label).increment(1);
            result
        })
        .await;

        histogram!("analysis_duration_seconds").record(start.elapsed().as_secs_f64());

        match outcome {
            Ok(value) => {
                counter!("analysis_requests_total", "outcome" => "success").increment(1);
                tracing::info!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Video analysis completed"
                );
                Ok(value)
            }
            Err(exhausted) => {
                counter!("analysis_requests_total", "outcome" => "exhausted").increment(1);
                tracing::error!(
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "Video analysis failed after all attempts"
                );
                Err(exhausted.into())
            }
        }
    }
}
