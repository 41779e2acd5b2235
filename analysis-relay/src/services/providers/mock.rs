//! Mock provider implementation for testing.

use super::{ProviderError, VideoAnalysisProvider, VideoInput};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Provider that replays a scripted sequence of outcomes, one per call.
///
/// Once the script runs out, every further call returns `fallback`.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Value, ProviderError>>>,
    fallback: Result<Value, ProviderError>,
    calls: AtomicU32,
}

impl ScriptedProvider {
    pub fn new(
        script: impl IntoIterator<Item = Result<Value, ProviderError>>,
        fallback: Result<Value, ProviderError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            calls: AtomicU32::new(0),
        }
    }

    /// Always succeed with `value`.
    pub fn succeeding(value: Value) -> Self {
        Self::new(Vec::new(), Ok(value))
    }

    /// Always fail with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::new(Vec::new(), Err(error))
    }

    /// Fail `failures` times with `error`, then succeed with `value`.
    pub fn failing_then(failures: usize, error: ProviderError, value: Value) -> Self {
        Self::new(std::iter::repeat(Err(error)).take(failures), Ok(value))
    }

    /// Number of `analyze` calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoAnalysisProvider for ScriptedProvider {
    async fn analyze(&self, _video: &VideoInput<'_>) -> Result<Value, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());

        next.unwrap_or_else(|| self.fallback.clone())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
