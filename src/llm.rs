//! Text generation provider abstraction
//!
//! Provides a common interface over hosted text models, plus wrappers for
//! logging and retrying requests.

mod error;
mod models;
mod openai;
mod registry;
mod types;

#[allow(unused_imports)] // Public API re-exports
pub use error::{LlmError, LlmErrorKind};
pub use models::{all_models, ModelDef, Provider};
pub use openai::{openai_url, provider_error, retry_after, OpenAIService, REQUEST_TIMEOUT};
pub use registry::{LlmConfig, ModelRegistry};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Attempts made by [`RetryingService`] before giving up
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Longest wait between attempts, whatever the provider asks for
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Common interface for text generation providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for text generation services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    end_turn = response.end_turn,
                    "Text generation completed"
                );
                if !response.end_turn {
                    tracing::warn!(model = %self.model_id, "Generation stopped before a natural end");
                }
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "Text generation failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Retries retryable failures with exponential backoff.
///
/// Retrying is a collaborator concern; the story controller never retries.
pub struct RetryingService {
    inner: Arc<dyn LlmService>,
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        Self {
            inner,
            max_attempts: MAX_RETRY_ATTEMPTS,
            base_delay: Duration::from_secs(1),
        }
    }

    #[cfg(test)]
    fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Exponential backoff: base, 2x base, 4x base...
    fn retry_delay(&self, attempt: u32) -> Duration {
        self.base_delay * (1 << (attempt - 1))
    }
}

#[async_trait]
impl LlmService for RetryingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut attempt = 1;
        loop {
            match self.inner.complete(request).await {
                Err(e) if e.kind.is_retryable() && attempt < self.max_attempts => {
                    let delay = e
                        .retry_after
                        .unwrap_or_else(|| self.retry_delay(attempt))
                        .min(MAX_RETRY_DELAY);
                    tracing::warn!(
                        model = %self.inner.model_id(),
                        attempt,
                        delay_ms = %delay.as_millis(),
                        error = %e.message,
                        "Retrying text generation"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.kind.is_retryable() => {
                    return Err(LlmError::new(
                        e.kind,
                        format!("Failed after {attempt} attempts: {}", e.message),
                    ));
                }
                other => return other,
            }
        }
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedService {
        outcomes: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedService {
        fn new(outcomes: Vec<Result<LlmResponse, LlmError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmService for ScriptedService {
        async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
            *self.calls.lock().unwrap() += 1;
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::unknown("script exhausted")))
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    fn retrying(inner: &Arc<ScriptedService>) -> RetryingService {
        let inner: Arc<dyn LlmService> = inner.clone();
        RetryingService::new(inner).with_base_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_error() {
        let inner = Arc::new(ScriptedService::new(vec![
            Err(LlmError::server_error("boom")),
            Ok(LlmResponse::text("Once upon a time")),
        ]));
        let result = retrying(&inner).complete(&LlmRequest::user("hi")).await;
        assert_eq!(result.unwrap().text, "Once upon a time");
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let inner = Arc::new(ScriptedService::new(vec![
            Err(LlmError::network("down")),
            Err(LlmError::network("down")),
            Err(LlmError::network("down")),
            Ok(LlmResponse::text("too late")),
        ]));
        let err = retrying(&inner)
            .complete(&LlmRequest::user("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Network);
        assert!(err.message.contains("3 attempts"));
        assert_eq!(inner.calls(), MAX_RETRY_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let inner = Arc::new(ScriptedService::new(vec![
            Err(LlmError::auth("bad key")),
            Ok(LlmResponse::text("unused")),
        ]));
        let err = retrying(&inner)
            .complete(&LlmRequest::user("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Auth);
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_for_provider_retry_after() {
        let inner = Arc::new(ScriptedService::new(vec![
            Err(LlmError::rate_limit("slow down").with_retry_after(Duration::from_secs(7))),
            Ok(LlmResponse::text("Once upon a time")),
        ]));
        let inner_dyn: Arc<dyn LlmService> = inner.clone();
        let service = RetryingService::new(inner_dyn);

        let started = tokio::time::Instant::now();
        let result = service.complete(&LlmRequest::user("hi")).await;
        assert_eq!(result.unwrap().text, "Once upon a time");
        assert_eq!(started.elapsed(), Duration::from_secs(7));
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_is_capped() {
        let inner = Arc::new(ScriptedService::new(vec![
            Err(LlmError::rate_limit("later").with_retry_after(Duration::from_secs(600))),
            Ok(LlmResponse::text("finally")),
        ]));
        let inner_dyn: Arc<dyn LlmService> = inner.clone();
        let service = RetryingService::new(inner_dyn);

        let started = tokio::time::Instant::now();
        service.complete(&LlmRequest::user("hi")).await.unwrap();
        assert_eq!(started.elapsed(), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_retry_delay_doubles() {
        let inner: Arc<dyn LlmService> = Arc::new(ScriptedService::new(vec![]));
        let service = RetryingService::new(inner);
        assert_eq!(service.retry_delay(1), Duration::from_secs(1));
        assert_eq!(service.retry_delay(2), Duration::from_secs(2));
        assert_eq!(service.retry_delay(3), Duration::from_secs(4));
    }
}
