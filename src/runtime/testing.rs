//! Mock implementations for testing
//!
//! These mocks enable controller and API testing without real I/O.

use super::traits::*;
use crate::llm::LlmError;
use crate::story::PromptSpec;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Text Generator
// ============================================================================

/// Mock text generator that returns queued responses
pub struct MockTextGenerator {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    model_id: String,
    delay: Option<Duration>,
    /// Record of all prompts received
    pub prompts: Mutex<Vec<PromptSpec>>,
}

impl MockTextGenerator {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering each prompt
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful page
    pub fn queue_text(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded prompts
    pub fn recorded_prompts(&self) -> Vec<PromptSpec> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, spec: &PromptSpec) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(spec.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")));
        match next {
            Ok(text) if text.trim().is_empty() => {
                Err(LlmError::empty_content("Mock returned blank text"))
            }
            other => other,
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Mock Media
// ============================================================================

/// Mock illustrator returning a fixed picture, or failing
pub struct MockIllustrator {
    result: Result<Illustration, LlmError>,
    delay: Option<Duration>,
    /// Scene descriptions received
    pub scenes: Mutex<Vec<String>>,
}

impl MockIllustrator {
    pub fn returning(illustration: Illustration) -> Self {
        Self {
            result: Ok(illustration),
            delay: None,
            scenes: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            result: Err(error),
            delay: None,
            scenes: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering each scene
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Illustrator for MockIllustrator {
    async fn render(&self, scene: &str) -> Result<Illustration, LlmError> {
        self.scenes.lock().unwrap().push(scene.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

/// Mock narrator that "speaks" the text as its own bytes
#[derive(Default)]
pub struct MockNarrator {
    /// Texts received
    pub texts: Mutex<Vec<String>>,
}

#[async_trait]
impl Narrator for MockNarrator {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, LlmError> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(text.as_bytes().to_vec())
    }
}
