//! Collaborator abstractions used by the story controller
//!
//! These traits enable testing the controller with mock implementations.

use crate::llm::{LlmError, LlmService, ModelRegistry};
use crate::story::PromptSpec;
use async_trait::async_trait;
use std::sync::Arc;

/// Writes story pages
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate the full text for a prompt. Empty output is an error.
    async fn generate(&self, spec: &PromptSpec) -> Result<String, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Picture produced for a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Illustration {
    Png(Vec<u8>),
    Url(String),
}

/// Draws a scene description
#[async_trait]
pub trait Illustrator: Send + Sync {
    async fn render(&self, scene: &str) -> Result<Illustration, LlmError>;
}

/// Reads page text aloud
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Synthesized speech, MP3 encoded
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, LlmError>;
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use a model from the `ModelRegistry` as `TextGenerator`
pub struct RegistryTextGenerator {
    registry: Arc<ModelRegistry>,
    model_id: String,
}

impl RegistryTextGenerator {
    pub fn new(registry: Arc<ModelRegistry>, model_id: String) -> Self {
        Self { registry, model_id }
    }

    /// Writer backed by the registry's default model
    pub fn default_model(registry: Arc<ModelRegistry>) -> Self {
        let model_id = registry.default_model_id().to_string();
        Self::new(registry, model_id)
    }

    /// Short-prompt generator backed by a cheap model, if any is registered
    pub fn cheap_model(registry: Arc<ModelRegistry>) -> Option<Self> {
        let model_id = registry.get_cheap_model()?.model_id().to_string();
        Some(Self::new(registry, model_id))
    }

    fn service(&self) -> Result<Arc<dyn LlmService>, LlmError> {
        self.registry
            .get(&self.model_id)
            .or_else(|| self.registry.default())
            .ok_or_else(|| LlmError::auth("No text model available (set OPENAI_API_KEY)"))
    }
}

#[async_trait]
impl TextGenerator for RegistryTextGenerator {
    async fn generate(&self, spec: &PromptSpec) -> Result<String, LlmError> {
        let response = self.service()?.complete(&spec.to_request()).await?;
        if !response.has_content() {
            return Err(LlmError::empty_content(format!(
                "{} returned no text",
                self.model_id
            )));
        }
        Ok(response.text.trim().to_string())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmRequest, LlmResponse};
    use crate::story::{opening_prompt, AgeGroup, NarrativeTemplate, StorySetup};
    use crate::state_machine::Directive;

    struct FixedService {
        text: &'static str,
    }

    #[async_trait]
    impl LlmService for FixedService {
        async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
            Ok(LlmResponse::text(self.text))
        }

        fn model_id(&self) -> &str {
            "fixed"
        }
    }

    fn spec() -> PromptSpec {
        let setup = StorySetup {
            age_group: AgeGroup::FourToSix,
            theme: "rain".to_string(),
            character_name: "Lu".to_string(),
            gender: None,
            culture: None,
            personality: None,
            template: NarrativeTemplate::Classic,
            creativity: 0.5,
        };
        opening_prompt(&setup, Directive::OfferChoices)
    }

    fn generator(text: &'static str) -> RegistryTextGenerator {
        let registry = ModelRegistry::from_services(vec![Arc::new(FixedService { text })]);
        RegistryTextGenerator::default_model(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_generate_trims_text() {
        let text = generator("  Once upon a time.\n").generate(&spec()).await.unwrap();
        assert_eq!(text, "Once upon a time.");
    }

    #[tokio::test]
    async fn test_blank_output_is_empty_content() {
        let err = generator(" \n ").generate(&spec()).await.unwrap_err();
        assert_eq!(err.kind, crate::llm::LlmErrorKind::EmptyContent);
    }

    #[tokio::test]
    async fn test_no_models_fails() {
        let registry = Arc::new(ModelRegistry::from_services(vec![]));
        let err = RegistryTextGenerator::default_model(registry)
            .generate(&spec())
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::llm::LlmErrorKind::Auth);
    }
}
