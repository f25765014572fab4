//! Centralized text model definitions
//!
//! Adding a model means adding one entry here; the registry picks it up
//! when the provider prerequisites are configured.

use super::openai::OpenAIModel;
use super::{LlmService, OpenAIService};
use std::sync::Arc;

/// Hosted provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAI,
}

impl Provider {
    /// Get the display name for this provider
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }
}

/// Model definition with metadata
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// User-facing model ID
    pub id: &'static str,
    pub provider: Provider,
    /// Human-readable description
    pub description: &'static str,
    /// Suitable for short auxiliary prompts such as titles
    pub cheap: bool,
    /// Factory function to create the service
    pub factory: fn(&str, Option<&str>) -> Result<Arc<dyn LlmService>, String>,
}

fn openai_factory(
    model: OpenAIModel,
    api_key: &str,
    gateway: Option<&str>,
) -> Result<Arc<dyn LlmService>, String> {
    if api_key.is_empty() {
        return Err(format!(
            "{} requires OPENAI_API_KEY or gateway",
            model.api_name()
        ));
    }
    Ok(Arc::new(OpenAIService::new(
        api_key.to_string(),
        model,
        gateway,
    )?))
}

/// Get all available model definitions
pub fn all_models() -> &'static [ModelDef] {
    &[
        ModelDef {
            id: "gpt-5.2",
            provider: Provider::OpenAI,
            description: "GPT-5.2 (richest prose, slower)",
            cheap: false,
            factory: |api_key, gateway| openai_factory(OpenAIModel::GPT52, api_key, gateway),
        },
        ModelDef {
            id: "gpt-5-mini",
            provider: Provider::OpenAI,
            description: "GPT-5 Mini (fast reasoning model)",
            cheap: true,
            factory: |api_key, gateway| openai_factory(OpenAIModel::GPT5Mini, api_key, gateway),
        },
        ModelDef {
            id: "gpt-4o",
            provider: Provider::OpenAI,
            description: "GPT-4o (honours the creativity setting)",
            cheap: false,
            factory: |api_key, gateway| openai_factory(OpenAIModel::GPT4o, api_key, gateway),
        },
        ModelDef {
            id: "gpt-4o-mini",
            provider: Provider::OpenAI,
            description: "GPT-4o Mini (fast, honours the creativity setting)",
            cheap: true,
            factory: |api_key, gateway| openai_factory(OpenAIModel::GPT4oMini, api_key, gateway),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_model_ids_unique() {
        let ids: HashSet<_> = all_models().iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), all_models().len());
    }

    #[test]
    fn test_factory_rejects_empty_key() {
        for model in all_models() {
            assert!((model.factory)("", None).is_err(), "{} accepted empty key", model.id);
        }
    }

    #[test]
    fn test_factory_model_id_matches_definition() {
        for model in all_models() {
            let service = (model.factory)("key", None).unwrap();
            assert_eq!(service.model_id(), model.id);
        }
    }
}
