//! Model registry for managing available text models

use super::{all_models, LlmService, LoggingService, Provider, RetryingService};
use std::collections::HashMap;
use std::sync::Arc;

/// Preferred default when the environment does not name one
pub const PREFERRED_DEFAULT_MODEL: &str = "gpt-5.2";

/// Configuration for text generation providers
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    /// Gateway base URL; when set, the gateway handles authentication
    pub gateway: Option<String>,
    /// Default model ID
    pub default_model: Option<String>,
}

impl LlmConfig {
    /// Read provider settings through `lookup` (usually `std::env::var`)
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            openai_api_key: lookup(Provider::OpenAI.api_key_env_var()),
            gateway: lookup("LLM_GATEWAY").filter(|g| !g.is_empty()),
            default_model: lookup("DEFAULT_MODEL").filter(|m| !m.is_empty()),
        }
    }

    /// Key to send to the provider, `"implicit"` in gateway mode
    pub fn api_key_for(&self, provider: Provider) -> Option<String> {
        if self.gateway.is_some() {
            return Some("implicit".to_string());
        }
        let key = match provider {
            Provider::OpenAI => self.openai_api_key.as_ref()?,
        };
        if key.is_empty() {
            None
        } else {
            Some(key.clone())
        }
    }
}

/// Registry of available text models
pub struct ModelRegistry {
    services: HashMap<String, Arc<dyn LlmService>>,
    default_model: String,
}

impl ModelRegistry {
    pub fn new(config: &LlmConfig) -> Self {
        let mut services: HashMap<String, Arc<dyn LlmService>> = HashMap::new();

        for model_def in all_models() {
            if let Some(service) = Self::try_create_model(model_def, config) {
                services.insert(model_def.id.to_string(), service);
            }
        }

        let default_model = config
            .default_model
            .clone()
            .filter(|id| services.contains_key(id))
            .or_else(|| {
                if services.contains_key(PREFERRED_DEFAULT_MODEL) {
                    Some(PREFERRED_DEFAULT_MODEL.to_string())
                } else {
                    let mut ids: Vec<_> = services.keys().cloned().collect();
                    ids.sort();
                    ids.into_iter().next()
                }
            })
            .unwrap_or_else(|| PREFERRED_DEFAULT_MODEL.to_string());

        Self {
            services,
            default_model,
        }
    }

    /// Build a registry around explicit services (tests and embedding)
    #[cfg(test)]
    pub fn from_services(services: Vec<Arc<dyn LlmService>>) -> Self {
        let default_model = services
            .first()
            .map_or_else(|| PREFERRED_DEFAULT_MODEL.to_string(), |s| s.model_id().to_string());
        Self {
            services: services
                .into_iter()
                .map(|s| (s.model_id().to_string(), s))
                .collect(),
            default_model,
        }
    }

    fn try_create_model(
        model_def: &super::ModelDef,
        config: &LlmConfig,
    ) -> Option<Arc<dyn LlmService>> {
        let api_key = config.api_key_for(model_def.provider)?;

        match (model_def.factory)(&api_key, config.gateway.as_deref()) {
            Ok(service) => {
                let logged: Arc<dyn LlmService> = Arc::new(LoggingService::new(service));
                Some(Arc::new(RetryingService::new(logged)))
            }
            Err(e) => {
                tracing::warn!(model = %model_def.id, error = %e, "Skipping model");
                None
            }
        }
    }

    /// Get a model by ID
    pub fn get(&self, model_id: &str) -> Option<Arc<dyn LlmService>> {
        self.services.get(model_id).cloned()
    }

    /// Get the default model
    pub fn default(&self) -> Option<Arc<dyn LlmService>> {
        self.get(&self.default_model)
    }

    /// Get the default model ID
    pub fn default_model_id(&self) -> &str {
        &self.default_model
    }

    /// List all available model IDs
    pub fn available_models(&self) -> Vec<String> {
        let mut models: Vec<_> = self.services.keys().cloned().collect();
        models.sort();
        models
    }

    /// Get detailed information about available models
    pub fn available_model_info(&self) -> Vec<crate::api::ModelInfo> {
        all_models()
            .iter()
            .filter(|def| self.services.contains_key(def.id))
            .map(|def| crate::api::ModelInfo {
                id: def.id.to_string(),
                provider: def.provider.display_name().to_string(),
                description: def.description.to_string(),
            })
            .collect()
    }

    /// Check if any models are available
    pub fn has_models(&self) -> bool {
        !self.services.is_empty()
    }

    /// Get a cheap/fast model for auxiliary tasks like title generation.
    /// Falls back to the default model.
    pub fn get_cheap_model(&self) -> Option<Arc<dyn LlmService>> {
        all_models()
            .iter()
            .filter(|def| def.cheap)
            .find_map(|def| self.get(def.id))
            .or_else(|| self.default())
    }
}
