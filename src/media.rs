//! Hosted illustration and narration collaborators
//!
//! Both are optional: without credentials the story still works, only
//! the picture and audio endpoints report them as unavailable.

mod illustrator;
mod narrator;

pub use illustrator::OpenAIIllustrator;
pub use narrator::OpenAINarrator;

use crate::config::MediaConfig;
use crate::llm::REQUEST_TIMEOUT;
use crate::runtime::{Illustrator, Narrator};
use reqwest::Client;
use std::sync::Arc;

fn http_client() -> Result<Client, String> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {e}"))
}

/// Media collaborators available for this configuration
pub struct MediaServices {
    pub illustrator: Option<Arc<dyn Illustrator>>,
    pub narrator: Option<Arc<dyn Narrator>>,
}

impl MediaServices {
    pub fn from_config(config: &MediaConfig) -> Self {
        let Some(api_key) = config.credentials() else {
            tracing::info!("No OpenAI credentials; illustration and narration disabled");
            return Self {
                illustrator: None,
                narrator: None,
            };
        };

        let illustrator = match OpenAIIllustrator::new(api_key.clone(), config) {
            Ok(i) => Some(Arc::new(i) as Arc<dyn Illustrator>),
            Err(e) => {
                tracing::warn!(error = %e, "Illustration disabled");
                None
            }
        };
        let narrator = match OpenAINarrator::new(api_key, config) {
            Ok(n) => Some(Arc::new(n) as Arc<dyn Narrator>),
            Err(e) => {
                tracing::warn!(error = %e, "Narration disabled");
                None
            }
        };

        Self {
            illustrator,
            narrator,
        }
    }
}
