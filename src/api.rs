//! HTTP API for Enchanted Reader

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::config::AppConfig;
use crate::export::PdfExporter;
use crate::llm::ModelRegistry;
use crate::media::MediaServices;
use crate::runtime::{Collaborators, RegistryTextGenerator, SessionManager, TextGenerator};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub llm_registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionManager>, llm_registry: Arc<ModelRegistry>) -> Self {
        Self {
            sessions,
            llm_registry,
        }
    }

    /// Wire production collaborators from configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let llm_registry = Arc::new(ModelRegistry::new(&config.llm));
        let media = MediaServices::from_config(&config.media);

        let writer: Arc<dyn TextGenerator> =
            Arc::new(RegistryTextGenerator::default_model(llm_registry.clone()));
        let titler = RegistryTextGenerator::cheap_model(llm_registry.clone())
            .map(|t| Arc::new(t) as Arc<dyn TextGenerator>);

        let collaborators = Collaborators {
            writer,
            titler,
            illustrator: media.illustrator,
            narrator: media.narrator,
            exporter: Arc::new(PdfExporter::with_font_files(&config.export.font_paths)),
        };
        let sessions = Arc::new(SessionManager::new(collaborators, config.story));
        Self::new(sessions, llm_registry)
    }
}
