//! Story controller: drives one session through the state machine
//!
//! Every reader operation is one pure transition plus the effects it asks
//! for. Generations run inline, so an operation returns only once the
//! writer has answered or failed.

use super::traits::{Illustration, Illustrator, Narrator, TextGenerator};
use crate::config::StoryConfig;
use crate::export::DocumentExporter;
use crate::llm::LlmError;
use crate::state_machine::{
    transition, Effect, Event, GenerationPurpose, GenerationRequest, Page, Session,
    StoryOption, TransitionError,
};
use crate::story::{
    continuation_prompt, illustration_prompt, narrative_part, opening_prompt, StoryParameters,
    StorySetup, ValidationError,
};
use crate::title_generator::{fallback_title, generate_title, title_slug};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by story operations
#[derive(Debug, Clone, Error)]
pub enum StoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Story generation failed: {0}")]
    GenerationFailure(LlmError),
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
    #[error("Page {0} does not exist")]
    PageNotFound(usize),
    #[error("{0} is not configured")]
    Unavailable(&'static str),
}

impl StoryError {
    pub fn kind(&self) -> &'static str {
        match self {
            StoryError::Validation(_) => "validation",
            StoryError::GenerationFailure(_) => "generation_failure",
            StoryError::InvalidTransition(_) => "invalid_transition",
            StoryError::PageNotFound(_) => "not_found",
            StoryError::Unavailable(_) => "unavailable",
        }
    }
}

/// External services a story talks to
#[derive(Clone)]
pub struct Collaborators {
    pub writer: Arc<dyn TextGenerator>,
    /// Cheap model for titles; without one the fallback title is used
    pub titler: Option<Arc<dyn TextGenerator>>,
    pub illustrator: Option<Arc<dyn Illustrator>>,
    pub narrator: Option<Arc<dyn Narrator>>,
    pub exporter: Arc<dyn DocumentExporter>,
}

/// A finished export
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Media request captured from a page, run without holding the story
pub struct MediaJob<C: ?Sized> {
    session_id: String,
    page: usize,
    input: String,
    collaborator: Arc<C>,
}

pub type IllustrationJob = MediaJob<dyn Illustrator>;
pub type NarrationJob = MediaJob<dyn Narrator>;

impl<C: ?Sized> std::fmt::Debug for MediaJob<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaJob")
            .field("session_id", &self.session_id)
            .field("page", &self.page)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

impl<C: ?Sized> MediaJob<C> {
    fn failed(&self, what: &str, error: LlmError) -> StoryError {
        tracing::warn!(
            session_id = %self.session_id,
            page = self.page,
            error = %error.message,
            "{what} failed"
        );
        StoryError::GenerationFailure(error)
    }
}

impl IllustrationJob {
    pub async fn run(self) -> Result<Illustration, StoryError> {
        self.collaborator
            .render(&self.input)
            .await
            .map_err(|e| self.failed("Illustration", e))
    }
}

impl NarrationJob {
    pub async fn run(self) -> Result<Vec<u8>, StoryError> {
        self.collaborator
            .synthesize(&self.input)
            .await
            .map_err(|e| self.failed("Narration", e))
    }
}

/// One story session and the collaborators serving it
pub struct StoryController {
    id: String,
    session: Session,
    setup: Option<StorySetup>,
    title: Option<String>,
    collaborators: Collaborators,
    config: StoryConfig,
    created_at: DateTime<Utc>,
}

impl StoryController {
    pub fn new(id: String, config: StoryConfig, collaborators: Collaborators) -> Self {
        Self {
            id,
            session: Session::new(config.max_turns),
            setup: None,
            title: None,
            collaborators,
            config,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn setup(&self) -> Option<&StorySetup> {
        self.setup.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // ------------------------------------------------------------------
    // Reader operations
    // ------------------------------------------------------------------

    /// Validate parameters and generate the opening page
    pub async fn start_session(&mut self, params: StoryParameters) -> Result<&Session, StoryError> {
        let setup = params.validate(self.config.default_creativity)?;
        tracing::info!(
            session_id = %self.id,
            age_group = setup.age_group.label(),
            theme = %setup.theme,
            "Starting story"
        );

        self.process_event(Event::StartRequested, &setup).await?;

        let opening = self
            .session
            .current_page()
            .map(|p| p.text.clone())
            .unwrap_or_default();
        let title = match &self.collaborators.titler {
            Some(titler) => generate_title(&setup, &opening, titler.as_ref()).await,
            None => None,
        };
        self.title = Some(title.unwrap_or_else(|| fallback_title(&setup)));
        self.setup = Some(setup);
        Ok(&self.session)
    }

    /// Generate the next page following `option` from the page under the cursor
    pub async fn continue_session(&mut self, option: StoryOption) -> Result<&Session, StoryError> {
        let Some(setup) = self.setup.clone() else {
            return Err(TransitionError::NotStarted.into());
        };
        self.process_event(Event::ContinueRequested { option }, &setup)
            .await?;
        Ok(&self.session)
    }

    pub fn go_back(&mut self) -> Result<&Session, StoryError> {
        self.apply(Event::BackRequested)?;
        Ok(&self.session)
    }

    pub fn go_forward(&mut self) -> Result<&Session, StoryError> {
        self.apply(Event::ForwardRequested)?;
        Ok(&self.session)
    }

    /// Discard everything and wait for new parameters
    pub fn reset(&mut self) -> &Session {
        if let Ok(result) = transition(&self.session, Event::ResetRequested) {
            self.session = result.new_state;
        }
        tracing::info!(session_id = %self.id, "Story reset");
        self.setup = None;
        self.title = None;
        &self.session
    }

    // ------------------------------------------------------------------
    // Views and media
    // ------------------------------------------------------------------

    /// Text from the opening page up to the cursor
    pub fn story_text(&self) -> String {
        self.session
            .visible_path()
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn page(&self, index: usize) -> Result<(&Page, &StorySetup), StoryError> {
        let page = self
            .session
            .page(index)
            .ok_or(StoryError::PageNotFound(index))?;
        let setup = self.setup.as_ref().ok_or(StoryError::PageNotFound(index))?;
        Ok((page, setup))
    }

    /// Scene description the illustrator receives for a page
    pub fn illustration_prompt(&self, index: usize) -> Result<String, StoryError> {
        let (page, setup) = self.page(index)?;
        Ok(illustration_prompt(setup, &page.text))
    }

    /// Illustration request for a page, runnable after the story lock is released
    pub fn illustration_job(&self, index: usize) -> Result<IllustrationJob, StoryError> {
        let illustrator = self
            .collaborators
            .illustrator
            .clone()
            .ok_or(StoryError::Unavailable("Illustration"))?;
        Ok(MediaJob {
            session_id: self.id.clone(),
            page: index,
            input: self.illustration_prompt(index)?,
            collaborator: illustrator,
        })
    }

    /// Narration request for a page's prose, without the option labels
    pub fn narration_job(&self, index: usize) -> Result<NarrationJob, StoryError> {
        let narrator = self
            .collaborators
            .narrator
            .clone()
            .ok_or(StoryError::Unavailable("Narration"))?;
        let (page, _) = self.page(index)?;
        Ok(MediaJob {
            session_id: self.id.clone(),
            page: index,
            input: narrative_part(&page.text).to_string(),
            collaborator: narrator,
        })
    }

    /// Document of the pages read so far
    pub fn export_document(&self) -> Result<ExportedDocument, StoryError> {
        if self.session.pages().is_empty() {
            return Err(TransitionError::NotStarted.into());
        }
        let title = self.title.as_deref().unwrap_or("Story");
        let exporter = &self.collaborators.exporter;
        let bytes = exporter.export(title, &self.story_text());
        tracing::info!(session_id = %self.id, bytes = bytes.len(), "Story exported");
        Ok(ExportedDocument {
            file_name: format!("{}.{}", title_slug(title), exporter.extension()),
            content_type: exporter.content_type(),
            bytes,
        })
    }

    // ------------------------------------------------------------------
    // Event processing
    // ------------------------------------------------------------------

    /// Apply an event that needs no collaborator
    fn apply(&mut self, event: Event) -> Result<(), TransitionError> {
        let result = transition(&self.session, event)?;
        self.session = result.new_state;
        debug_assert!(result.effects.is_empty());
        Ok(())
    }

    /// Run an event and every event its effects produce
    async fn process_event(&mut self, event: Event, setup: &StorySetup) -> Result<(), StoryError> {
        let mut failure = None;
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = transition(&self.session, current_event).map_err(|e| match e {
                TransitionError::EmptySegment => {
                    StoryError::GenerationFailure(LlmError::empty_content("Writer returned no text"))
                }
                other => StoryError::InvalidTransition(other),
            })?;

            self.session = result.new_state;
            tracing::debug!(
                session_id = %self.id,
                mode = ?self.session.mode(),
                turn = self.session.turn_count(),
                pages = self.session.pages().len(),
                cursor = self.session.cursor(),
                "Session updated"
            );

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect, setup, &mut failure).await
                {
                    events_to_process.push(generated_event);
                }
            }
        }

        match failure {
            Some(e) => Err(StoryError::GenerationFailure(e)),
            None => Ok(()),
        }
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(
        &self,
        effect: Effect,
        setup: &StorySetup,
        failure: &mut Option<LlmError>,
    ) -> Option<Event> {
        match effect {
            Effect::RequestGeneration(request) => {
                Some(self.generate(request, setup, failure).await)
            }
            Effect::BranchDiscarded { dropped_pages } => {
                tracing::info!(session_id = %self.id, dropped_pages, "Discarded abandoned branch");
                None
            }
            Effect::StoryConcluded { pages } => {
                tracing::info!(session_id = %self.id, pages, "Story concluded");
                None
            }
        }
    }

    async fn generate(
        &self,
        request: GenerationRequest,
        setup: &StorySetup,
        failure: &mut Option<LlmError>,
    ) -> Event {
        let spec = match &request.purpose {
            GenerationPurpose::Opening => opening_prompt(setup, request.directive),
            GenerationPurpose::Continuation {
                option,
                source_text,
                ..
            } => continuation_prompt(setup, source_text, *option, request.directive),
        };

        let writer = &self.collaborators.writer;
        tracing::info!(
            session_id = %self.id,
            turn = request.turn,
            directive = ?request.directive,
            model = %writer.model_id(),
            "Requesting page"
        );

        match writer.generate(&spec).await {
            Ok(text) => Event::GenerationCompleted { request, text },
            Err(e) => {
                tracing::warn!(
                    session_id = %self.id,
                    turn = request.turn,
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Page generation failed"
                );
                let message = e.message.clone();
                *failure = Some(e);
                Event::GenerationFailed { request, message }
            }
        }
    }
}
