//! API request and response types

use crate::runtime::{StoryController, StorySummary};
use crate::state_machine::{Page, SessionMode, StoryOption};
use crate::story::{extract_choices, ExtractedChoice, StorySetup};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to continue a story
#[derive(Debug, Deserialize)]
pub struct ContinueRequest {
    pub option: StoryOption,
}

/// One page as shown to the reader
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub index: usize,
    pub text: String,
    /// Option chosen on the previous page to reach this one
    pub option: Option<StoryOption>,
    /// Options offered at the end of this page
    pub choices: Vec<ExtractedChoice>,
}

impl PageView {
    fn new(index: usize, page: &Page) -> Self {
        Self {
            index,
            text: page.text.clone(),
            option: page.chosen,
            choices: extract_choices(&page.text),
        }
    }
}

/// Full state of a story
#[derive(Debug, Clone, Serialize)]
pub struct StoryView {
    pub id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub mode: SessionMode,
    pub turn_count: u32,
    pub max_turns: u32,
    pub cursor: usize,
    pub pages: Vec<PageView>,
    pub current_page: Option<PageView>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub can_continue: bool,
    pub setup: Option<StorySetup>,
}

impl StoryView {
    pub fn from_controller(controller: &StoryController) -> Self {
        let session = controller.session();
        let pages: Vec<PageView> = session
            .pages()
            .iter()
            .enumerate()
            .map(|(i, p)| PageView::new(i, p))
            .collect();

        Self {
            id: controller.id().to_string(),
            title: controller.title().map(str::to_string),
            created_at: controller.created_at(),
            mode: session.mode(),
            turn_count: session.turn_count(),
            max_turns: session.max_turns(),
            cursor: session.cursor(),
            current_page: pages.get(session.cursor()).cloned(),
            pages,
            can_go_back: session.can_go_back(),
            can_go_forward: session.can_go_forward(),
            can_continue: session.can_continue(),
            setup: controller.setup().cloned(),
        }
    }
}

/// Response with a single story
#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub story: StoryView,
}

/// Response with all stories
#[derive(Debug, Serialize)]
pub struct StoryListResponse {
    pub stories: Vec<StorySummary>,
}

/// Illustration hosted by the provider
#[derive(Debug, Serialize)]
pub struct IllustrationUrlResponse {
    pub url: String,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Model information for API responses
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub provider: String,
    pub description: String,
}

/// Response for available models
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub default: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, kind: &'static str) -> Self {
        Self {
            error: error.into(),
            kind,
        }
    }
}
