//! Story session state types

use serde::{Deserialize, Serialize};

/// Default `MAX_TURNS`: the opening counts as turn 1
pub const DEFAULT_MAX_TURNS: u32 = 3;

// ============================================================================
// Options and Modes
// ============================================================================

/// One of the two branches offered at the end of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StoryOption {
    One,
    Two,
}

impl StoryOption {
    pub fn number(self) -> u8 {
        match self {
            StoryOption::One => 1,
            StoryOption::Two => 2,
        }
    }

    /// Label used in prompts and generated text
    pub fn label(self) -> &'static str {
        match self {
            StoryOption::One => "Choice 1",
            StoryOption::Two => "Choice 2",
        }
    }
}

impl TryFrom<u8> for StoryOption {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(StoryOption::One),
            2 => Ok(StoryOption::Two),
            other => Err(format!("option must be 1 or 2, got {other}")),
        }
    }
}

impl From<StoryOption> for u8 {
    fn from(option: StoryOption) -> Self {
        option.number()
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// No content yet
    #[default]
    AwaitingSetup,
    /// Content exists and more turns remain
    Reading,
    /// All turns used; terminal except for reset
    Concluded,
}

/// What a generation request asks the writer to end the segment with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// Stop at a decision point with exactly two labelled options
    OfferChoices,
    /// Bring the story to a conclusive ending with no options
    Conclude,
}

// ============================================================================
// Generation Requests
// ============================================================================

/// Why a generation was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationPurpose {
    /// First page from the story parameters
    Opening,
    /// Next page branching from `from_page`
    Continuation {
        option: StoryOption,
        from_page: usize,
        source_text: String,
    },
}

/// A generation the session is waiting on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub purpose: GenerationPurpose,
    pub directive: Directive,
    /// Turn number the generated page will become
    pub turn: u32,
}

// ============================================================================
// Session
// ============================================================================

/// One generated page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub text: String,
    /// Option chosen on the previous page to reach this one
    pub chosen: Option<StoryOption>,
}

/// Branching story session: pages, cursor and turn count.
///
/// Fields are only changed through [`super::transition`], which keeps
/// `cursor` inside `pages` and `turn_count <= max_turns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub(super) pages: Vec<Page>,
    pub(super) cursor: usize,
    pub(super) turn_count: u32,
    pub(super) max_turns: u32,
    pub(super) mode: SessionMode,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl Session {
    /// Empty session; `max_turns` below 1 is raised to 1
    pub fn new(max_turns: u32) -> Self {
        Self {
            pages: Vec::new(),
            cursor: 0,
            turn_count: 0,
            max_turns: max_turns.max(1),
            mode: SessionMode::AwaitingSetup,
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Page under the cursor
    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.cursor)
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.pages.len()
    }

    pub fn can_continue(&self) -> bool {
        self.mode == SessionMode::Reading
    }

    /// Directive for the generation that would become turn `turn`
    pub fn directive_for_turn(&self, turn: u32) -> Directive {
        if turn >= self.max_turns {
            Directive::Conclude
        } else {
            Directive::OfferChoices
        }
    }

    /// Pages from the opening up to and including the cursor
    pub fn visible_path(&self) -> &[Page] {
        if self.pages.is_empty() {
            &[]
        } else {
            &self.pages[..=self.cursor]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new(3);
        assert!(session.pages().is_empty());
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.turn_count(), 0);
        assert_eq!(session.mode(), SessionMode::AwaitingSetup);
        assert!(session.current_page().is_none());
        assert!(session.visible_path().is_empty());
    }

    #[test]
    fn test_zero_max_turns_raised_to_one() {
        assert_eq!(Session::new(0).max_turns(), 1);
    }

    #[test]
    fn test_directive_for_turn() {
        let session = Session::new(3);
        assert_eq!(session.directive_for_turn(1), Directive::OfferChoices);
        assert_eq!(session.directive_for_turn(2), Directive::OfferChoices);
        assert_eq!(session.directive_for_turn(3), Directive::Conclude);
        assert_eq!(Session::new(1).directive_for_turn(1), Directive::Conclude);
    }

    #[test]
    fn test_option_wire_format() {
        assert_eq!(serde_json::to_string(&StoryOption::Two).unwrap(), "2");
        let one: StoryOption = serde_json::from_str("1").unwrap();
        assert_eq!(one, StoryOption::One);
        assert!(serde_json::from_str::<StoryOption>("3").is_err());
        assert!(serde_json::from_str::<StoryOption>("0").is_err());
    }

    #[test]
    fn test_mode_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionMode::AwaitingSetup).unwrap(),
            "\"awaiting_setup\""
        );
    }
}
