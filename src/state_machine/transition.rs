//! Pure state transition function
//!
//! Given the same session and event, `transition` always produces the same
//! next session and effects. No I/O happens here; the controller executes
//! the effects and feeds generation outcomes back in as events.

use super::state::{GenerationPurpose, GenerationRequest, Page, Session, SessionMode};
use super::{Effect, Event};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: Session) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Transitions the session refuses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("The story has not started yet")]
    NotStarted,
    #[error("The story has already started (reset it to begin a new one)")]
    AlreadyStarted,
    #[error("The story has concluded; no further choices are accepted")]
    Concluded,
    #[error("Already at the first page")]
    AtFirstPage,
    #[error("Already at the last page")]
    AtLastPage,
    #[error("Generated page no longer matches the session")]
    StaleGeneration,
    #[error("Generated page is empty")]
    EmptySegment,
}

/// Pure transition function
pub fn transition(state: &Session, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state.mode, event) {
        // ============================================================
        // Reset
        // ============================================================
        (_, Event::ResetRequested) => Ok(TransitionResult::new(Session::new(state.max_turns))),

        // ============================================================
        // Opening
        // ============================================================
        (SessionMode::AwaitingSetup, Event::StartRequested) => {
            let request = GenerationRequest {
                purpose: GenerationPurpose::Opening,
                directive: state.directive_for_turn(1),
                turn: 1,
            };
            Ok(TransitionResult::new(state.clone())
                .with_effect(Effect::RequestGeneration(request)))
        }

        (SessionMode::Reading | SessionMode::Concluded, Event::StartRequested) => {
            Err(TransitionError::AlreadyStarted)
        }

        (SessionMode::AwaitingSetup, Event::GenerationCompleted { request, text }) => {
            if request.purpose != GenerationPurpose::Opening || request.turn != 1 {
                return Err(TransitionError::StaleGeneration);
            }
            if text.trim().is_empty() {
                return Err(TransitionError::EmptySegment);
            }

            let mut next = state.clone();
            next.pages = vec![Page { text, chosen: None }];
            next.cursor = 0;
            next.turn_count = 1;
            Ok(settle_mode(next))
        }

        // ============================================================
        // Continuation
        // ============================================================
        (SessionMode::Reading, Event::ContinueRequested { option }) => {
            let source_text = state
                .current_page()
                .map(|p| p.text.clone())
                .ok_or(TransitionError::NotStarted)?;
            let turn = state.turn_count + 1;
            let request = GenerationRequest {
                purpose: GenerationPurpose::Continuation {
                    option,
                    from_page: state.cursor,
                    source_text,
                },
                directive: state.directive_for_turn(turn),
                turn,
            };
            // Nothing is truncated until the generated page arrives
            Ok(TransitionResult::new(state.clone())
                .with_effect(Effect::RequestGeneration(request)))
        }

        (SessionMode::AwaitingSetup, Event::ContinueRequested { .. }) => {
            Err(TransitionError::NotStarted)
        }

        (SessionMode::Concluded, Event::ContinueRequested { .. }) => {
            Err(TransitionError::Concluded)
        }

        (SessionMode::Reading, Event::GenerationCompleted { request, text }) => {
            accept_continuation(state, &request, text)
        }

        (SessionMode::Concluded, Event::GenerationCompleted { .. }) => {
            Err(TransitionError::StaleGeneration)
        }

        // A failed generation leaves every field untouched
        (_, Event::GenerationFailed { .. }) => Ok(TransitionResult::new(state.clone())),

        // ============================================================
        // Navigation
        // ============================================================
        (_, Event::BackRequested) => {
            if state.cursor == 0 {
                return Err(TransitionError::AtFirstPage);
            }
            let mut next = state.clone();
            next.cursor -= 1;
            Ok(TransitionResult::new(next))
        }

        (_, Event::ForwardRequested) => {
            if !state.can_go_forward() {
                return Err(TransitionError::AtLastPage);
            }
            let mut next = state.clone();
            next.cursor += 1;
            Ok(TransitionResult::new(next))
        }
    }
}

/// Truncate after the cursor and append the continuation in one step
fn accept_continuation(
    state: &Session,
    request: &GenerationRequest,
    text: String,
) -> Result<TransitionResult, TransitionError> {
    let GenerationPurpose::Continuation {
        option, from_page, ..
    } = request.purpose
    else {
        return Err(TransitionError::StaleGeneration);
    };
    if from_page != state.cursor || request.turn != state.turn_count + 1 {
        return Err(TransitionError::StaleGeneration);
    }
    if text.trim().is_empty() {
        return Err(TransitionError::EmptySegment);
    }

    let mut next = state.clone();
    let dropped_pages = next.pages.len() - (next.cursor + 1);
    next.pages.truncate(next.cursor + 1);
    next.pages.push(Page {
        text,
        chosen: Some(option),
    });
    next.cursor = next.pages.len() - 1;
    next.turn_count = request.turn.min(next.max_turns);

    let discarded = (dropped_pages > 0).then_some(Effect::BranchDiscarded { dropped_pages });
    let result = settle_mode(next);
    Ok(TransitionResult {
        effects: discarded.into_iter().chain(result.effects).collect(),
        new_state: result.new_state,
    })
}

/// Pick Reading or Concluded from the turn count after a page was accepted
fn settle_mode(mut next: Session) -> TransitionResult {
    if next.turn_count >= next.max_turns {
        next.mode = SessionMode::Concluded;
        let pages = next.pages.len();
        TransitionResult::new(next).with_effect(Effect::StoryConcluded { pages })
    } else {
        next.mode = SessionMode::Reading;
        TransitionResult::new(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::state::{Directive, StoryOption};

    /// Drive a session through start plus `continuations` turns
    fn session_with(max_turns: u32, texts: &[&str]) -> Session {
        let mut session = Session::new(max_turns);
        for (i, text) in texts.iter().enumerate() {
            let event = if i == 0 {
                Event::StartRequested
            } else {
                Event::ContinueRequested {
                    option: StoryOption::One,
                }
            };
            session = complete(&session, event, text);
        }
        session
    }

    /// Apply a reader event, then complete the requested generation
    fn complete(session: &Session, event: Event, text: &str) -> Session {
        let requested = transition(session, event).unwrap();
        let request = match requested.effects.as_slice() {
            [Effect::RequestGeneration(request)] => request.clone(),
            other => panic!("expected one generation request, got {other:?}"),
        };
        transition(
            &requested.new_state,
            Event::GenerationCompleted {
                request,
                text: text.to_string(),
            },
        )
        .unwrap()
        .new_state
    }

    fn texts(session: &Session) -> Vec<&str> {
        session.pages().iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn test_start_requests_opening_without_changing_state() {
        let session = Session::new(3);
        let result = transition(&session, Event::StartRequested).unwrap();
        assert_eq!(result.new_state, session);
        assert_eq!(
            result.effects,
            vec![Effect::RequestGeneration(GenerationRequest {
                purpose: GenerationPurpose::Opening,
                directive: Directive::OfferChoices,
                turn: 1,
            })]
        );
    }

    #[test]
    fn test_opening_completion_starts_reading() {
        let session = session_with(3, &["A"]);
        assert_eq!(texts(&session), vec!["A"]);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.turn_count(), 1);
        assert_eq!(session.mode(), SessionMode::Reading);
    }

    #[test]
    fn test_single_turn_story_concludes_immediately() {
        let session = Session::new(1);
        let result = transition(&session, Event::StartRequested).unwrap();
        let Effect::RequestGeneration(request) = &result.effects[0] else {
            panic!("expected generation request");
        };
        assert_eq!(request.directive, Directive::Conclude);

        let done = transition(
            &session,
            Event::GenerationCompleted {
                request: request.clone(),
                text: "The whole story".to_string(),
            },
        )
        .unwrap();
        assert_eq!(done.new_state.mode(), SessionMode::Concluded);
        assert_eq!(done.effects, vec![Effect::StoryConcluded { pages: 1 }]);
    }

    #[test]
    fn test_three_turn_directives() {
        let first = session_with(3, &["A"]);
        let result = transition(
            &first,
            Event::ContinueRequested {
                option: StoryOption::Two,
            },
        )
        .unwrap();
        let Effect::RequestGeneration(request) = &result.effects[0] else {
            panic!("expected generation request");
        };
        assert_eq!(request.directive, Directive::OfferChoices);
        assert_eq!(request.turn, 2);

        let second = session_with(3, &["A", "B"]);
        assert_eq!(second.turn_count(), 2);
        assert_eq!(second.mode(), SessionMode::Reading);
        let result = transition(
            &second,
            Event::ContinueRequested {
                option: StoryOption::One,
            },
        )
        .unwrap();
        let Effect::RequestGeneration(request) = &result.effects[0] else {
            panic!("expected generation request");
        };
        assert_eq!(request.directive, Directive::Conclude);

        let third = session_with(3, &["A", "B", "C"]);
        assert_eq!(third.turn_count(), 3);
        assert_eq!(third.mode(), SessionMode::Concluded);
    }

    #[test]
    fn test_continue_from_earlier_page_discards_branch() {
        let session = session_with(5, &["A", "B", "C"]);
        let session = transition(&session, Event::BackRequested).unwrap().new_state;
        let session = transition(&session, Event::BackRequested).unwrap().new_state;
        assert_eq!(session.cursor(), 0);

        let requested = transition(
            &session,
            Event::ContinueRequested {
                option: StoryOption::One,
            },
        )
        .unwrap();
        // Still three pages while the request is in flight
        assert_eq!(requested.new_state.pages().len(), 3);

        let Effect::RequestGeneration(request) = &requested.effects[0] else {
            panic!("expected generation request");
        };
        let done = transition(
            &requested.new_state,
            Event::GenerationCompleted {
                request: request.clone(),
                text: "D".to_string(),
            },
        )
        .unwrap();
        assert_eq!(texts(&done.new_state), vec!["A", "D"]);
        assert_eq!(done.new_state.cursor(), 1);
        assert_eq!(done.new_state.turn_count(), 4);
        assert_eq!(
            done.effects,
            vec![Effect::BranchDiscarded { dropped_pages: 2 }]
        );
    }

    #[test]
    fn test_continuation_records_chosen_option() {
        let session = session_with(3, &["A"]);
        let session = complete(
            &session,
            Event::ContinueRequested {
                option: StoryOption::Two,
            },
            "B",
        );
        assert_eq!(session.pages()[1].chosen, Some(StoryOption::Two));
        assert_eq!(session.pages()[0].chosen, None);
    }

    #[test]
    fn test_failed_generation_changes_nothing() {
        let session = session_with(3, &["A", "B"]);
        let session = transition(&session, Event::BackRequested).unwrap().new_state;
        let requested = transition(
            &session,
            Event::ContinueRequested {
                option: StoryOption::Two,
            },
        )
        .unwrap();
        let Effect::RequestGeneration(request) = &requested.effects[0] else {
            panic!("expected generation request");
        };
        let failed = transition(
            &requested.new_state,
            Event::GenerationFailed {
                request: request.clone(),
                message: "rate limited".to_string(),
            },
        )
        .unwrap();
        assert_eq!(failed.new_state, session);
        assert!(failed.effects.is_empty());
    }

    #[test]
    fn test_continue_rejected_outside_reading() {
        let empty = Session::new(3);
        assert_eq!(
            transition(
                &empty,
                Event::ContinueRequested {
                    option: StoryOption::One
                }
            )
            .unwrap_err(),
            TransitionError::NotStarted
        );

        let done = session_with(2, &["A", "B"]);
        assert_eq!(done.mode(), SessionMode::Concluded);
        assert_eq!(
            transition(
                &done,
                Event::ContinueRequested {
                    option: StoryOption::One
                }
            )
            .unwrap_err(),
            TransitionError::Concluded
        );
    }

    #[test]
    fn test_start_rejected_once_started() {
        let session = session_with(3, &["A"]);
        assert_eq!(
            transition(&session, Event::StartRequested).unwrap_err(),
            TransitionError::AlreadyStarted
        );
    }

    #[test]
    fn test_go_back_at_first_page_rejected() {
        let session = session_with(3, &["A"]);
        assert_eq!(
            transition(&session, Event::BackRequested).unwrap_err(),
            TransitionError::AtFirstPage
        );
        assert_eq!(
            transition(&Session::new(3), Event::BackRequested).unwrap_err(),
            TransitionError::AtFirstPage
        );
    }

    #[test]
    fn test_go_back_only_moves_cursor() {
        let session = session_with(3, &["A", "B", "C"]);
        let back = transition(&session, Event::BackRequested).unwrap().new_state;
        assert_eq!(back.cursor(), 1);
        assert_eq!(back.pages(), session.pages());
        assert_eq!(back.turn_count(), session.turn_count());
        assert_eq!(back.mode(), SessionMode::Concluded);
    }

    #[test]
    fn test_forward_after_back() {
        let session = session_with(3, &["A", "B"]);
        assert_eq!(
            transition(&session, Event::ForwardRequested).unwrap_err(),
            TransitionError::AtLastPage
        );
        let back = transition(&session, Event::BackRequested).unwrap().new_state;
        let forward = transition(&back, Event::ForwardRequested).unwrap().new_state;
        assert_eq!(forward, session);
    }

    #[test]
    fn test_stale_completion_rejected() {
        let session = session_with(4, &["A", "B"]);
        let requested = transition(
            &session,
            Event::ContinueRequested {
                option: StoryOption::One,
            },
        )
        .unwrap();
        let Effect::RequestGeneration(request) = &requested.effects[0] else {
            panic!("expected generation request");
        };
        // Cursor moved after the request was issued
        let moved = transition(&session, Event::BackRequested).unwrap().new_state;
        assert_eq!(
            transition(
                &moved,
                Event::GenerationCompleted {
                    request: request.clone(),
                    text: "late".to_string(),
                }
            )
            .unwrap_err(),
            TransitionError::StaleGeneration
        );
    }

    #[test]
    fn test_empty_segment_rejected() {
        let session = Session::new(3);
        let result = transition(
            &session,
            Event::GenerationCompleted {
                request: GenerationRequest {
                    purpose: GenerationPurpose::Opening,
                    directive: Directive::OfferChoices,
                    turn: 1,
                },
                text: "  \n ".to_string(),
            },
        );
        assert_eq!(result.unwrap_err(), TransitionError::EmptySegment);
    }

    #[test]
    fn test_reset_from_any_state() {
        for session in [
            Session::new(3),
            session_with(3, &["A"]),
            session_with(3, &["A", "B", "C"]),
        ] {
            let reset = transition(&session, Event::ResetRequested).unwrap().new_state;
            assert_eq!(reset, Session::new(3));
            assert_eq!(reset.mode(), SessionMode::AwaitingSetup);
            assert_eq!(reset.turn_count(), 0);
            assert_eq!(reset.cursor(), 0);
            assert!(reset.pages().is_empty());
        }
    }
}
