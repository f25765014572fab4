//! Property-based tests for the story state machine
//!
//! Sessions are driven by arbitrary reader actions, each generation
//! resolved by an arbitrary writer outcome.

use super::state::*;
use super::transition::*;
use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone)]
enum ReaderAction {
    Start,
    Continue(StoryOption),
    Back,
    Forward,
    Reset,
}

#[derive(Debug, Clone)]
enum WriterOutcome {
    Page(String),
    Blank,
    Failure,
}

fn arb_option() -> impl Strategy<Value = StoryOption> {
    prop_oneof![Just(StoryOption::One), Just(StoryOption::Two)]
}

fn arb_action() -> impl Strategy<Value = ReaderAction> {
    prop_oneof![
        2 => Just(ReaderAction::Start),
        4 => arb_option().prop_map(ReaderAction::Continue),
        3 => Just(ReaderAction::Back),
        2 => Just(ReaderAction::Forward),
        1 => Just(ReaderAction::Reset),
    ]
}

fn arb_outcome() -> impl Strategy<Value = WriterOutcome> {
    prop_oneof![
        6 => "[a-zA-Z ]{1,40}".prop_map(|t| WriterOutcome::Page(format!("page {t}"))),
        1 => Just(WriterOutcome::Blank),
        2 => Just(WriterOutcome::Failure),
    ]
}

fn arb_steps() -> impl Strategy<Value = Vec<(ReaderAction, WriterOutcome)>> {
    proptest::collection::vec((arb_action(), arb_outcome()), 0..30)
}

// ============================================================================
// Helpers
// ============================================================================

fn to_event(action: &ReaderAction) -> Event {
    match action {
        ReaderAction::Start => Event::StartRequested,
        ReaderAction::Continue(option) => Event::ContinueRequested { option: *option },
        ReaderAction::Back => Event::BackRequested,
        ReaderAction::Forward => Event::ForwardRequested,
        ReaderAction::Reset => Event::ResetRequested,
    }
}

fn resolve(state: &Session, request: GenerationRequest, outcome: &WriterOutcome) -> Session {
    let event = match outcome {
        WriterOutcome::Page(text) => Event::GenerationCompleted {
            request,
            text: text.clone(),
        },
        WriterOutcome::Blank => Event::GenerationCompleted {
            request,
            text: "   ".to_string(),
        },
        WriterOutcome::Failure => Event::GenerationFailed {
            request,
            message: "writer unavailable".to_string(),
        },
    };
    match transition(state, event) {
        Ok(result) => result.new_state,
        Err(_) => state.clone(),
    }
}

/// Apply one reader action and resolve any generation it requests
fn step(state: &Session, action: &ReaderAction, outcome: &WriterOutcome) -> Session {
    let Ok(result) = transition(state, to_event(action)) else {
        return state.clone();
    };
    let request = result.effects.iter().find_map(|effect| match effect {
        Effect::RequestGeneration(request) => Some(request.clone()),
        _ => None,
    });
    match request {
        Some(request) => resolve(&result.new_state, request, outcome),
        None => result.new_state,
    }
}

fn is_valid_session(session: &Session) -> bool {
    let pages = session.pages().len();
    let cursor_ok = if pages == 0 {
        session.cursor() == 0
    } else {
        session.cursor() < pages
    };
    let mode_ok = match session.mode() {
        SessionMode::AwaitingSetup => pages == 0 && session.turn_count() == 0,
        SessionMode::Reading => pages > 0 && session.turn_count() < session.max_turns(),
        SessionMode::Concluded => pages > 0 && session.turn_count() == session.max_turns(),
    };
    cursor_ok && mode_ok && session.turn_count() <= session.max_turns()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: every reachable session is valid
    #[test]
    fn prop_sessions_stay_valid(max_turns in 1u32..6, steps in arb_steps()) {
        let mut session = Session::new(max_turns);
        for (action, outcome) in &steps {
            session = step(&session, action, outcome);
            prop_assert!(is_valid_session(&session), "Invalid session: {:?}", session);
        }
    }

    // Invariant 2: a failed generation leaves the session untouched
    #[test]
    fn prop_failed_generation_changes_nothing(
        max_turns in 1u32..6,
        steps in arb_steps(),
        action in prop_oneof![
            Just(ReaderAction::Start),
            arb_option().prop_map(ReaderAction::Continue),
        ],
    ) {
        let mut session = Session::new(max_turns);
        for (a, outcome) in &steps {
            session = step(&session, a, outcome);
        }
        let failed = step(&session, &action, &WriterOutcome::Failure);
        prop_assert_eq!(&failed, &session);
        let blank = step(&session, &action, &WriterOutcome::Blank);
        prop_assert_eq!(blank.pages(), session.pages());
    }

    // Invariant 3: an accepted continuation lands on the last page
    #[test]
    fn prop_continuation_lands_on_last_page(
        steps in arb_steps(),
        option in arb_option(),
    ) {
        let mut session = Session::new(8);
        for (action, outcome) in &steps {
            session = step(&session, action, outcome);
        }
        if session.mode() == SessionMode::Reading {
            let before = session.clone();
            let after = step(
                &session,
                &ReaderAction::Continue(option),
                &WriterOutcome::Page("next".to_string()),
            );
            prop_assert_eq!(after.cursor(), after.pages().len() - 1);
            prop_assert_eq!(after.pages().len(), before.cursor() + 2);
            prop_assert_eq!(&after.pages()[..=before.cursor()], &before.pages()[..=before.cursor()]);
            prop_assert_eq!(after.turn_count(), before.turn_count() + 1);
        }
    }

    // Invariant 4: going back only moves the cursor
    #[test]
    fn prop_back_only_moves_cursor(max_turns in 1u32..6, steps in arb_steps()) {
        let mut session = Session::new(max_turns);
        for (action, outcome) in &steps {
            session = step(&session, action, outcome);
        }
        match transition(&session, Event::BackRequested) {
            Ok(result) => {
                let back = result.new_state;
                prop_assert_eq!(back.cursor() + 1, session.cursor());
                prop_assert_eq!(back.pages(), session.pages());
                prop_assert_eq!(back.turn_count(), session.turn_count());
                prop_assert_eq!(back.mode(), session.mode());
            }
            Err(e) => {
                prop_assert_eq!(e, TransitionError::AtFirstPage);
                prop_assert_eq!(session.cursor(), 0);
            }
        }
    }

    // Invariant 5: reset always returns to an empty session
    #[test]
    fn prop_reset_empties_session(max_turns in 1u32..6, steps in arb_steps()) {
        let mut session = Session::new(max_turns);
        for (action, outcome) in &steps {
            session = step(&session, action, outcome);
        }
        let reset = transition(&session, Event::ResetRequested).unwrap().new_state;
        prop_assert_eq!(reset, Session::new(max_turns));
    }

    // Invariant 6: concluded sessions never accept continuations
    #[test]
    fn prop_concluded_rejects_continue(max_turns in 1u32..4, option in arb_option()) {
        let mut session = Session::new(max_turns);
        for _ in 0..max_turns {
            let action = if session.pages().is_empty() {
                ReaderAction::Start
            } else {
                ReaderAction::Continue(option)
            };
            session = step(&session, &action, &WriterOutcome::Page("more".to_string()));
        }
        prop_assert_eq!(session.mode(), SessionMode::Concluded);
        prop_assert_eq!(
            transition(&session, Event::ContinueRequested { option }).unwrap_err(),
            TransitionError::Concluded
        );
    }
}
