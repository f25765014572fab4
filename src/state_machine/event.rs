//! Events that drive a story session

use super::state::{GenerationRequest, StoryOption};

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Reader events
    StartRequested,
    ContinueRequested { option: StoryOption },
    BackRequested,
    ForwardRequested,
    ResetRequested,

    // Writer events
    GenerationCompleted {
        request: GenerationRequest,
        text: String,
    },
    GenerationFailed {
        request: GenerationRequest,
        message: String,
    },
}
