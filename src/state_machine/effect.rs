//! Effects produced by state transitions

use super::state::GenerationRequest;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the text generator for the next page
    RequestGeneration(GenerationRequest),

    /// Later pages of an abandoned branch were dropped
    BranchDiscarded { dropped_pages: usize },

    /// The final turn was accepted
    StoryConcluded { pages: usize },
}
