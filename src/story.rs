//! Story parameters, prompt construction and page parsing
//!
//! Everything here is pure: the controller hands the resulting
//! [`PromptSpec`]s to a text generator.

mod choices;
mod params;
mod prompt;

pub use choices::{extract_choices, narrative_part, ExtractedChoice};
#[allow(unused_imports)] // Public API re-exports
pub use params::{AgeGroup, NarrativeTemplate, StoryParameters, StorySetup, ValidationError};
pub use prompt::{continuation_prompt, illustration_prompt, opening_prompt, PromptSpec};
