//! Locating the two labelled options in a generated page

use crate::state_machine::StoryOption;
use serde::Serialize;
use std::sync::OnceLock;

/// Matches `Choice 1: ...` lines, tolerating markdown emphasis and headings
const CHOICE_PATTERN: &str =
    r"(?im)^[\s>#*_-]*choice\s*([12])\s*[*_]*\s*[:.)]\s*[*_]*\s*(.*?)[\s*_]*$";

fn choice_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(CHOICE_PATTERN).expect("choice pattern is valid"))
}

/// One option offered at the end of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedChoice {
    pub option: StoryOption,
    pub text: String,
}

/// Options labelled in `text`, first occurrence of each, in option order.
/// Concluding pages yield nothing.
pub fn extract_choices(text: &str) -> Vec<ExtractedChoice> {
    let mut found: Vec<ExtractedChoice> = Vec::new();
    for caps in choice_regex().captures_iter(text) {
        let option = match &caps[1] {
            "1" => StoryOption::One,
            _ => StoryOption::Two,
        };
        if found.iter().any(|c| c.option == option) {
            continue;
        }
        found.push(ExtractedChoice {
            option,
            text: caps[2].trim().to_string(),
        });
    }
    found.sort_by_key(|c| c.option.number());
    found
}

/// The story prose before the first labelled option
pub fn narrative_part(text: &str) -> &str {
    choice_regex()
        .find(text)
        .and_then(|m| text.get(..m.start()))
        .unwrap_or(text)
        .trim_end()
}
