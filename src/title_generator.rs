//! Story title generation using a fast/cheap model
//!
//! Generates a short title from the story parameters and the opening page.

use crate::runtime::TextGenerator;
use crate::story::{PromptSpec, StorySetup};
use std::time::Duration;
use tokio::time::timeout;

const TITLE_PROMPT: &str = "Give this children's story a short title of 2 to 6 words. \
Output only the title, no quotes. Examples:
- A fox who learns to share berries -> The Sharing Fox
- A girl who finds a door to the sea -> Mia and the Ocean Door

Story:";

const TITLE_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_TITLE_LENGTH: usize = 60;
/// Characters of the opening page quoted in the prompt
const EXCERPT_CHARS: usize = 500;

/// Generate a title for a story from its opening page.
///
/// Returns None if title generation fails (timeout, error, etc.)
/// The caller should fall back to [`fallback_title`] in that case.
pub async fn generate_title(
    setup: &StorySetup,
    opening: &str,
    generator: &dyn TextGenerator,
) -> Option<String> {
    // Truncate very long pages for the prompt
    let excerpt: String = opening.chars().take(EXCERPT_CHARS).collect();

    let spec = PromptSpec {
        system: "You name children's books.".to_string(),
        user: format!(
            "{TITLE_PROMPT}\nMain character: {}. Theme: {}.\n{excerpt}",
            setup.character_name, setup.theme
        ),
        context: None,
        creativity: 0.3,
        max_tokens: 30,
    };

    match timeout(TITLE_TIMEOUT, generator.generate(&spec)).await {
        Ok(Ok(text)) => sanitize_title(&text),
        Ok(Err(e)) => {
            tracing::warn!(
                model = %generator.model_id(),
                error = %e.message,
                "Title generation failed"
            );
            None
        }
        Err(_) => {
            tracing::warn!(model = %generator.model_id(), "Title generation timed out");
            None
        }
    }
}

/// Title used when no model could name the story
pub fn fallback_title(setup: &StorySetup) -> String {
    let mut theme = setup.theme.chars();
    let theme = match theme.next() {
        Some(first) => first.to_uppercase().chain(theme).collect::<String>(),
        None => String::new(),
    };
    format!("{}'s {theme} Story", setup.character_name)
}

/// Clean up model output: first line only, no wrapping quotes or
/// markdown, bounded length
fn sanitize_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .trim_start_matches(|c: char| c == '#' || c.is_whitespace())
        .trim_start_matches("Title:")
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '*' || c.is_whitespace())
        .trim_end_matches(['.', '!']);

    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }

    // Truncate at a word boundary
    let mut title = String::new();
    for word in words {
        let extra = if title.is_empty() { 0 } else { 1 };
        if title.chars().count() + extra + word.chars().count() > MAX_TITLE_LENGTH {
            break;
        }
        if extra == 1 {
            title.push(' ');
        }
        title.push_str(word);
    }
    if title.is_empty() {
        title = line.chars().take(MAX_TITLE_LENGTH).collect();
    }
    Some(title)
}

/// Lowercase kebab-case form for file names
pub fn title_slug(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();

    let kebab = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();

    if kebab.is_empty() {
        "story".to_string()
    } else {
        kebab
    }
}
