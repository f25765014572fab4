//! Prompt construction for openings, continuations and illustrations

use super::choices::narrative_part;
use super::params::StorySetup;
use crate::llm::{LlmMessage, LlmRequest, MessageRole, SystemContent};
use crate::state_machine::{Directive, StoryOption};

const OPENING_WORDS: u32 = 300;
const CONTINUATION_WORDS: u32 = 150;
/// Characters of page text quoted in an illustration prompt
const SCENE_EXCERPT_CHARS: usize = 280;

/// A complete instruction for the text generator
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub system: String,
    pub user: String,
    /// Story so far, sent as the writer's own previous turn
    pub context: Option<String>,
    /// Sampling creativity in [0.0, 1.0]
    pub creativity: f32,
    pub max_tokens: u32,
}

impl PromptSpec {
    pub fn to_request(&self) -> LlmRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(context) = &self.context {
            messages.push(LlmMessage {
                role: MessageRole::Assistant,
                content: context.clone(),
            });
        }
        messages.push(LlmMessage::user(self.user.clone()));

        LlmRequest {
            system: vec![SystemContent::new(self.system.clone())],
            messages,
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.creativity),
        }
    }
}

fn system_prompt(setup: &StorySetup) -> String {
    format!(
        "You are a warm, imaginative children's author writing for children aged {}. \
         Stories are always safe, kind and free of violence or fear. {}",
        setup.age_group.label(),
        setup.age_group.vocabulary_guidance()
    )
}

fn character_details(setup: &StorySetup) -> String {
    let details: Vec<String> = [
        ("gender", &setup.gender),
        ("cultural background", &setup.culture),
        ("personality", &setup.personality),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.as_ref().map(|v| format!("{label}: {v}")))
    .collect();

    if details.is_empty() {
        String::new()
    } else {
        format!(" ({})", details.join("; "))
    }
}

fn directive_instruction(directive: Directive) -> &'static str {
    match directive {
        Directive::OfferChoices => {
            "End at an exciting decision point. Then include two clearly labeled sections, \
             \"Choice 1:\" and \"Choice 2:\", each one short sentence describing what the \
             character could do next."
        }
        Directive::Conclude => {
            "Bring the story to a complete, happy ending. Do not offer any choices or \
             labeled options."
        }
    }
}

/// First page of a story
pub fn opening_prompt(setup: &StorySetup, directive: Directive) -> PromptSpec {
    let user = format!(
        "Write exactly {OPENING_WORDS} words of an interactive story for children aged {age} \
         about {theme}. The main character is {name}{details}. {structure} \
         Use simple vocabulary suitable for the age group. Keep sentences short. {ending} \
         Do not exceed {OPENING_WORDS} words.",
        age = setup.age_group.label(),
        theme = setup.theme,
        name = setup.character_name,
        details = character_details(setup),
        structure = setup.template.structure_instruction(),
        ending = directive_instruction(directive),
    );

    PromptSpec {
        system: system_prompt(setup),
        user,
        context: None,
        creativity: setup.creativity,
        max_tokens: 900,
    }
}

/// Next page, following `option` from the page the reader is on
pub fn continuation_prompt(
    setup: &StorySetup,
    source_text: &str,
    option: StoryOption,
    directive: Directive,
) -> PromptSpec {
    let user = format!(
        "Continue the story above in {CONTINUATION_WORDS} words. \
         Base the continuation on {label}. Keep {name} as the main character and keep \
         vocabulary simple. {ending}",
        label = option.label(),
        name = setup.character_name,
        ending = directive_instruction(directive),
    );

    PromptSpec {
        system: system_prompt(setup),
        user,
        context: Some(source_text.to_string()),
        creativity: setup.creativity,
        max_tokens: 600,
    }
}

/// Scene description for the illustrator
pub fn illustration_prompt(setup: &StorySetup, page_text: &str) -> String {
    let prose = narrative_part(page_text);
    let excerpt: String = prose.chars().take(SCENE_EXCERPT_CHARS).collect();
    let ellipsis = if prose.chars().count() > SCENE_EXCERPT_CHARS {
        "..."
    } else {
        ""
    };
    format!(
        "Children's book illustration of {name}{details} in a story about {theme}, \
         soft detailed storybook style. Scene: {excerpt}{ellipsis}",
        name = setup.character_name,
        details = character_details(setup),
        theme = setup.theme,
    )
}
