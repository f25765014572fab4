//! Reader-supplied story parameters and their validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest accepted free-text field, in characters
pub const MAX_FIELD_CHARS: usize = 120;

/// Target reader age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "4-6")]
    FourToSix,
    #[serde(rename = "7-9")]
    SevenToNine,
    #[serde(rename = "10-12")]
    TenToTwelve,
}

impl AgeGroup {
    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::FourToSix => "4-6",
            AgeGroup::SevenToNine => "7-9",
            AgeGroup::TenToTwelve => "10-12",
        }
    }

    /// Vocabulary and sentence guidance for the writer
    pub fn vocabulary_guidance(self) -> &'static str {
        match self {
            AgeGroup::FourToSix => {
                "Use very simple words a preschooler knows. Keep sentences to about eight words. \
                 Repetition and gentle sounds are welcome."
            }
            AgeGroup::SevenToNine => {
                "Use simple vocabulary an early reader can sound out. Keep sentences short \
                 and clear."
            }
            AgeGroup::TenToTwelve => {
                "Use rich but accessible vocabulary. Sentences may vary in length, but keep \
                 paragraphs short."
            }
        }
    }
}

/// Overall story shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeTemplate {
    #[default]
    Classic,
    HerosJourney,
    Fable,
    Mystery,
    Friendship,
}

impl NarrativeTemplate {
    pub fn structure_instruction(self) -> &'static str {
        match self {
            NarrativeTemplate::Classic => {
                "Tell a classic tale with a clear beginning, a small problem and a warm tone."
            }
            NarrativeTemplate::HerosJourney => {
                "Follow a hero's journey: the character leaves home, meets a helper and faces a \
                 challenge."
            }
            NarrativeTemplate::Fable => {
                "Write it as a fable with talking animals and a gentle lesson."
            }
            NarrativeTemplate::Mystery => {
                "Build a gentle mystery with clues the reader can follow. Nothing scary."
            }
            NarrativeTemplate::Friendship => {
                "Centre the story on making or keeping a friend and on kindness."
            }
        }
    }
}

/// Story parameters as submitted by the reader
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryParameters {
    pub age_group: Option<AgeGroup>,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub character_name: String,
    pub gender: Option<String>,
    pub culture: Option<String>,
    pub personality: Option<String>,
    pub template: Option<NarrativeTemplate>,
    pub creativity: Option<f32>,
}

/// Validated, trimmed parameters a session is started with
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorySetup {
    pub age_group: AgeGroup,
    pub theme: String,
    pub character_name: String,
    pub gender: Option<String>,
    pub culture: Option<String>,
    pub personality: Option<String>,
    pub template: NarrativeTemplate,
    pub creativity: f32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("An age group is required")]
    MissingAgeGroup,
    #[error("A theme is required")]
    MissingTheme,
    #[error("A character name is required")]
    MissingCharacterName,
    #[error("Creativity must be between 0.0 and 1.0, got {0}")]
    CreativityOutOfRange(f32),
    #[error("{field} must be at most {max} characters")]
    FieldTooLong { field: &'static str, max: usize },
}

impl StoryParameters {
    /// Trim, check and fill defaults; blank optional fields become `None`
    pub fn validate(self, default_creativity: f32) -> Result<StorySetup, ValidationError> {
        let age_group = self.age_group.ok_or(ValidationError::MissingAgeGroup)?;

        let theme = required(&self.theme, "theme", ValidationError::MissingTheme)?;
        let character_name = required(
            &self.character_name,
            "character_name",
            ValidationError::MissingCharacterName,
        )?;

        let creativity = self.creativity.unwrap_or(default_creativity);
        if !(0.0..=1.0).contains(&creativity) {
            return Err(ValidationError::CreativityOutOfRange(creativity));
        }

        Ok(StorySetup {
            age_group,
            theme,
            character_name,
            gender: optional(self.gender.as_deref(), "gender")?,
            culture: optional(self.culture.as_deref(), "culture")?,
            personality: optional(self.personality.as_deref(), "personality")?,
            template: self.template.unwrap_or_default(),
            creativity,
        })
    }
}

fn required(
    value: &str,
    field: &'static str,
    missing: ValidationError,
) -> Result<String, ValidationError> {
    optional(Some(value), field)?.ok_or(missing)
}

fn optional(value: Option<&str>, field: &'static str) -> Result<Option<String>, ValidationError> {
    let Some(trimmed) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > MAX_FIELD_CHARS {
        return Err(ValidationError::FieldTooLong {
            field,
            max: MAX_FIELD_CHARS,
        });
    }
    Ok(Some(trimmed.to_string()))
}
