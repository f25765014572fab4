//! Process configuration read from the environment at startup

use crate::llm::LlmConfig;
use crate::state_machine::DEFAULT_MAX_TURNS;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CREATIVITY: f32 = 0.7;
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_IDLE_MINUTES: u64 = 60;
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_SPEECH_MODEL: &str = "gpt-4o-mini-tts";
pub const DEFAULT_SPEECH_VOICE: &str = "alloy";

/// Session rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoryConfig {
    /// Turns per story, the opening included
    pub max_turns: u32,
    /// Creativity used when the reader does not pick one
    pub default_creativity: f32,
    /// Stories untouched for this long are dropped
    pub idle_timeout: Duration,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            default_creativity: DEFAULT_CREATIVITY,
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_MINUTES * 60),
        }
    }
}

/// Illustration and narration collaborators
#[derive(Debug, Clone, PartialEq)]
pub struct MediaConfig {
    pub api_key: Option<String>,
    pub gateway: Option<String>,
    pub image_model: String,
    pub image_size: String,
    pub speech_model: String,
    pub speech_voice: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            gateway: None,
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            speech_voice: DEFAULT_SPEECH_VOICE.to_string(),
        }
    }
}

impl MediaConfig {
    /// Key to send, `"implicit"` in gateway mode, `None` when media is off
    pub fn credentials(&self) -> Option<String> {
        if self.gateway.is_some() {
            return Some("implicit".to_string());
        }
        self.api_key.clone().filter(|k| !k.is_empty())
    }
}

/// Document export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportConfig {
    /// Fallback fonts for characters the built-in font lacks
    pub font_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
}

/// Everything the process reads from its environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub story: StoryConfig,
    pub media: MediaConfig,
    pub export: ExportConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let llm = LlmConfig::from_lookup(&lookup);

        let max_turns = parse_or(&lookup, "STORY_MAX_TURNS", DEFAULT_MAX_TURNS).max(1);
        let mut default_creativity = parse_or(&lookup, "STORY_CREATIVITY", DEFAULT_CREATIVITY);
        if !(0.0..=1.0).contains(&default_creativity) {
            tracing::warn!(
                value = default_creativity,
                "STORY_CREATIVITY outside 0.0..=1.0, using default"
            );
            default_creativity = DEFAULT_CREATIVITY;
        }
        let idle_minutes = parse_or(&lookup, "STORY_IDLE_MINUTES", DEFAULT_IDLE_MINUTES).max(1);

        let defaults = MediaConfig::default();
        let media = MediaConfig {
            api_key: llm.openai_api_key.clone(),
            gateway: llm.gateway.clone(),
            image_model: lookup("IMAGE_MODEL").unwrap_or(defaults.image_model),
            image_size: lookup("IMAGE_SIZE").unwrap_or(defaults.image_size),
            speech_model: lookup("SPEECH_MODEL").unwrap_or(defaults.speech_model),
            speech_voice: lookup("SPEECH_VOICE").unwrap_or(defaults.speech_voice),
        };

        Self {
            llm,
            story: StoryConfig {
                max_turns,
                default_creativity,
                idle_timeout: Duration::from_secs(idle_minutes * 60),
            },
            media,
            export: ExportConfig {
                font_paths: lookup("EXPORT_FONTS")
                    .map(|raw| {
                        raw.split(',')
                            .map(str::trim)
                            .filter(|p| !p.is_empty())
                            .map(PathBuf::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            server: ServerConfig {
                port: parse_or(&lookup, "ENCHANTED_READER_PORT", DEFAULT_PORT),
            },
        }
    }
}

fn parse_or<T: FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
            default
        }),
        None => default,
    }
}
