//! `OpenAI` speech API

use crate::config::MediaConfig;
use crate::llm::{openai_url, provider_error, retry_after, LlmError};
use crate::runtime::Narrator;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// Longest input the speech endpoint accepts
const MAX_INPUT_CHARS: usize = 4096;

pub struct OpenAINarrator {
    client: Client,
    api_key: String,
    url: String,
    model: String,
    voice: String,
}

impl OpenAINarrator {
    pub fn new(api_key: String, config: &MediaConfig) -> Result<Self, String> {
        Ok(Self {
            client: super::http_client()?,
            api_key,
            url: openai_url(config.gateway.as_deref(), "audio/speech"),
            model: config.speech_model.clone(),
            voice: config.speech_voice.clone(),
        })
    }
}

#[async_trait]
impl Narrator for OpenAINarrator {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, LlmError> {
        if text.trim().is_empty() {
            return Err(LlmError::invalid_request("Nothing to narrate"));
        }
        let input: String = text.chars().take(MAX_INPUT_CHARS).collect();
        let request = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: &input,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(provider_error(status.as_u16(), retry_after, &body));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read audio: {e}")))?;
        if audio.is_empty() {
            return Err(LlmError::empty_content("Speech response was empty"));
        }
        tracing::info!(
            model = %self.model,
            voice = %self.voice,
            bytes = audio.len(),
            "Narration synthesized"
        );
        Ok(audio.to_vec())
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}
