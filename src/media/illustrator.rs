//! `OpenAI` images API

use crate::config::MediaConfig;
use crate::llm::{openai_url, provider_error, retry_after, LlmError};
use crate::runtime::{Illustration, Illustrator};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct OpenAIIllustrator {
    client: Client,
    api_key: String,
    url: String,
    model: String,
    size: String,
}

impl OpenAIIllustrator {
    pub fn new(api_key: String, config: &MediaConfig) -> Result<Self, String> {
        Ok(Self {
            client: super::http_client()?,
            api_key,
            url: openai_url(config.gateway.as_deref(), "images/generations"),
            model: config.image_model.clone(),
            size: config.image_size.clone(),
        })
    }

    fn decode(response: ImageResponse) -> Result<Illustration, LlmError> {
        let image = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::empty_content("Image response contained no images"))?;

        if let Some(b64) = image.b64_json {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(b64.as_bytes())
                .map_err(|e| LlmError::unknown(format!("Invalid image data: {e}")))?;
            return Ok(Illustration::Png(bytes));
        }
        image
            .url
            .map(Illustration::Url)
            .ok_or_else(|| LlmError::empty_content("Image response had neither data nor URL"))
    }
}

#[async_trait]
impl Illustrator for OpenAIIllustrator {
    async fn render(&self, scene: &str) -> Result<Illustration, LlmError> {
        let request = ImageRequest {
            model: &self.model,
            prompt: scene,
            size: &self.size,
            n: 1,
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
        let retry_after = retry_after(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(provider_error(status.as_u16(), retry_after, &body));
        }

        let parsed: ImageResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::unknown(format!("Failed to parse image response: {e}")))?;
        let illustration = Self::decode(parsed)?;
        tracing::info!(model = %self.model, "Illustration rendered");
        Ok(illustration)
    }
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
    url: Option<String>,
}
