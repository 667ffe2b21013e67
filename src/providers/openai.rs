//! `OpenAI` provider using the chat completions API
//!
//! The screenshot is sent as a base64 `data:` URL inside a multi-part user
//! message and the request uses `response_format: json_object`. JSON mode
//! forces an object at the top level, so the model may answer either with a
//! bare array or with an object holding the array; the shared parser
//! normalizes both.

use super::{build_http_client, read_envelope, AiProvider, ProviderKind, RECOGNITION_PROMPT};
use crate::config::ProviderCredentials;
use crate::error::{RecognitionError, Result};
use crate::parser::ParserConventions;
use crate::types::{ComponentDetection, DecodedImage};
use async_trait::async_trait;
use base64::Engine;
use instant::Instant;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// OpenAI's historical defaults: empty label, confidence 1.0
pub const CONVENTIONS: ParserConventions = ParserConventions::new("openai", "", 1.0);

const MAX_TOKENS: u32 = 4096;

/// `OpenAI` chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

/// Content part for multimodal messages
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

/// `OpenAI` chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RecognitionError::upstream("openai returned no choices"))?;

        if let Some(refusal) = choice.message.refusal {
            return Err(RecognitionError::upstream(format!(
                "openai refused the request: {}",
                refusal
            )));
        }
        Ok(choice.message.content.unwrap_or_default())
    }
}

/// `OpenAI` vision provider
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    credentials: ProviderCredentials,
}

impl OpenAiProvider {
    /// Create a new `OpenAI` provider
    ///
    /// Never fails. A missing API key is reported as a warning here and as a
    /// configuration error on the first [`AiProvider::recognize`] call.
    #[must_use]
    pub fn new(credentials: ProviderCredentials, timeout: Duration) -> Self {
        if !credentials.is_configured() {
            warn!("OPENAI_API_KEY is not set; recognition requests will fail until it is configured");
        }
        Self {
            client: build_http_client(timeout),
            credentials,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.credentials.base_url)
    }

    fn build_request<'a>(&'a self, image: &DecodedImage, prompt: &'a str) -> ChatRequest<'a> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image.data());
        ChatRequest {
            model: &self.credentials.model,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:{};base64,{}", image.mime_type(), encoded),
                            detail: "high",
                        },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        }
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model_id(&self) -> &str {
        &self.credentials.model
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_configured()
    }

    #[instrument(
        skip(self, image),
        fields(
            provider = "openai",
            model = %self.credentials.model,
            dimensions = %format!("{}x{}", image.width(), image.height())
        )
    )]
    async fn recognize(&self, image: &DecodedImage) -> Result<Vec<ComponentDetection>> {
        let Some(api_key) = self.credentials.api_key.as_deref() else {
            return Err(RecognitionError::configuration(
                "OPENAI_API_KEY is not configured, cannot call the AI service",
            ));
        };

        info!(size_bytes = image.size_bytes(), "Starting OpenAI recognition");
        let start = Instant::now();

        let request = self.build_request(image, RECOGNITION_PROMPT);
        let outcome = async {
            let response = self
                .client
                .post(self.endpoint())
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await?;
            read_envelope::<ChatResponse>(response, ProviderKind::OpenAi)
                .await?
                .into_text()
        }
        .await;

        let text = match outcome {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "OpenAI API call failed");
                return Err(e);
            },
        };

        let components = super::detections_from_payload(&text, CONVENTIONS, image);
        info!(
            components = components.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "OpenAI recognition completed"
        );
        Ok(components)
    }
}
