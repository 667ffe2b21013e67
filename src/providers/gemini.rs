//! Gemini provider using the Generative Language `generateContent` API
//!
//! The screenshot travels as a native `inlineData` part next to the shared
//! prompt, and the request asks for an `application/json` response.

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

/// Gemini's historical defaults: label "unknown element", confidence 0.0
pub const CONVENTIONS: ParserConventions = ParserConventions::new("gemini", "unknown element", 0.0);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn into_text(self) -> Result<String> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(RecognitionError::upstream(format!(
                "gemini returned no content: {}",
                reason
            )));
        };

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        if parts.is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "empty candidate".to_string());
            return Err(RecognitionError::upstream(format!(
                "gemini returned no content: {}",
                reason
            )));
        }

        Ok(parts.into_iter().filter_map(|part| part.text).collect())
    }
}

/// Gemini vision provider
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    credentials: ProviderCredentials,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// Never fails. A missing API key is reported as a warning here and as a
    /// configuration error on the first [`AiProvider::recognize`] call.
    #[must_use]
    pub fn new(credentials: ProviderCredentials, timeout: Duration) -> Self {
        if !credentials.is_configured() {
            warn!("GEMINI_API_KEY is not set; recognition requests will fail until it is configured");
        }
        Self {
            client: build_http_client(timeout),
            credentials,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.credentials.base_url, self.credentials.model
        )
    }

    fn build_request<'a>(image: &DecodedImage, prompt: &'a str) -> GenerateRequest<'a> {
        let data = base64::engine::general_purpose::STANDARD.encode(image.data());
        GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: prompt },
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: image.mime_type().to_string(),
                            data,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        }
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
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
            provider = "gemini",
            model = %self.credentials.model,
            dimensions = %format!("{}x{}", image.width(), image.height())
        )
    )]
    async fn recognize(&self, image: &DecodedImage) -> Result<Vec<ComponentDetection>> {
        let Some(api_key) = self.credentials.api_key.as_deref() else {
            return Err(RecognitionError::configuration(
                "GEMINI_API_KEY is not configured, cannot call the AI service",
            ));
        };

        info!(size_bytes = image.size_bytes(), "Starting Gemini recognition");
        let start = Instant::now();

        let request = Self::build_request(image, RECOGNITION_PROMPT);
        let outcome = async {
            let response = self
                .client
                .post(self.endpoint())
                .header("x-goog-api-key", api_key)
                .json(&request)
                .send()
                .await?;
            read_envelope::<GenerateResponse>(response, ProviderKind::Gemini)
                .await?
                .into_text()
        }
        .await;

        let text = match outcome {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Gemini API call failed");
                return Err(e);
            },
        };

        let components = super::detections_from_payload(&text, CONVENTIONS, image);
        info!(
            components = components.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Gemini recognition completed"
        );
        Ok(components)
    }
}
