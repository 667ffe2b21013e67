//! AI provider abstraction and implementations
//!
//! This module provides the pluggable backends the recognition service can
//! dispatch to:
//! - Gemini (Google Generative Language API, native inline attachment)
//! - OpenAI (chat completions with a base64 data-URL image part)
//!
//! Every provider sends the same [`RECOGNITION_PROMPT`] and hands the model's
//! text output to [`detections_from_payload`], which runs the shared
//! parse-then-map pipeline.

pub mod gemini;
pub mod openai;

// Test utilities for provider testing
#[cfg(test)]
pub mod test_utils;

pub use self::gemini::GeminiProvider;
pub use self::openai::OpenAiProvider;

use crate::error::{RecognitionError, Result};
use crate::parser::{ParserConventions, ResultParser};
use crate::types::{ComponentDetection, DecodedImage};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Recognition instruction shared verbatim by every provider
pub const RECOGNITION_PROMPT: &str = r#"Analyze this UI screenshot and identify the UI components it contains.
Return a JSON array. Each object must contain the following fields:
- "type": component type, one of ["button", "input", "image", "text", "icon", "card", "unknown"]
- "label": the component's text content or a short description
- "confidence": confidence score, a float between 0.0 and 1.0
- "ymin": top edge coordinate (0-1000)
- "xmin": left edge coordinate (0-1000)
- "ymax": bottom edge coordinate (0-1000)
- "xmax": right edge coordinate (0-1000)

Coordinate system: normalized to a 1000x1000 grid.
Return only the JSON array, nothing else."#;

/// Trait for AI recognition backends
///
/// Implementations are stateless apart from credentials and a pooled HTTP
/// client, so one instance is shared across concurrent requests.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Which backend this is
    fn kind(&self) -> ProviderKind;

    /// Upstream model identifier, reported in response metadata
    fn model_id(&self) -> &str;

    /// Whether a credential is present
    fn is_configured(&self) -> bool;

    /// Detect UI components in `image`
    ///
    /// # Errors
    /// - `RecognitionError::Configuration` when no credential is configured;
    ///   no network call is attempted in that case
    /// - `RecognitionError::Upstream` for transport, status or envelope
    ///   failures
    ///
    /// Undecodable model output is not an error: it yields an empty list.
    async fn recognize(&self, image: &DecodedImage) -> Result<Vec<ComponentDetection>>;
}

/// Known provider backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
}

impl ProviderKind {
    /// Canonical lowercase name, also the detection id prefix
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }

    /// Parsing defaults each provider has historically used
    #[must_use]
    pub const fn conventions(&self) -> ParserConventions {
        match self {
            Self::Gemini => gemini::CONVENTIONS,
            Self::OpenAi => openai::CONVENTIONS,
        }
    }
}

impl Default for ProviderKind {
    fn default() -> Self {
        Self::Gemini
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run raw model output through the parser and coordinate mapper
#[must_use]
pub fn detections_from_payload(
    raw: &str,
    conventions: ParserConventions,
    image: &DecodedImage,
) -> Vec<ComponentDetection> {
    ResultParser::new(conventions)
        .parse(raw)
        .into_iter()
        .map(|parsed| parsed.into_component(image.width(), image.height()))
        .collect()
}

/// Build the pooled HTTP client a provider keeps for its lifetime
pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build configured HTTP client, using defaults");
            reqwest::Client::new()
        })
}

/// Check the status of an upstream response and decode its JSON envelope
pub(crate) async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
    kind: ProviderKind,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RecognitionError::upstream(format!(
            "{} API error ({}): {}",
            kind, status, body
        )));
    }

    response.json::<T>().await.map_err(|e| {
        RecognitionError::upstream_with_provider(kind.name(), "decode response envelope", &e.to_string())
    })
}
