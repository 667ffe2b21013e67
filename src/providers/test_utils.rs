//! Test utilities and mock providers for testing recognition functionality
//!
//! `MockProvider` implements [`AiProvider`] without any network access. It
//! replays a canned model payload through the real parse-then-map pipeline,
//! so tests exercise everything except the HTTP exchange.

use super::{detections_from_payload, AiProvider, ProviderKind};
use crate::error::{RecognitionError, Result};
use crate::types::{ComponentDetection, DecodedImage};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Mock provider for testing
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Which provider's parsing conventions to apply
    kind: ProviderKind,
    /// Raw text the "model" answers with
    payload: String,
    /// Whether a credential is simulated
    configured: bool,
    /// Upstream failure message to return instead of a payload
    upstream_failure: Option<String>,
    /// Call history for verification in tests
    call_history: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a configured mock answering with `payload`
    #[must_use]
    pub fn new<S: Into<String>>(kind: ProviderKind, payload: S) -> Self {
        Self {
            kind,
            payload: payload.into(),
            configured: true,
            upstream_failure: None,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock without a credential
    #[must_use]
    pub fn new_unconfigured(kind: ProviderKind) -> Self {
        let mut provider = Self::new(kind, "[]");
        provider.configured = false;
        provider
    }

    /// Create a mock whose upstream call fails with `message`
    #[must_use]
    pub fn new_failing_upstream<S: Into<String>>(kind: ProviderKind, message: S) -> Self {
        let mut provider = Self::new(kind, "[]");
        provider.upstream_failure = Some(message.into());
        provider
    }

    /// Get the call history for verification in tests
    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    /// Number of simulated outbound calls
    pub fn network_calls(&self) -> usize {
        self.get_call_history()
            .iter()
            .filter(|call| call.as_str() == "network")
            .count()
    }

    fn record_call(&self, method: &str) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(method.to_string());
        }
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn recognize(&self, image: &DecodedImage) -> Result<Vec<ComponentDetection>> {
        self.record_call("recognize");

        if !self.configured {
            return Err(RecognitionError::configuration(format!(
                "{} credential is not configured",
                self.kind
            )));
        }

        self.record_call("network");
        if let Some(message) = &self.upstream_failure {
            return Err(RecognitionError::upstream(message.clone()));
        }

        Ok(detections_from_payload(
            &self.payload,
            self.kind.conventions(),
            image,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn image() -> DecodedImage {
        DecodedImage::new(200, 100, ImageFormat::Png, vec![0u8; 4]).unwrap()
    }

    #[tokio::test]
    async fn test_mock_replays_payload() {
        let mock = MockProvider::new(
            ProviderKind::Gemini,
            r#"[{"type":"icon","xmin":0,"ymin":0,"xmax":1000,"ymax":1000}]"#,
        );
        let components = mock.recognize(&image()).await.unwrap();

        assert_eq!(components.len(), 1);
        assert_eq!(components[0].bbox.width, 200);
        assert_eq!(components[0].bbox.height, 100);
        assert_eq!(mock.get_call_history(), vec!["recognize", "network"]);
    }

    #[tokio::test]
    async fn test_unconfigured_mock_skips_network() {
        let mock = MockProvider::new_unconfigured(ProviderKind::OpenAi);
        let err = mock.recognize(&image()).await.unwrap_err();

        assert!(matches!(err, RecognitionError::Configuration(_)));
        assert_eq!(mock.network_calls(), 0);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockProvider::new_failing_upstream(ProviderKind::Gemini, "quota exceeded");
        let err = mock.recognize(&image()).await.unwrap_err();

        assert!(matches!(err, RecognitionError::Upstream(ref m) if m == "quota exceeded"));
        assert_eq!(mock.network_calls(), 1);
    }
}
