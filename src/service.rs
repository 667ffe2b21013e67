//! Recognition orchestration
//!
//! [`RecognitionService`] receives a decoded image, invokes the injected
//! provider once and classifies the result into a [`RecognitionOutcome`].
//! There are no retries and no state shared between calls beyond the
//! provider itself.

use crate::config::ServiceConfig;
use crate::error::RecognitionError;
use crate::factory::ProviderFactory;
use crate::providers::{AiProvider, ProviderKind};
use crate::tracing_config::{events, spans};
use crate::types::{ComponentDetection, DecodedImage};
use instant::Instant;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

/// Result of one recognition call
pub type RecognitionOutcome = Result<RecognitionReport, RecognitionFailure>;

/// Successful recognition, possibly with zero components
#[derive(Debug, Clone)]
pub struct RecognitionReport {
    /// Detected components in provider order
    pub components: Vec<ComponentDetection>,
    /// Wall-clock duration of the provider call
    pub processing_time: Duration,
    /// Provider that served the call
    pub provider: ProviderKind,
    /// Model identifier reported by the provider
    pub model_version: String,
}

impl RecognitionReport {
    #[must_use]
    pub fn processing_time_ms(&self) -> u64 {
        u64::try_from(self.processing_time.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Failure kinds that cross the recognition boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionFailure {
    /// The provider has no credential
    NotConfigured { message: String },
    /// Transport, status, quota or other upstream failure
    Upstream { message: String },
}

/// Discriminant of [`RecognitionFailure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotConfigured,
    Upstream,
}

impl RecognitionFailure {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotConfigured { .. } => FailureKind::NotConfigured,
            Self::Upstream { .. } => FailureKind::Upstream,
        }
    }

    /// Machine-readable code, shared with [`RecognitionError::code`]
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured { .. } => "ai_not_configured",
            Self::Upstream { .. } => "ai_service_error",
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::NotConfigured { message } | Self::Upstream { message } => message,
        }
    }
}

impl fmt::Display for RecognitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for RecognitionFailure {}

impl From<RecognitionError> for RecognitionFailure {
    fn from(err: RecognitionError) -> Self {
        match err {
            RecognitionError::Configuration(message) => Self::NotConfigured { message },
            other => Self::Upstream {
                message: other.to_string(),
            },
        }
    }
}

/// Orchestrates a single recognition call against an injected provider
#[derive(Clone)]
pub struct RecognitionService {
    provider: Arc<dyn AiProvider>,
}

impl fmt::Debug for RecognitionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionService")
            .field("provider", &self.provider.kind())
            .field("model", &self.provider.model_id())
            .finish()
    }
}

impl RecognitionService {
    /// Create a service around an already constructed provider
    #[must_use]
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    /// Create a service using `factory` to build the configured provider
    #[must_use]
    pub fn from_config(config: &ServiceConfig, factory: &dyn ProviderFactory) -> Self {
        Self::new(factory.create_provider(config))
    }

    /// The provider this service dispatches to
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn AiProvider> {
        &self.provider
    }

    /// Run recognition on `image`
    ///
    /// An empty component list, including the one produced when the model
    /// output cannot be decoded, is a success.
    pub async fn run(&self, image: &DecodedImage) -> RecognitionOutcome {
        let span = spans::recognition(self.provider.kind().name(), image.width(), image.height());
        let start = Instant::now();
        let result = self.provider.recognize(image).instrument(span.clone()).await;
        let processing_time = start.elapsed();
        span.in_scope(|| {
            events::performance_metric("provider call", processing_time.as_millis() as u64);
        });

        match result {
            Ok(components) => {
                info!(
                    components = components.len(),
                    duration_ms = processing_time.as_millis() as u64,
                    "Recognition finished"
                );
                Ok(RecognitionReport {
                    components,
                    processing_time,
                    provider: self.provider.kind(),
                    model_version: self.provider.model_id().to_string(),
                })
            },
            Err(err) => {
                let failure = RecognitionFailure::from(err);
                match failure.kind() {
                    FailureKind::NotConfigured => {
                        warn!(reason = failure.message(), "AI service is not configured");
                    },
                    FailureKind::Upstream => {
                        error!(reason = failure.message(), "AI service call failed");
                    },
                }
                Err(failure)
            },
        }
    }
}
